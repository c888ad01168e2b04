// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typebot chat API request and response types.
//!
//! These map to the JSON bodies of `startChat` and `continueChat`. Reply
//! messages are decoded leniently: unknown message and input types are
//! kept as raw JSON and filtered out when converting to core types.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/typebots/{slug}/startChat`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChatRequest {
    pub is_stream_enabled: bool,
    pub message: String,
    pub result_id: String,
    pub is_only_registering: bool,
    pub prefilled_variables: PrefilledVariables,
}

/// Contact variables injected into a new session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefilledVariables {
    pub number: String,
    pub push_name: String,
}

/// Body of `POST /api/v1/sessions/{id}/continueChat`.
#[derive(Debug, Clone, Serialize)]
pub struct ContinueChatRequest {
    pub message: String,
}

/// Response of both chat endpoints. `session_id` is only set by `startChat`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub input: Option<ChatInput>,
}

/// One bot message. `content` depends on `type`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Content of a `text` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub rich_text: Vec<RichElement>,
}

/// Content of an `image` or `audio` message.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaContent {
    pub url: String,
}

/// Slate-style rich text element: a block (`p`), an inline (`a`) or a leaf.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichElement {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<RichElement>,
}

/// Input the flow is waiting for.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<ChoiceInputItem>,
}

/// One option of a `choice input`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceInputItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
