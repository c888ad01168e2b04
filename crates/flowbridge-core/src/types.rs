// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the FlowBridge core.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sender address used by the transport for broadcast/status updates.
pub const BROADCAST_SENDER: &str = "status@broadcast";

/// Identifier of one conversation, derived from the channel and the peer address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Builds the id for a peer `address` on `channel`.
    pub fn from_address(channel: &str, address: &str) -> Self {
        Self(format!("{channel}:{address}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque session handle issued by the flow engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowSessionId(pub String);

impl fmt::Display for FlowSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Helpdesk queue identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueId(pub String);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Helpdesk agent (user) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    FlowEngine,
    Storage,
    Ticketing,
}

// --- Conversation state ---

/// Who currently owns a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerAssignment {
    /// The flow engine answers the user.
    Bot,
    /// Waiting in a helpdesk queue.
    Queue(QueueId),
    /// Assigned to a specific agent.
    Agent(UserId),
    /// Nobody; automation stopped or the conversation was closed.
    Unassigned,
}

impl OwnerAssignment {
    /// Storage discriminator for this assignment.
    pub fn kind(&self) -> &'static str {
        match self {
            OwnerAssignment::Bot => "bot",
            OwnerAssignment::Queue(_) => "queue",
            OwnerAssignment::Agent(_) => "agent",
            OwnerAssignment::Unassigned => "unassigned",
        }
    }

    /// Queue or agent id carried by the assignment, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            OwnerAssignment::Queue(q) => Some(&q.0),
            OwnerAssignment::Agent(u) => Some(&u.0),
            OwnerAssignment::Bot | OwnerAssignment::Unassigned => None,
        }
    }

    /// Rebuilds an assignment from its stored `kind` and `reference`.
    ///
    /// Unknown kinds and queue/agent rows without a reference decode as
    /// `Unassigned`.
    pub fn from_parts(kind: &str, reference: Option<String>) -> Self {
        match (kind, reference) {
            ("bot", _) => OwnerAssignment::Bot,
            ("queue", Some(id)) => OwnerAssignment::Queue(QueueId(id)),
            ("agent", Some(id)) => OwnerAssignment::Agent(UserId(id)),
            _ => OwnerAssignment::Unassigned,
        }
    }
}

/// Ticket-level status of a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Open,
    Closed,
}

/// Reference to the helpdesk ticket backing a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRef {
    pub ticket_id: i64,
    pub company_id: i64,
}

/// Persisted bridge state of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    /// Transport address of the peer.
    pub address: String,
    /// Integration (flow) serving the conversation.
    pub integration: String,
    pub session_id: Option<FlowSessionId>,
    pub automation_active: bool,
    pub owner: OwnerAssignment,
    pub status: ConversationStatus,
    pub ticket: Option<TicketRef>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// A conversation seen for the first time: bot-owned, no session yet.
    pub fn new(id: ConversationId, address: String, integration: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            address,
            integration,
            session_id: None,
            automation_active: true,
            owner: OwnerAssignment::Bot,
            status: ConversationStatus::Open,
            ticket: None,
            last_activity_at: now,
            created_at: now,
        }
    }
}

// --- Channel types ---

/// Body of an inbound transport message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain or extended text.
    Text { text: String },
    /// Image, video or document, optionally captioned.
    Media {
        media_type: String,
        #[serde(default)]
        caption: Option<String>,
    },
    /// A tapped quick-reply button.
    ButtonReply { id: String, text: String },
    /// A selected list row.
    ListReply { id: String, title: String },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    /// Plain text the user typed or picked, as forwarded to the flow engine.
    pub fn body(&self) -> String {
        match self {
            MessageContent::Text { text } => text.clone(),
            MessageContent::Media { caption, .. } => caption.clone().unwrap_or_default(),
            MessageContent::ButtonReply { text, .. } => text.clone(),
            MessageContent::ListReply { title, .. } => title.clone(),
        }
    }
}

/// A message received from a channel adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    /// Channel name the message arrived on.
    pub channel: String,
    /// Transport address of the sender.
    pub sender_id: String,
    /// Display name advertised by the sender.
    #[serde(default)]
    pub push_name: Option<String>,
    pub content: MessageContent,
    /// Integration that should answer; `None` picks the only configured one.
    #[serde(default)]
    pub integration: Option<String>,
    #[serde(default)]
    pub ticket: Option<TicketRef>,
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl InboundMessage {
    /// Broadcast/status events never reach the flow engine.
    pub fn is_broadcast(&self) -> bool {
        self.sender_id == BROADCAST_SENDER
    }

    /// Sender address reduced to its digits, as the contact number.
    pub fn contact_number(&self) -> String {
        self.sender_id.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    pub fn conversation_id(&self) -> ConversationId {
        ConversationId::from_address(&self.channel, &self.sender_id)
    }
}

/// Transport-native message payload produced by the reply formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportMessage {
    Text {
        text: String,
    },
    Image {
        url: String,
    },
    /// Audio delivered as a voice note.
    Audio {
        url: String,
        mimetype: String,
        voice_note: bool,
    },
}

impl TransportMessage {
    pub fn text(text: impl Into<String>) -> Self {
        TransportMessage::Text { text: text.into() }
    }

    /// Text payload, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TransportMessage::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A message to be delivered by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    /// Transport address of the recipient.
    pub recipient: String,
    pub content: TransportMessage,
}

/// Typing indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Composing,
    Paused,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_typing: bool,
    pub supports_images: bool,
    pub supports_voice: bool,
    pub max_message_length: Option<usize>,
}

// --- Flow engine types ---

/// An inline rich-text node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichNode {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    /// Hyperlink target.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<RichNode>,
}

impl RichNode {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// One paragraph block of inline nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub nodes: Vec<RichNode>,
}

/// Ordered paragraph blocks of a text reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub paragraphs: Vec<Paragraph>,
}

impl RichText {
    /// A single paragraph holding one unstyled node.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            paragraphs: vec![Paragraph {
                nodes: vec![RichNode::plain(text)],
            }],
        }
    }
}

/// One atomic output item from the flow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReplyUnit {
    Text(RichText),
    Image { url: String },
    Audio { url: String },
}

/// One option of a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    pub label: String,
}

/// Input the flow engine is waiting for after its reply units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PromptDescriptor {
    #[default]
    None,
    ChoiceList(Vec<ChoiceItem>),
}

/// Reply batch of one flow engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowReply {
    pub units: Vec<BotReplyUnit>,
    pub prompt: PromptDescriptor,
}

impl FlowReply {
    /// Neither reply units nor a prompt.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.prompt == PromptDescriptor::None
    }
}

/// Contact details prefilled into a new flow session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub number: String,
    pub push_name: String,
}

/// Result of starting a flow session.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session_id: FlowSessionId,
    /// Reply to the placeholder start message.
    pub reply: FlowReply,
}

// --- Ticketing types ---

/// Partial ticket record sent to the ticketing collaborator.
///
/// `None` fields are left untouched. `integration_id: Some(None)` clears the
/// ticket's integration link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<QueueId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ConversationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<Option<i64>>,
}
