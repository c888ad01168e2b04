// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typebot flow engine adapter for the FlowBridge session bridge.
//!
//! This crate implements [`FlowEngineAdapter`] over the Typebot chat API and
//! converts its Slate-style rich text replies into core [`FlowReply`] values.

pub mod client;
pub mod types;

use async_trait::async_trait;
use flowbridge_config::IntegrationConfig;
use flowbridge_core::error::BridgeError;
use flowbridge_core::traits::{FlowEngineAdapter, PluginAdapter};
use flowbridge_core::types::{
    AdapterType, BotReplyUnit, ChoiceItem, ContactInfo, FlowReply, FlowSessionId, HealthStatus,
    Paragraph, PromptDescriptor, RichNode, RichText, StartedSession,
};
use tracing::{debug, info, warn};

use crate::client::TypebotClient;
use crate::types::{ChatInput, ChatMessage, ChatResponse, MediaContent, RichElement, TextContent};

/// Input type rendered as a choice list.
const CHOICE_INPUT: &str = "choice input";

/// Typebot engine serving one integration.
pub struct TypebotEngine {
    name: String,
    client: TypebotClient,
}

impl TypebotEngine {
    /// Creates the engine for one configured integration.
    pub fn new(integration: &IntegrationConfig) -> Result<Self, BridgeError> {
        let client = TypebotClient::new(
            &integration.base_url,
            &integration.flow_slug,
            integration.request_timeout(),
        )?;

        info!(
            integration = integration.name.as_str(),
            flow_slug = integration.flow_slug.as_str(),
            "typebot engine initialized"
        );

        Ok(Self {
            name: integration.name.clone(),
            client,
        })
    }
}

#[async_trait]
impl PluginAdapter for TypebotEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FlowEngine
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl FlowEngineAdapter for TypebotEngine {
    async fn start_session(&self, contact: &ContactInfo) -> Result<StartedSession, BridgeError> {
        let (session_id, response) = self
            .client
            .start_chat(&contact.number, &contact.push_name)
            .await?;
        debug!(
            integration = self.name.as_str(),
            session_id = session_id.as_str(),
            "typebot session started"
        );

        // The session already exists upstream; an undecodable reply is dropped.
        let reply = to_flow_reply(response).unwrap_or_else(|e| {
            warn!(
                integration = self.name.as_str(),
                session_id = session_id.as_str(),
                error = %e,
                "start reply not decoded, discarding it"
            );
            FlowReply::default()
        });

        Ok(StartedSession {
            session_id: FlowSessionId(session_id),
            reply,
        })
    }

    async fn continue_session(
        &self,
        session_id: &FlowSessionId,
        message: &str,
    ) -> Result<FlowReply, BridgeError> {
        let response = self.client.continue_chat(&session_id.0, message).await?;
        to_flow_reply(response)
    }
}

/// Converts a chat response into reply units and a prompt.
///
/// Unknown message types are skipped. A known type whose content does not
/// decode is a [`BridgeError::MalformedPayload`].
pub fn to_flow_reply(response: ChatResponse) -> Result<FlowReply, BridgeError> {
    let mut units = Vec::with_capacity(response.messages.len());
    for message in response.messages {
        if let Some(unit) = to_reply_unit(message)? {
            units.push(unit);
        }
    }

    Ok(FlowReply {
        units,
        prompt: response.input.map(to_prompt).unwrap_or_default(),
    })
}

fn to_reply_unit(message: ChatMessage) -> Result<Option<BotReplyUnit>, BridgeError> {
    let unit = match message.kind.as_str() {
        "text" => {
            let content: TextContent = decode(&message)?;
            BotReplyUnit::Text(RichText {
                paragraphs: content.rich_text.iter().map(to_paragraph).collect(),
            })
        }
        "image" => BotReplyUnit::Image {
            url: decode::<MediaContent>(&message)?.url,
        },
        "audio" => BotReplyUnit::Audio {
            url: decode::<MediaContent>(&message)?.url,
        },
        other => {
            warn!(
                message_type = other,
                id = ?message.id,
                "skipping unsupported typebot message"
            );
            return Ok(None);
        }
    };
    Ok(Some(unit))
}

fn decode<T: serde::de::DeserializeOwned>(message: &ChatMessage) -> Result<T, BridgeError> {
    serde_json::from_value(message.content.clone()).map_err(|e| BridgeError::MalformedPayload {
        message: format!("invalid {} message content: {e}", message.kind),
    })
}

/// A block element becomes a paragraph of its children; a bare leaf becomes
/// a one-node paragraph.
fn to_paragraph(block: &RichElement) -> Paragraph {
    let nodes = if block.children.is_empty() {
        vec![to_node(block)]
    } else {
        block.children.iter().map(to_node).collect()
    };
    Paragraph { nodes }
}

fn to_node(element: &RichElement) -> RichNode {
    RichNode {
        text: element.text.clone().unwrap_or_default(),
        bold: element.bold,
        italic: element.italic,
        underline: element.underline,
        url: element.url.clone(),
        children: element.children.iter().map(to_node).collect(),
    }
}

fn to_prompt(input: ChatInput) -> PromptDescriptor {
    if input.kind != CHOICE_INPUT {
        debug!(input_type = input.kind.as_str(), "input type has no prompt rendering");
        return PromptDescriptor::None;
    }
    PromptDescriptor::ChoiceList(
        input
            .items
            .into_iter()
            .filter_map(|item| item.content)
            .map(|label| ChoiceItem { label })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response(json: serde_json::Value) -> ChatResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn text_message_becomes_rich_text() {
        let reply = to_flow_reply(response(serde_json::json!({
            "messages": [{
                "id": "m1",
                "type": "text",
                "content": {"richText": [
                    {"type": "p", "children": [
                        {"text": "Hello "},
                        {"text": "there", "bold": true}
                    ]},
                    {"type": "p", "children": [
                        {"type": "a", "url": "https://x.io", "children": [{"text": "docs"}]}
                    ]}
                ]}
            }]
        })))
        .unwrap();

        let BotReplyUnit::Text(rich) = &reply.units[0] else {
            panic!("expected text unit");
        };
        assert_eq!(rich.paragraphs.len(), 2);
        assert_eq!(rich.paragraphs[0].nodes[1].text, "there");
        assert!(rich.paragraphs[0].nodes[1].bold);
        let link = &rich.paragraphs[1].nodes[0];
        assert_eq!(link.url.as_deref(), Some("https://x.io"));
        assert_eq!(link.children[0].text, "docs");
    }

    #[test]
    fn media_messages_keep_order() {
        let reply = to_flow_reply(response(serde_json::json!({
            "messages": [
                {"type": "image", "content": {"url": "https://x/a.png"}},
                {"type": "audio", "content": {"url": "https://x/b.mp4"}}
            ]
        })))
        .unwrap();
        assert_eq!(
            reply.units,
            vec![
                BotReplyUnit::Image {
                    url: "https://x/a.png".into()
                },
                BotReplyUnit::Audio {
                    url: "https://x/b.mp4".into()
                },
            ]
        );
    }

    #[test]
    fn unknown_message_type_is_skipped() {
        let reply = to_flow_reply(response(serde_json::json!({
            "messages": [
                {"type": "embed", "content": {"url": "https://x"}},
                {"type": "image", "content": {"url": "https://x/a.png"}}
            ]
        })))
        .unwrap();
        assert_eq!(reply.units.len(), 1);
    }

    #[test]
    fn known_type_with_bad_content_is_malformed() {
        let err = to_flow_reply(response(serde_json::json!({
            "messages": [{"type": "image", "content": {"src": "nope"}}]
        })))
        .unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPayload { .. }));
    }

    #[test]
    fn choice_input_becomes_choice_list() {
        let reply = to_flow_reply(response(serde_json::json!({
            "messages": [],
            "input": {"type": "choice input", "items": [
                {"id": "a", "content": "Sales"},
                {"id": "b", "content": "Support"}
            ]}
        })))
        .unwrap();
        assert_eq!(
            reply.prompt,
            PromptDescriptor::ChoiceList(vec![
                ChoiceItem {
                    label: "Sales".into()
                },
                ChoiceItem {
                    label: "Support".into()
                },
            ])
        );
    }

    #[test]
    fn other_input_types_yield_no_prompt() {
        let reply = to_flow_reply(response(serde_json::json!({
            "input": {"type": "text input"}
        })))
        .unwrap();
        assert_eq!(reply.prompt, PromptDescriptor::None);
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn engine_starts_and_continues_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/typebots/welcome/startChat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sessionId": "s-9",
                "messages": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sessions/s-9/continueChat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"type": "text", "content": {"richText": [
                    {"type": "p", "children": [{"text": "Hi!"}]}
                ]}}]
            })))
            .mount(&server)
            .await;

        let integration = IntegrationConfig::new("support", &server.uri(), "welcome");
        let engine = TypebotEngine::new(&integration).unwrap();
        assert_eq!(engine.name(), "support");
        assert_eq!(engine.adapter_type(), AdapterType::FlowEngine);

        let started = engine
            .start_session(&ContactInfo {
                number: "5511".into(),
                push_name: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(started.session_id, FlowSessionId("s-9".into()));

        let reply = engine
            .continue_session(&started.session_id, "hello")
            .await
            .unwrap();
        assert_eq!(reply.units, vec![BotReplyUnit::Text(RichText::plain("Hi!"))]);
    }

    #[tokio::test]
    async fn malformed_start_reply_still_starts_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/typebots/welcome/startChat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sessionId": "s-10",
                "messages": [{"type": "image", "content": {"src": "nope"}}]
            })))
            .mount(&server)
            .await;

        let integration = IntegrationConfig::new("support", &server.uri(), "welcome");
        let engine = TypebotEngine::new(&integration).unwrap();

        let started = engine
            .start_session(&ContactInfo {
                number: "5511".into(),
                push_name: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(started.session_id, FlowSessionId("s-10".into()));
        assert!(started.reply.is_empty());
    }
}
