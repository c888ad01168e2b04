// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of flow engine reply units into transport messages.
//!
//! Everything here is pure: the same unit and integration settings always
//! produce the same [`TransportMessage`].

use flowbridge_config::IntegrationConfig;
use flowbridge_core::types::{
    BotReplyUnit, PromptDescriptor, RichNode, RichText, TransportMessage,
};

/// Text the flow engine emits when it could not match the user's input.
pub const ENGINE_UNKNOWN_REPLY: &str = "Invalid message. Please, try again.";

/// Mimetype of voice notes.
pub const VOICE_NOTE_MIMETYPE: &str = "audio/mp4";

/// Marker prepended to every choice label.
pub const CHOICE_MARKER: &str = "▶️";

/// Formats one reply unit for the transport.
pub fn format_unit(unit: &BotReplyUnit, integration: &IntegrationConfig) -> TransportMessage {
    match unit {
        BotReplyUnit::Text(rich) => {
            let text = render_rich_text(rich);
            if text == ENGINE_UNKNOWN_REPLY {
                TransportMessage::text(integration.unknown_reply_text.clone())
            } else {
                TransportMessage::Text { text }
            }
        }
        BotReplyUnit::Image { url } => TransportMessage::Image { url: url.clone() },
        BotReplyUnit::Audio { url } => TransportMessage::Audio {
            url: url.clone(),
            mimetype: VOICE_NOTE_MIMETYPE.to_string(),
            voice_note: true,
        },
    }
}

/// Renders the prompt as one message, or `None` when there is nothing to show.
pub fn format_prompt(prompt: &PromptDescriptor) -> Option<TransportMessage> {
    match prompt {
        PromptDescriptor::ChoiceList(items) if !items.is_empty() => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("{CHOICE_MARKER} {}", item.label))
                .collect();
            Some(TransportMessage::text(lines.join("\n")))
        }
        _ => None,
    }
}

/// Flattens rich text to transport markup: paragraphs on separate lines,
/// surrounding whitespace trimmed.
pub fn render_rich_text(rich: &RichText) -> String {
    let paragraphs: Vec<String> = rich
        .paragraphs
        .iter()
        .map(|p| p.nodes.iter().map(render_node).collect())
        .collect();
    paragraphs.join("\n").trim().to_string()
}

fn render_node(node: &RichNode) -> String {
    if let Some(url) = &node.url {
        let label = if node.text.is_empty() {
            node.children
                .first()
                .map(|child| child.text.clone())
                .unwrap_or_default()
        } else {
            styled(node)
        };
        return format!("[{label}]({url})");
    }

    if node.text.is_empty() && !node.children.is_empty() {
        return node.children.iter().map(render_node).collect();
    }

    styled(node)
}

/// Bold is applied first and ends up innermost; underline is outermost.
fn styled(node: &RichNode) -> String {
    let mut text = node.text.clone();
    if text.is_empty() {
        return text;
    }
    if node.bold {
        text = format!("*{text}*");
    }
    if node.italic {
        text = format!("_{text}_");
    }
    if node.underline {
        text = format!("~{text}~");
    }
    text
}
