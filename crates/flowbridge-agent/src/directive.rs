// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control directives embedded in flow engine text replies.
//!
//! A directive is a text reply starting with `#` followed by a JSON object:
//!
//! ```text
//! #{"queueId": 4, "userId": 12}
//! #{"stopBot": true}
//! ```
//!
//! `queueId` hands the conversation to a helpdesk queue (and optionally an
//! agent) and takes precedence over `stopBot`. `stopBot` alone ends
//! automation. Any other shape is malformed and is delivered as plain text.

use flowbridge_core::types::{QueueId, UserId};
use serde::Deserialize;

/// Prefix marking a directive.
pub const DIRECTIVE_PREFIX: char = '#';

/// A classified directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlDirective {
    /// Hand the conversation to a queue, optionally assigning an agent.
    ReleaseToHuman {
        queue_id: QueueId,
        user_id: Option<UserId>,
    },
    /// End automation without reassigning the conversation.
    StopAutomation,
    /// Looked like a directive but could not be used.
    Malformed { reason: String },
}

impl ControlDirective {
    /// Directives that end the current reply batch.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ControlDirective::Malformed { .. })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectivePayload {
    #[serde(default)]
    stop_bot: Option<bool>,
    #[serde(default)]
    queue_id: Option<RawId>,
    #[serde(default)]
    user_id: Option<RawId>,
}

/// Ids arrive as JSON numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_id(self) -> Option<String> {
        match self {
            RawId::Number(n) => Some(n.to_string()),
            RawId::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// Classifies `text`. Returns `None` when it is not a directive at all.
pub fn interpret(text: &str) -> Option<ControlDirective> {
    let json = text.strip_prefix(DIRECTIVE_PREFIX)?;

    let payload: DirectivePayload = match serde_json::from_str(json) {
        Ok(payload) => payload,
        Err(e) => {
            return Some(ControlDirective::Malformed {
                reason: format!("invalid directive JSON: {e}"),
            });
        }
    };

    let queue_id = payload.queue_id.and_then(RawId::into_id);
    let user_id = payload.user_id.and_then(RawId::into_id);

    let directive = match (queue_id, user_id, payload.stop_bot) {
        (Some(queue), user, _) => ControlDirective::ReleaseToHuman {
            queue_id: QueueId(queue),
            user_id: user.map(UserId),
        },
        (None, None, Some(true)) => ControlDirective::StopAutomation,
        (None, Some(_), _) => ControlDirective::Malformed {
            reason: "userId without queueId".into(),
        },
        (None, None, _) => ControlDirective::Malformed {
            reason: "directive has neither queueId nor stopBot".into(),
        },
    };
    Some(directive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(queue: &str, user: Option<&str>) -> ControlDirective {
        ControlDirective::ReleaseToHuman {
            queue_id: QueueId(queue.into()),
            user_id: user.map(|u| UserId(u.into())),
        }
    }

    #[test]
    fn plain_text_is_not_a_directive() {
        assert_eq!(interpret("hello"), None);
        assert_eq!(interpret(" #{\"stopBot\":true}"), None);
        assert_eq!(interpret(""), None);
    }

    #[test]
    fn queue_only_releases_to_queue() {
        assert_eq!(interpret(r#"#{"queueId": 4}"#), Some(release("4", None)));
        assert_eq!(interpret(r#"#{"queueId": "7"}"#), Some(release("7", None)));
    }

    #[test]
    fn queue_and_user_assigns_agent() {
        assert_eq!(
            interpret(r#"#{"queueId": 4, "userId": 12}"#),
            Some(release("4", Some("12")))
        );
    }

    #[test]
    fn queue_wins_over_stop() {
        assert_eq!(
            interpret(r#"#{"stopBot": true, "queueId": 2}"#),
            Some(release("2", None))
        );
    }

    #[test]
    fn stop_alone_stops_automation() {
        assert_eq!(
            interpret(r#"#{"stopBot": true}"#),
            Some(ControlDirective::StopAutomation)
        );
        assert_eq!(
            interpret(r#"#{"stopBot": true, "queueId": null}"#),
            Some(ControlDirective::StopAutomation)
        );
    }

    #[test]
    fn user_without_queue_is_malformed() {
        assert!(matches!(
            interpret(r#"#{"stopBot": true, "userId": 3}"#),
            Some(ControlDirective::Malformed { .. })
        ));
    }

    #[test]
    fn unrecognised_shapes_are_malformed() {
        for text in ["#not json", "#{\"stopBot\": false}", "#{}", "#[1,2]", "#1 in sales"] {
            let directive = interpret(text).expect("starts with #");
            assert!(!directive.is_terminal(), "{text} should be malformed");
        }
    }

    #[test]
    fn blank_string_ids_count_as_absent() {
        assert_eq!(
            interpret(r#"#{"stopBot": true, "queueId": "  "}"#),
            Some(ControlDirective::StopAutomation)
        );
    }
}
