// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Restart and finish keywords.

use flowbridge_config::IntegrationConfig;

/// Side effect requested by an inbound body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordAction {
    /// Drop the session and hand the conversation back to the bot.
    Restart,
    /// Close the conversation.
    Finish,
}

/// Keywords matched by `body`, restart first. Empty keywords never match.
pub fn match_keywords(body: &str, integration: &IntegrationConfig) -> Vec<KeywordAction> {
    [
        (integration.keyword_restart.as_str(), KeywordAction::Restart),
        (integration.keyword_finish.as_str(), KeywordAction::Finish),
    ]
    .into_iter()
    .filter(|(keyword, _)| !keyword.is_empty() && *keyword == body)
    .map(|(_, action)| action)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integration(restart: &str, finish: &str) -> IntegrationConfig {
        let mut config = IntegrationConfig::new("support", "http://localhost", "flow");
        config.keyword_restart = restart.into();
        config.keyword_finish = finish.into();
        config
    }

    #[test]
    fn exact_match_only() {
        let config = integration("#reset", "#end");
        assert_eq!(match_keywords("#reset", &config), vec![KeywordAction::Restart]);
        assert_eq!(match_keywords("#end", &config), vec![KeywordAction::Finish]);
        assert!(match_keywords("#RESET", &config).is_empty());
        assert!(match_keywords("#reset now", &config).is_empty());
    }

    #[test]
    fn empty_keywords_never_match() {
        let config = integration("", "");
        assert!(match_keywords("", &config).is_empty());
    }

    #[test]
    fn equal_keywords_fire_both_in_order() {
        let config = integration("bye", "bye");
        assert_eq!(
            match_keywords("bye", &config),
            vec![KeywordAction::Restart, KeywordAction::Finish]
        );
    }
}
