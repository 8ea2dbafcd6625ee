//! Splitting a chat sender into character name and home world.

/// Structured sender data, when the host has it (e.g. a player link in the chat line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub name: String,
    pub group: String,
}

/// Sender of a chat line as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderInfo {
    /// Sender text as displayed, e.g. "Alice Example" or "Alice Example@Gilgamesh".
    pub display: String,
    pub player: Option<PlayerRef>,
}

impl SenderInfo {
    /// Sender with display text only.
    pub fn display(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            player: None,
        }
    }

    pub fn player(display: impl Into<String>, name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            player: Some(PlayerRef {
                name: name.into(),
                group: group.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSender {
    pub name: String,
    pub group: String,
}

/// Extracts name and group from a sender. `home_group` is the local player's world, if known.
pub trait SenderParser: Send + Sync {
    fn parse(&self, sender: &SenderInfo, home_group: Option<&str>) -> ParsedSender;
}

/// Structured player data first; else "name@group"; else the display text on the home group.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSenderParser;

impl SenderParser for DefaultSenderParser {
    fn parse(&self, sender: &SenderInfo, home_group: Option<&str>) -> ParsedSender {
        if let Some(ref p) = sender.player {
            return ParsedSender {
                name: p.name.clone(),
                group: p.group.clone(),
            };
        }
        if let Some((name, group)) = sender.display.split_once('@') {
            return ParsedSender {
                name: name.trim().to_string(),
                group: group.trim().to_string(),
            };
        }
        ParsedSender {
            name: sender.display.clone(),
            group: home_group.unwrap_or_default().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sender: SenderInfo, home: Option<&str>) -> (String, String) {
        let p = DefaultSenderParser.parse(&sender, home);
        (p.name, p.group)
    }

    #[test]
    fn player_payload_wins() {
        let s = SenderInfo::player("Alice ExampleGilgamesh", "Alice Example", "Gilgamesh");
        assert_eq!(
            parse(s, Some("Ultros")),
            ("Alice Example".to_string(), "Gilgamesh".to_string())
        );
    }

    #[test]
    fn splits_on_at() {
        assert_eq!(
            parse(SenderInfo::display("Alice Example@Gilgamesh"), Some("Ultros")),
            ("Alice Example".to_string(), "Gilgamesh".to_string())
        );
    }

    #[test]
    fn splits_on_first_at_only() {
        assert_eq!(
            parse(SenderInfo::display("a@b@c"), None),
            ("a".to_string(), "b@c".to_string())
        );
    }

    #[test]
    fn falls_back_to_home_group() {
        assert_eq!(
            parse(SenderInfo::display("Alice Example"), Some("Ultros")),
            ("Alice Example".to_string(), "Ultros".to_string())
        );
        assert_eq!(
            parse(SenderInfo::display("Alice Example"), None),
            ("Alice Example".to_string(), String::new())
        );
    }
}
