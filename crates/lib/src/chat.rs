//! Chat categories and the message value carried through the delivery queue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel/type classification of a chat line, as the raw id the game client reports.
///
/// Any integer is a valid category; the associated constants name the ids the bridge
/// knows about. Unnamed ids display as their decimal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatCategory(pub u16);

impl ChatCategory {
    pub const NONE: Self = Self(0);
    pub const DEBUG: Self = Self(1);
    pub const URGENT: Self = Self(2);
    pub const NOTICE: Self = Self(3);
    pub const SAY: Self = Self(10);
    pub const SHOUT: Self = Self(11);
    pub const TELL_OUTGOING: Self = Self(12);
    pub const TELL_INCOMING: Self = Self(13);
    pub const PARTY: Self = Self(14);
    pub const ALLIANCE: Self = Self(15);
    pub const LS1: Self = Self(16);
    pub const LS2: Self = Self(17);
    pub const LS3: Self = Self(18);
    pub const LS4: Self = Self(19);
    pub const LS5: Self = Self(20);
    pub const LS6: Self = Self(21);
    pub const LS7: Self = Self(22);
    pub const LS8: Self = Self(23);
    pub const FREE_COMPANY: Self = Self(24);
    pub const NOVICE_NETWORK: Self = Self(27);
    pub const CUSTOM_EMOTE: Self = Self(28);
    pub const STANDARD_EMOTE: Self = Self(29);
    pub const YELL: Self = Self(30);
    pub const CROSS_PARTY: Self = Self(32);
    pub const PVP_TEAM: Self = Self(36);
    pub const CROSS_LINKSHELL1: Self = Self(37);
    pub const ECHO: Self = Self(56);
    pub const SYSTEM_MESSAGE: Self = Self(57);
    pub const SYSTEM_ERROR: Self = Self(58);
    pub const GATHERING_SYSTEM_MESSAGE: Self = Self(59);
    pub const ERROR_MESSAGE: Self = Self(60);
    pub const NPC_DIALOGUE: Self = Self(61);
    pub const NPC_DIALOGUE_ANNOUNCEMENTS: Self = Self(68);
    pub const RETAINER_SALE: Self = Self(71);
    pub const CROSS_LINKSHELL2: Self = Self(101);
    pub const CROSS_LINKSHELL3: Self = Self(102);
    pub const CROSS_LINKSHELL4: Self = Self(103);
    pub const CROSS_LINKSHELL5: Self = Self(104);
    pub const CROSS_LINKSHELL6: Self = Self(105);
    pub const CROSS_LINKSHELL7: Self = Self(106);
    pub const CROSS_LINKSHELL8: Self = Self(107);

    /// Raw id.
    pub fn id(self) -> u16 {
        self.0
    }

    /// Id with the source bits stripped (the low 7 bits), used for allow-list filtering.
    pub fn base_id(self) -> u16 {
        self.0 & 0x7F
    }

    /// Name of a known category, or `None` for ids without one.
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "None",
            1 => "Debug",
            2 => "Urgent",
            3 => "Notice",
            10 => "Say",
            11 => "Shout",
            12 => "TellOutgoing",
            13 => "TellIncoming",
            14 => "Party",
            15 => "Alliance",
            16 => "Ls1",
            17 => "Ls2",
            18 => "Ls3",
            19 => "Ls4",
            20 => "Ls5",
            21 => "Ls6",
            22 => "Ls7",
            23 => "Ls8",
            24 => "FreeCompany",
            27 => "NoviceNetwork",
            28 => "CustomEmote",
            29 => "StandardEmote",
            30 => "Yell",
            32 => "CrossParty",
            36 => "PvPTeam",
            37 => "CrossLinkShell1",
            56 => "Echo",
            57 => "SystemMessage",
            58 => "SystemError",
            59 => "GatheringSystemMessage",
            60 => "ErrorMessage",
            61 => "NPCDialogue",
            68 => "NPCDialogueAnnouncements",
            71 => "RetainerSale",
            101 => "CrossLinkShell2",
            102 => "CrossLinkShell3",
            103 => "CrossLinkShell4",
            104 => "CrossLinkShell5",
            105 => "CrossLinkShell6",
            106 => "CrossLinkShell7",
            107 => "CrossLinkShell8",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u16> for ChatCategory {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// A chat line waiting for delivery. Built by a producer, consumed once by the relay worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    /// Home world of the sender.
    pub group: String,
    pub content: String,
    pub category: ChatCategory,
}

impl ChatMessage {
    pub fn new(
        sender: impl Into<String>,
        group: impl Into<String>,
        content: impl Into<String>,
        category: ChatCategory,
    ) -> Self {
        Self {
            sender: sender.into(),
            group: group.into(),
            content: content.into(),
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_category_displays_name() {
        assert_eq!(ChatCategory::SAY.to_string(), "Say");
        assert_eq!(ChatCategory::NOTICE.to_string(), "Notice");
        assert_eq!(ChatCategory::CROSS_LINKSHELL8.to_string(), "CrossLinkShell8");
    }

    #[test]
    fn unknown_category_displays_number() {
        assert_eq!(ChatCategory(9).to_string(), "9");
        assert_eq!(ChatCategory(u16::MAX).to_string(), "65535");
    }

    #[test]
    fn base_id_strips_source_bits() {
        assert_eq!(ChatCategory(0x0800 | 10).base_id(), 10);
        assert_eq!(ChatCategory::SAY.base_id(), 10);
    }

    #[test]
    fn category_deserializes_from_number() {
        let c: ChatCategory = serde_json::from_str("14").unwrap();
        assert_eq!(c, ChatCategory::PARTY);
    }
}
