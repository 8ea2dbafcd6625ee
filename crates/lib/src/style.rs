//! Visual style of an outgoing message, derived from its chat category.

use crate::chat::ChatCategory;

/// Presentation triple for a category: embed accent color, footer icon and footer label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// 24-bit RGB.
    pub color: u32,
    pub icon: &'static str,
    pub label: String,
}

impl Style {
    fn new(color: u32, icon: &'static str, label: impl Into<String>) -> Self {
        Self {
            color,
            icon,
            label: label.into(),
        }
    }

    /// Footer text: icon and label separated by two spaces.
    pub fn footer(&self) -> String {
        format!("{}  {}", self.icon, self.label)
    }
}

pub const LINKSHELL_COLOR: u32 = 0x98FB98;
pub const CWLS_COLOR: u32 = 0xD7FF00;
pub const FALLBACK_COLOR: u32 = 0x95A5A6;

/// Map a category to its style. Total: every id yields a style.
///
/// Curated channels come first; the two linkshell ranges share one entry each; anything
/// else gets a neutral gray style labelled with the category name.
pub fn style_for(category: ChatCategory) -> Style {
    match category {
        ChatCategory::TELL_INCOMING => Style::new(0xFF7EB9, "📨", "Tell Incoming"),
        ChatCategory::TELL_OUTGOING => Style::new(0xFF7EB9, "📤", "Tell Outgoing"),
        ChatCategory::PARTY => Style::new(0x66CCFF, "🛡️", "Party"),
        ChatCategory::CROSS_PARTY => Style::new(0x66CCFF, "⚔️", "Cross-World Party"),
        ChatCategory::ALLIANCE => Style::new(0xFF7F00, "🚩", "Alliance"),
        ChatCategory::FREE_COMPANY => Style::new(0xADD8E6, "🏠", "Free Company"),
        ChatCategory::SAY => Style::new(0xFFFFFF, "💬", "Say"),
        ChatCategory::YELL => Style::new(0xFFFF00, "📢", "Yell"),
        ChatCategory::SHOUT => Style::new(0xFFA07A, "🔥", "Shout"),
        ChatCategory::NOVICE_NETWORK => Style::new(0x2B922F, "🌱", "Novice Network"),
        c if (ChatCategory::LS1..=ChatCategory::LS8).contains(&c) => {
            Style::new(LINKSHELL_COLOR, "🟢", "Linkshell")
        }
        c if (ChatCategory::CROSS_LINKSHELL1..=ChatCategory::CROSS_LINKSHELL8).contains(&c) => {
            Style::new(CWLS_COLOR, "🌐", "CWLS")
        }
        other => Style::new(FALLBACK_COLOR, "📝", other.to_string()),
    }
}
