//! Stdin host: one JSON event per line, pushed onto the event bus from a plain thread.
//!
//! ```text
//! {"type":"chat","category":10,"sender":"Alice Example@Gilgamesh","message":"hello"}
//! {"type":"chat","category":14,"sender":"Bob","message":"hi","player":{"name":"Bob Local","world":"Ultros"}}
//! {"type":"dutyReady","duty":"Sastasha"}
//! ```

use lib::chat::ChatCategory;
use lib::events::{ChatEvent, DutyReadyEvent, EventBus, SenderInfo};
use serde::Deserialize;
use std::io::BufRead;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    Chat {
        category: u16,
        sender: String,
        message: String,
        #[serde(default)]
        player: Option<PlayerLine>,
    },
    DutyReady {
        duty: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct PlayerLine {
    pub name: String,
    pub world: String,
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<HostEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Push one host event onto the bus.
pub fn emit(bus: &EventBus, event: HostEvent) {
    match event {
        HostEvent::Chat {
            category,
            sender,
            message,
            player,
        } => {
            let sender = match player {
                Some(p) => SenderInfo::player(sender, p.name, p.world),
                None => SenderInfo::display(sender),
            };
            bus.emit_chat(&ChatEvent {
                category: ChatCategory(category),
                sender,
                text: message,
            });
        }
        HostEvent::DutyReady { duty } => {
            bus.emit_duty_ready(&DutyReadyEvent { duty_name: duty });
        }
    }
}

/// Read stdin until EOF on a dedicated thread; `on_eof` runs when input ends.
pub fn spawn_stdin_reader(bus: Arc<EventBus>, on_eof: impl FnOnce() + Send + 'static) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::error!("stdin read failed: {}", e);
                    break;
                }
            };
            match parse_line(&line) {
                Ok(Some(event)) => emit(&bus, event),
                Ok(None) => {}
                Err(e) => log::warn!("ignoring malformed event line: {}", e),
            }
        }
        log::debug!("stdin closed");
        on_eof();
    });
}
