//! Message formatting for stdout

use chrono::Local;

use kakaotv_core::ChatEvent;

/// Print a chat message, as text or as one JSON object per line
pub fn print_message(chat: &ChatEvent, json: bool) {
    if json {
        match serde_json::to_string(chat) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("Failed to serialize message: {}", e),
        }
    } else {
        println!("{}", format_line(chat));
    }
}

fn format_line(chat: &ChatEvent) -> String {
    format!(
        "[{}] {}: {}",
        chat.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        chat.nickname,
        chat.message
    )
}
