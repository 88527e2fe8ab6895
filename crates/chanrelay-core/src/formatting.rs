//! Reply formatting (Telegram HTML).

use crate::domain::{ChannelId, UserId};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `/list` report. Both slices are expected in ascending id order.
pub fn render_list_report(channels: &[(ChannelId, String)], recipients: &[UserId]) -> String {
    let mut lines = vec!["📌 <b>Channels:</b>".to_string()];
    if channels.is_empty() {
        lines.push("❌ The list is empty.".to_string());
    }
    for (id, name) in channels {
        lines.push(format!("- {} (<code>{id}</code>)", escape_html(name)));
    }

    lines.push(String::new());
    lines.push("👥 <b>Recipients:</b>".to_string());
    if recipients.is_empty() {
        lines.push("❌ Nobody yet.".to_string());
    }
    for id in recipients {
        lines.push(format!("- <code>{id}</code>"));
    }

    lines.join("\n")
}

pub fn help_text() -> &'static str {
    "🤖 <b>Commands:</b>\n\n\
/add – add a channel\n\
/cancel – leave the current input mode\n\
/list – list channels and recipients\n\
/remove – remove a channel\n\
/adduser – add a recipient (ID)\n\
/removeuser &lt;ID&gt; – remove a recipient\n\
/help – show this help"
}
