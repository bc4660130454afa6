//! Rendering seam between the transcript and a concrete output.

use crate::transcript::{Sender, TranscriptEntry};

pub trait TranscriptRenderer {
    type Output;

    fn render(&self, entries: &[TranscriptEntry<'_>]) -> Self::Output;
}

/// Renders the transcript as an HTML fragment. All backend text is escaped;
/// the only markup emitted is the fixed set of wrappers below.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl TranscriptRenderer for HtmlRenderer {
    type Output = String;

    fn render(&self, entries: &[TranscriptEntry<'_>]) -> String {
        use crate::format::escape_html;

        let mut html = String::new();
        for entry in entries {
            match entry {
                TranscriptEntry::Welcome(welcome) => {
                    html.push_str("<div class=\"welcome-message\">");
                    html.push_str(&format!("<h2>{}</h2>", escape_html(welcome.title)));
                    html.push_str(&format!("<p>{}</p>", escape_html(welcome.description)));
                    html.push_str(&format!(
                        "<p class=\"disclaimer\">{}</p>",
                        escape_html(welcome.disclaimer)
                    ));
                    html.push_str("</div>\n");
                }
                TranscriptEntry::Message(message) => {
                    let class = match message.sender() {
                        Sender::User => "user",
                        Sender::Bot => "bot",
                    };
                    html.push_str(&format!(
                        "<div class=\"message {class}\"><div class=\"message-content\">{}</div><div class=\"message-time\">{}</div></div>\n",
                        message.formatted().to_html(),
                        escape_html(message.timestamp()),
                    ));
                }
                TranscriptEntry::Typing => {
                    html.push_str(
                        "<div class=\"message bot\" id=\"loading-message\"><div class=\"loading\"><span></span><span></span><span></span></div></div>\n",
                    );
                }
            }
        }
        html
    }
}
