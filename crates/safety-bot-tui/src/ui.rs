use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use safety_bot_core::{
    ConnectionState, FormattedLine, Sender, TranscriptEntry, TranscriptRenderer, Welcome,
};
use crate::app::{App, InputMode};

/// Draws the transcript as ratatui text.
pub struct ChatTextRenderer {
    pub animation_frame: u8,
}

impl TranscriptRenderer for ChatTextRenderer {
    type Output = Text<'static>;

    fn render(&self, entries: &[TranscriptEntry<'_>]) -> Text<'static> {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for entry in entries {
            match entry {
                TranscriptEntry::Welcome(welcome) => push_welcome(&mut lines, welcome),
                TranscriptEntry::Message(message) => {
                    let (label, color) = match message.sender() {
                        Sender::User => ("You", Color::Cyan),
                        Sender::Bot => ("Safety Bot", Color::Yellow),
                    };
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{}:", label),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!(" {}", message.timestamp()),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]));
                    for line in &message.formatted().lines {
                        lines.push(styled_line(line));
                    }
                    lines.push(Line::default());
                }
                TranscriptEntry::Typing => {
                    lines.push(Line::from(Span::styled(
                        "Safety Bot:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    // Animated ellipsis: cycles through ".", "..", "..."
                    let dots = ".".repeat((self.animation_frame as usize) + 1);
                    lines.push(Line::from(Span::styled(
                        format!("Thinking{}", dots),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    )));
                }
            }
        }

        Text::from(lines)
    }
}

fn push_welcome(lines: &mut Vec<Line<'static>>, welcome: &Welcome) {
    lines.push(Line::from(Span::styled(
        welcome.title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(welcome.description));
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("⚠ ", Style::default().fg(Color::Yellow)),
        Span::styled(welcome.disclaimer, Style::default().fg(Color::DarkGray)),
    ]));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Try asking:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (i, question) in welcome.suggestions.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", i + 1), Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" "),
            Span::raw(*question),
        ]));
    }
}

/// Convert formatted segments to styled spans
fn styled_line(line: &FormattedLine) -> Line<'static> {
    let spans: Vec<Span<'static>> = line
        .segments
        .iter()
        .map(|segment| {
            let mut style = Style::default();
            if segment.strong {
                style = style.add_modifier(Modifier::BOLD);
            }
            if segment.emphasis {
                style = style.add_modifier(Modifier::ITALIC);
            }
            Span::styled(segment.text.clone(), style)
        })
        .collect();

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if let Some(message) = app.alert.as_deref() {
        render_alert(message, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let connection = app.session.connection();
    let dot_color = match connection {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Disconnected => Color::Red,
    };

    let title = Line::from(vec![
        Span::styled(" Oil & Gas Safety Bot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled("●", Style::default().fg(dot_color)),
        Span::styled(format!(" {}", connection.label()), Style::default().fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area height for scroll calculations (inner size minus borders)
    app.query_chat_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    let renderer = ChatTextRenderer {
        animation_frame: app.animation_frame,
    };
    let text = renderer.render(&app.session.transcript().snapshot());

    // Measure the wrapped paragraph before the block is attached
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
    let total_lines = paragraph.line_count(inner_width).min(u16::MAX as usize) as u16;
    app.sync_scroll(total_lines);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let chat = paragraph.block(chat_block).scroll((app.query_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.input_enabled();
    let editing = app.input_mode == InputMode::Editing;

    let (border_color, title) = if !enabled {
        (Color::DarkGray, " Waiting for reply... ")
    } else if editing {
        (Color::Yellow, " Ask a safety question ")
    } else {
        (Color::DarkGray, " Ask a safety question (i to type) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor inside the visible window
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if enabled { Color::Cyan } else { Color::DarkGray };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);

    frame.render_widget(input, area);

    // No cursor while the input is disabled or an alert is up
    if editing && enabled && app.alert.is_none() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" ASK ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.alert.is_some() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" dismiss ", label_style),
        ]
    } else {
        match app.input_mode {
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
            InputMode::Normal => {
                let mut hints = vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" i ", key_style),
                    Span::styled(" type ", label_style),
                ];
                if app.session.transcript().welcome_visible() {
                    hints.extend(vec![
                        Span::styled(" 1-4 ", key_style),
                        Span::styled(" suggestion ", label_style),
                    ]);
                }
                hints.extend(vec![
                    Span::styled(" c ", key_style),
                    Span::styled(" clear ", label_style),
                    Span::styled(" q ", key_style),
                    Span::styled(" quit ", label_style),
                ]);
                hints
            }
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_alert(message: &str, frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Safety Bot ");

    let body = Text::from(vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let alert = Paragraph::new(body).block(block).wrap(Wrap { trim: true });
    frame.render_widget(alert, popup_area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use safety_bot_core::{
        BotBackend, ChatMessage, ChatReply, ChatSession, ClientError, HealthReport, Transcript,
    };

    use super::*;

    struct UnusedBackend;

    #[async_trait]
    impl BotBackend for UnusedBackend {
        async fn health(&self) -> Result<HealthReport, ClientError> {
            Err(ClientError::Network("offline".to_string()))
        }

        async fn chat(&self, _query: &str) -> Result<ChatReply, ClientError> {
            Err(ClientError::Network("offline".to_string()))
        }

        fn base_url(&self) -> &str {
            "http://bot.test/api"
        }
    }

    #[test]
    fn bot_segments_become_styled_spans() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::new("Hazards: **gas** *leaks*", Sender::Bot, "09:30"));

        let text = ChatTextRenderer { animation_frame: 0 }.render(&transcript.snapshot());

        // Header line, one content line, blank separator
        assert_eq!(text.lines.len(), 3);
        let content = &text.lines[1];
        let bold: Vec<_> = content
            .spans
            .iter()
            .filter(|span| span.style.add_modifier.contains(Modifier::BOLD))
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(bold, vec!["gas"]);
        assert!(content
            .spans
            .iter()
            .any(|span| span.content == "leaks" && span.style.add_modifier.contains(Modifier::ITALIC)));
    }

    #[test]
    fn typing_entry_animates() {
        let mut transcript = Transcript::new();
        transcript.set_typing(true);

        let text = ChatTextRenderer { animation_frame: 2 }.render(&transcript.snapshot());
        let last = text.lines.last().unwrap();
        assert_eq!(last.spans[0].content, "Thinking...");
    }

    #[test]
    fn follow_tail_shows_last_wrapped_line() {
        let mut session = ChatSession::with_clock(
            Arc::new(UnusedBackend),
            Arc::new(|| "12:00".to_string()),
        );
        session.append(format!("{}\nEND-MARKER", "aaaaaaaaaa ".repeat(12)), Sender::Bot);
        let mut app = App::new(session);

        let mut terminal = Terminal::new(TestBackend::new(22, 14)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("END-MARKER"), "newest line is off-screen");
        assert!(app.query_scroll > 0);
    }
}
