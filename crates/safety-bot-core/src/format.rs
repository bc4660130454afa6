//! Lightweight inline formatting for bot replies.
//!
//! Bot text is turned into structured lines of styled segments rather than
//! markup, so no renderer ever has to interpret raw backend text.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedLine {
    pub segments: Vec<Segment>,
}

impl FormattedLine {
    /// The line's text with all styling dropped.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedText {
    pub lines: Vec<FormattedLine>,
}

impl FormattedText {
    /// Literal text, one unstyled segment per line. Used for user messages.
    pub fn plain(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| FormattedLine {
                segments: if line.is_empty() {
                    Vec::new()
                } else {
                    vec![Segment::plain(line)]
                },
            })
            .collect();
        Self { lines }
    }

    /// Apply bot formatting: `**strong**`, `*emphasis*` and `Label:` prefixes.
    ///
    /// Marker pairs are resolved over the whole text, so a span may cover
    /// several lines. Labels are decided per line.
    pub fn bot(text: &str) -> Self {
        let chars = mark_emphasis(mark_strong(text));
        let lines = chars
            .split(|c| c.ch == '\n')
            .map(|line| {
                let mut line = line.to_vec();
                if !line.iter().any(|c| c.strong) {
                    mark_label(&mut line);
                }
                FormattedLine {
                    segments: collapse(&line),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn to_html(&self) -> String {
        self.lines
            .iter()
            .map(line_to_html)
            .collect::<Vec<_>>()
            .join("<br>")
    }
}

#[derive(Debug, Clone, Copy)]
struct StyledChar {
    ch: char,
    strong: bool,
    emphasis: bool,
}

fn strong_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\*\*(.*?)\*\*").expect("static regex"))
}

/// Resolves `**..**` pairs, non-greedy, across line breaks.
fn mark_strong(text: &str) -> Vec<StyledChar> {
    let mut chars = Vec::with_capacity(text.len());
    let mut last = 0;

    let push = |chars: &mut Vec<StyledChar>, text: &str, strong: bool| {
        chars.extend(text.chars().map(|ch| StyledChar {
            ch,
            strong,
            emphasis: false,
        }));
    };

    for caps in strong_pattern().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push(&mut chars, &text[last..whole.start()], false);
        push(&mut chars, inner.as_str(), true);
        last = whole.end();
    }
    push(&mut chars, &text[last..], false);

    chars
}

/// Pairs each `*` with the next one, left to right; an unpaired trailing `*` stays literal.
fn mark_emphasis(chars: Vec<StyledChar>) -> Vec<StyledChar> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i].ch == '*' {
            if let Some(offset) = chars[i + 1..].iter().position(|c| c.ch == '*') {
                let close = i + 1 + offset;
                out.extend(chars[i + 1..close].iter().map(|c| StyledChar {
                    emphasis: true,
                    ..*c
                }));
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

fn mark_label(chars: &mut [StyledChar]) {
    // A label needs at least one character before the colon.
    match chars.iter().position(|c| c.ch == ':') {
        Some(colon) if colon > 0 => {
            for c in &mut chars[..=colon] {
                c.strong = true;
            }
        }
        _ => {}
    }
}

fn collapse(chars: &[StyledChar]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for c in chars {
        match segments.last_mut() {
            Some(last) if last.strong == c.strong && last.emphasis == c.emphasis => {
                last.text.push(c.ch);
            }
            _ => segments.push(Segment {
                text: c.ch.to_string(),
                strong: c.strong,
                emphasis: c.emphasis,
            }),
        }
    }
    segments
}

fn line_to_html(line: &FormattedLine) -> String {
    let mut html = String::new();
    for segment in &line.segments {
        let mut piece = escape_html(&segment.text);
        if segment.emphasis {
            piece = format!("<em>{piece}</em>");
        }
        if segment.strong {
            piece = format!("<strong>{piece}</strong>");
        }
        html.push_str(&piece);
    }
    html
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
