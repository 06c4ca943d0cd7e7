//! Plain-text rendering of transcript messages for the terminal.

use transito::message::Message;
use transito::suggestions::{
    CITATION_HEADING, SUGGESTIONS, SUGGESTIONS_HEADING, SUBTITLE, TITLE, TYPING_LABEL,
    WELCOME_BODY, WELCOME_HEADING,
};

const INDENT: &str = "  ";

pub fn header() -> String {
    format!("{} — {}", TITLE, SUBTITLE)
}

/// Welcome view: greeting plus numbered suggestions.
pub fn welcome() -> String {
    let mut out = format!("{}\n\n{}\n\n{}:\n", WELCOME_HEADING, WELCOME_BODY, SUGGESTIONS_HEADING);
    for (i, s) in SUGGESTIONS.iter().enumerate() {
        out.push_str(&format!("{}{}. {} {}\n", INDENT, i + 1, s.icon(), s.caption()));
    }
    out.push_str("\nEscribe el número de una pregunta o tu propia consulta.");
    out
}

pub fn typing() -> String {
    format!("… {}", TYPING_LABEL)
}

pub fn message(m: &Message) -> String {
    let who = if m.is_bot { TITLE } else { "Tú" };
    let mut out = format!("{} · {}\n", who, m.time_label());
    if !m.text.is_empty() {
        for line in m.text.lines() {
            out.push_str(INDENT);
            out.push_str(line);
            out.push('\n');
        }
    }
    if let Some(url) = m.image() {
        out.push_str(&format!("{}[imagen] {}\n", INDENT, url));
    }
    let buttons = m.buttons();
    if !buttons.is_empty() {
        let labels: Vec<String> = buttons
            .iter()
            .enumerate()
            .map(|(i, b)| format!("[{}] {}", i + 1, b.title))
            .collect();
        out.push_str(&format!("{}{}  (usa /b N)\n", INDENT, labels.join("  ")));
    }
    if m.is_bot {
        if let Some(src) = m.citation() {
            out.push_str(&format!("{}{}\n", INDENT, CITATION_HEADING));
            out.push_str(&format!("{}{}{}\n", INDENT, INDENT, src.article));
            out.push_str(&format!("{}{}{}\n", INDENT, INDENT, src.law));
            if !src.description.is_empty() {
                out.push_str(&format!("{}{}{}\n", INDENT, INDENT, src.description));
            }
        }
    }
    out
}
