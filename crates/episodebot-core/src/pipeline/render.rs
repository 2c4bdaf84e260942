//! Reply rendering.

use crate::aggregator::ResolvedEpisode;
use crate::bus::events::{Button, Reply};
use crate::catalog::{Link, ShowCandidate};
use crate::token::{InteractionToken, Verb};

pub const NOT_FOUND: &str = "Not found";
pub const SELECT_PROMPT: &str = "Select tv show";
pub const NEXT_LABEL: &str = "Next Episode";
pub const PREVIOUS_LABEL: &str = "Previous Episode";

pub fn not_found() -> Reply {
    Reply::plain(NOT_FOUND)
}

/// One button per candidate; pressing one resolves `episode` of that show.
pub fn selection(candidates: &[ShowCandidate], episode: i32) -> Reply {
    let buttons = candidates
        .iter()
        .map(|show| {
            let token =
                InteractionToken::new(Verb::SendById, show.catalog_id.as_str(), show.season_number, episode);
            Button::callback(show.title(), token.encode())
        })
        .collect();

    Reply::plain(SELECT_PROMPT).with_buttons(buttons)
}

/// One line per translation track, blank line between them.
pub fn episode(resolved: &ResolvedEpisode) -> Reply {
    let heading = format!(
        "{} s{:02}e{:02}",
        escape_html(&resolved.show.title()),
        resolved.season_number,
        resolved.episode_number
    );

    let lines: Vec<String> = resolved
        .grouped()
        .into_iter()
        .map(|(_, links)| {
            let anchors: Vec<String> = links.into_iter().map(anchor).collect();
            format!("{} {}", heading, anchors.join(" "))
        })
        .collect();

    Reply::html(lines.join("\n\n")).with_buttons(vec![
        Button::callback(NEXT_LABEL, resolved.next_token().encode()),
        Button::callback(PREVIOUS_LABEL, resolved.previous_token().encode()),
    ])
}

fn anchor(link: &Link) -> String {
    let text = match link.quality {
        Some(quality) => format!("{} ({})", link.label, quality),
        None => link.label.clone(),
    };
    format!(
        "<a href=\"{}\">{}</a>",
        escape_html(&link.url),
        escape_html(&text)
    )
}

/// Escape the characters Telegram's HTML parse mode cares about.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
