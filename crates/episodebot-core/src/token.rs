//! Interaction tokens: button payloads that carry the whole session.
//!
//! A token is `"<verb>:<show id>:<season>:<episode>"`. Decoding one yields
//! exactly the arguments the link aggregator needs, so a button press never
//! touches server-side state. Tokens are not signed; they only ever come
//! back from buttons on messages the bot sent itself.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SEPARATOR: char = ':';
const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// A disambiguation choice. Also the verb of every pre-navigation button.
    SendById,
    Next,
    Prev,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendById => "SendById",
            Self::Next => "Next",
            Self::Prev => "Prev",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SendById" => Ok(Self::SendById),
            "Next" => Ok(Self::Next),
            "Prev" => Ok(Self::Prev),
            other => Err(TokenError::UnknownVerb(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("expected 4 fields, got {0}")]
    FieldCount(usize),

    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    #[error("empty show identifier")]
    EmptyShowId,

    #[error("{field} is not a number: '{value}'")]
    NotANumber { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionToken {
    pub verb: Verb,
    pub show_id: String,
    pub season: i32,
    pub episode: i32,
}

impl InteractionToken {
    pub fn new(verb: Verb, show_id: impl Into<String>, season: i32, episode: i32) -> Self {
        Self {
            verb,
            show_id: show_id.into(),
            season,
            episode,
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let fields: Vec<&str> = token.split(SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(TokenError::FieldCount(fields.len()));
        }

        let verb: Verb = fields[0].trim().parse()?;
        let show_id = fields[1].trim();
        if show_id.is_empty() {
            return Err(TokenError::EmptyShowId);
        }

        Ok(Self {
            verb,
            show_id: show_id.to_string(),
            season: parse_number("season", fields[2])?,
            episode: parse_number("episode", fields[3])?,
        })
    }

    /// Same show and season, one episode further.
    pub fn next(&self) -> Self {
        Self {
            verb: Verb::Next,
            episode: self.episode.wrapping_add(1),
            ..self.clone()
        }
    }

    /// Same show and season, one episode back. No lower bound: episode 0
    /// simply resolves to "not found". Both steps wrap at the `i32` range.
    pub fn previous(&self) -> Self {
        Self {
            verb: Verb::Prev,
            episode: self.episode.wrapping_sub(1),
            ..self.clone()
        }
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<i32, TokenError> {
    value
        .trim()
        .parse()
        .map_err(|_| TokenError::NotANumber {
            field,
            value: value.to_string(),
        })
}

impl fmt::Display for InteractionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.verb,
            self.show_id,
            self.season,
            self.episode,
            sep = SEPARATOR
        )
    }
}

impl FromStr for InteractionToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
