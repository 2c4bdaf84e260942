//! Intent classifier: ordered, first-match-wins text strategies.
//!
//! The patterns overlap. A notification snippet also looks like
//! "name + two numbers", and a colon-separated query also satisfies the
//! whitespace one. Evaluation order keeps them apart, so the strategy list
//! is walked front to back and never reordered.

use regex::{Captures, Regex};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// A catalog id plus an episode number. The id implies the season.
    Direct { show_id: String, episode: i32 },
    /// A show name to search for.
    Search {
        query: String,
        season: i32,
        episode: i32,
    },
    /// An episode permalink, resolved through the catalog's episode lookup.
    Permalink { episode_id: u64 },
}

/// A successful classification and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub strategy: &'static str,
    pub intent: Intent,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field} is not a number: '{value}'")]
pub struct NumberError {
    field: &'static str,
    value: String,
}

type Extractor = fn(&Captures) -> Result<Intent, NumberError>;

/// A named pattern plus the rule that turns its captures into an intent.
pub struct Strategy {
    name: &'static str,
    pattern: Regex,
    extract: Extractor,
}

impl Strategy {
    fn new(name: &'static str, pattern: &str, extract: Extractor) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            extract,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

const BY_ID: &str = r"\bid\s*(\d+)\s+(\d+)";
const SEASONVAR_LINK: &str = r"https?://seasonvar\.ru/serial-(\d+).*\.html\s+(\d+)";
const MOBILE_SEASONVAR_LINK: &str = r"https?://m\.seasonvar\.ru/#season/(\d+)\s+(\d+)";
const MYSHOWS_UNSEEN: &str = r"(.*) /show_\d+\n.*\ns(\d+)e(\d+)";
const MYSHOWS_NEW_EPISODE: &str = r"Новый эпизод сериала (.*)\n.*s(\d+)e(\d+)";
const MYSHOWS_LINK: &str = r"https?://myshows\.me/view/episode/?(\d+)/?";
const SEARCH_COLONS: &str = r"(.*):\s*(\d+)\s*:\s*(\d+)";
const SEARCH_SPACES: &str = r"(.*)\s+(\d+)\s+(\d+)";

pub struct IntentClassifier {
    strategies: Vec<Strategy>,
}

impl IntentClassifier {
    /// Build the strategy list.
    ///
    /// `episode_lookup` enables the permalink strategy; without an episode
    /// lookup capability in the catalog such links cannot be served.
    pub fn new(episode_lookup: bool) -> Result<Self, regex::Error> {
        let mut strategies = vec![
            Strategy::new("ById", BY_ID, extract_direct)?,
            Strategy::new("SeasonvarLink", SEASONVAR_LINK, extract_direct)?,
            Strategy::new("MobileSeasonvarLink", MOBILE_SEASONVAR_LINK, extract_direct)?,
            Strategy::new("MyShowsUnseen", MYSHOWS_UNSEEN, extract_search)?,
            Strategy::new("MyShowsNewEpisode", MYSHOWS_NEW_EPISODE, extract_search)?,
        ];
        if episode_lookup {
            strategies.push(Strategy::new("MyShowsLink", MYSHOWS_LINK, extract_permalink)?);
        }
        strategies.push(Strategy::new("SearchColons", SEARCH_COLONS, extract_search)?);
        strategies.push(Strategy::new("SearchSpaces", SEARCH_SPACES, extract_search)?);

        debug!(strategies = strategies.len(), "Intent classifier ready");

        Ok(Self { strategies })
    }

    /// Strategy names in evaluation order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    /// Whether any strategy matches, without extracting anything.
    pub fn matches(&self, text: &str) -> bool {
        self.strategies.iter().any(|s| s.pattern.is_match(text))
    }

    /// Classify a message. `None` means nothing to do.
    ///
    /// The first matching strategy decides. If its numbers do not parse the
    /// message is dropped; later strategies are not consulted.
    pub fn classify(&self, text: &str) -> Option<Classified> {
        let (strategy, captures) = self
            .strategies
            .iter()
            .find_map(|s| s.pattern.captures(text).map(|c| (s, c)))?;

        match (strategy.extract)(&captures) {
            Ok(intent) => {
                info!(strategy = strategy.name, "Using strategy");
                Some(Classified {
                    strategy: strategy.name,
                    intent,
                })
            }
            Err(e) => {
                warn!(strategy = strategy.name, error = %e, "Dropping message");
                None
            }
        }
    }
}

fn group<'t>(captures: &Captures<'t>, index: usize) -> &'t str {
    captures.get(index).map_or("", |m| m.as_str())
}

fn number<T: FromStr>(captures: &Captures, index: usize, field: &'static str) -> Result<T, NumberError> {
    let raw = group(captures, index);
    raw.trim().parse().map_err(|_| NumberError {
        field,
        value: raw.to_string(),
    })
}

fn extract_direct(captures: &Captures) -> Result<Intent, NumberError> {
    Ok(Intent::Direct {
        show_id: number::<u64>(captures, 1, "show id")?.to_string(),
        episode: number(captures, 2, "episode")?,
    })
}

fn extract_search(captures: &Captures) -> Result<Intent, NumberError> {
    Ok(Intent::Search {
        query: group(captures, 1).trim().to_string(),
        season: number(captures, 2, "season")?,
        episode: number(captures, 3, "episode")?,
    })
}

fn extract_permalink(captures: &Captures) -> Result<Intent, NumberError> {
    Ok(Intent::Permalink {
        episode_id: number(captures, 1, "episode id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(true).unwrap()
    }

    fn search(query: &str, season: i32, episode: i32) -> Intent {
        Intent::Search {
            query: query.into(),
            season,
            episode,
        }
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            classifier().strategy_names(),
            vec![
                "ById",
                "SeasonvarLink",
                "MobileSeasonvarLink",
                "MyShowsUnseen",
                "MyShowsNewEpisode",
                "MyShowsLink",
                "SearchColons",
                "SearchSpaces",
            ]
        );
    }

    #[test]
    fn test_permalink_strategy_needs_lookup() {
        let c = IntentClassifier::new(false).unwrap();
        assert!(!c.strategy_names().contains(&"MyShowsLink"));
        assert!(c.classify("https://myshows.me/view/episode/123456/").is_none());
    }

    #[test]
    fn test_by_id() {
        let got = classifier().classify("id1234 5").unwrap();
        assert_eq!(got.strategy, "ById");
        assert_eq!(
            got.intent,
            Intent::Direct {
                show_id: "1234".into(),
                episode: 5
            }
        );

        let got = classifier().classify("id 77 3").unwrap();
        assert_eq!(got.strategy, "ById");
    }

    #[test]
    fn test_by_id_is_case_sensitive() {
        let got = classifier().classify("The ID 2 5").unwrap();
        assert_eq!(got.strategy, "SearchSpaces");
        assert_eq!(got.intent, search("The ID", 2, 5));
    }

    #[test]
    fn test_by_id_beats_spaces() {
        // SearchSpaces alone would read this as ("id12", 3, 4).
        let got = classifier().classify("id12 3 4").unwrap();
        assert_eq!(got.strategy, "ById");
        assert_eq!(
            got.intent,
            Intent::Direct {
                show_id: "12".into(),
                episode: 3
            }
        );
    }

    #[test]
    fn test_seasonvar_links() {
        let got = classifier()
            .classify("http://seasonvar.ru/serial-4321-Breaking_Bad-2-season.html 6")
            .unwrap();
        assert_eq!(got.strategy, "SeasonvarLink");
        assert_eq!(
            got.intent,
            Intent::Direct {
                show_id: "4321".into(),
                episode: 6
            }
        );

        let got = classifier()
            .classify("https://m.seasonvar.ru/#season/4321 7")
            .unwrap();
        assert_eq!(got.strategy, "MobileSeasonvarLink");
        assert_eq!(
            got.intent,
            Intent::Direct {
                show_id: "4321".into(),
                episode: 7
            }
        );
    }

    #[test]
    fn test_unseen_snippet_beats_generic_search() {
        // Line two alone would satisfy SearchSpaces with season 2.
        let text = "Fargo /show_1234\nunwatched 2 5\ns03e07 The Law of Non-Contradiction";
        let got = classifier().classify(text).unwrap();
        assert_eq!(got.strategy, "MyShowsUnseen");
        assert_eq!(got.intent, search("Fargo", 3, 7));
    }

    #[test]
    fn test_new_episode_snippet() {
        let text = "Новый эпизод сериала Fargo\nЭпизод 98765 12 s03e07";
        let got = classifier().classify(text).unwrap();
        assert_eq!(got.strategy, "MyShowsNewEpisode");
        assert_eq!(got.intent, search("Fargo", 3, 7));
    }

    #[test]
    fn test_permalink() {
        let got = classifier()
            .classify("look https://myshows.me/view/episode/123456/")
            .unwrap();
        assert_eq!(got.strategy, "MyShowsLink");
        assert_eq!(got.intent, Intent::Permalink { episode_id: 123456 });
    }

    #[test]
    fn test_colons() {
        let got = classifier().classify("Breaking Bad: 2: 5").unwrap();
        assert_eq!(got.strategy, "SearchColons");
        assert_eq!(got.intent, search("Breaking Bad", 2, 5));
    }

    #[test]
    fn test_colons_beat_spaces() {
        // SearchSpaces alone would read this as ("Lost: 1:", 2, 3).
        let got = classifier().classify("Lost: 1: 2 3").unwrap();
        assert_eq!(got.strategy, "SearchColons");
        assert_eq!(got.intent, search("Lost", 1, 2));
    }

    #[test]
    fn test_spaces() {
        let got = classifier().classify("  The Wire 3 11 ").unwrap();
        assert_eq!(got.strategy, "SearchSpaces");
        assert_eq!(got.intent, search("The Wire", 3, 11));
    }

    #[test]
    fn test_no_match() {
        assert!(classifier().classify("hello there").is_none());
        assert!(classifier().classify("").is_none());
        assert!(classifier().classify("Lost 4").is_none());
        assert!(!classifier().matches("hello there"));
        assert!(classifier().matches("Lost 1 2"));
    }

    #[test]
    fn test_number_overflow_drops_without_fallback() {
        // SearchSpaces would accept this, but SearchColons matched first.
        assert!(classifier().classify("Lost: 99999999999: 2 3").is_none());
        assert!(classifier().classify("Lost 1 99999999999").is_none());
    }
}
