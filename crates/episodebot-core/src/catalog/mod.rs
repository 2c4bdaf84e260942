//! Catalog adapters: the services that know about shows and their links.
//!
//! Defines the `CatalogAdapter` trait that every backend implements. The
//! pipeline only ever talks to `dyn CatalogAdapter`, so swapping seasonvar
//! for soap4me (or stacking the myshows episode lookup on top) is purely a
//! configuration concern.

pub mod myshows;
pub mod seasonvar;
pub mod soap4me;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{CatalogBackend, CatalogConfig};
use myshows::MyShowsClient;
use seasonvar::SeasonvarClient;
use soap4me::Soap4meClient;

/// Errors raised by catalog backends.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Status { status: u16 },

    /// The response body was not the JSON we expected.
    #[error("failed to parse backend response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response parsed but its content makes no sense.
    #[error("backend returned invalid data: {0}")]
    InvalidData(String),

    /// The backend does not offer this capability.
    #[error("{0} is not supported by this catalog")]
    Unsupported(&'static str),
}

/// One search hit: a show scoped to a single season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowCandidate {
    pub name: String,
    pub original_name: String,
    /// Used for matching only, never displayed.
    pub alternate_names: Vec<String>,
    pub catalog_id: String,
    pub season_number: i32,
    pub year: String,
}

impl ShowCandidate {
    /// The name shown to users: the original title when the catalog has one.
    pub fn display_name(&self) -> &str {
        if self.original_name.is_empty() {
            &self.name
        } else {
            &self.original_name
        }
    }

    /// `"<display name> <year>"`, without a trailing space when the year is unknown.
    pub fn title(&self) -> String {
        if self.year.is_empty() {
            self.display_name().to_string()
        } else {
            format!("{} {}", self.display_name(), self.year)
        }
    }

    /// Case-insensitive equality against any of the show's names.
    ///
    /// `normalized_query` must already be lowercased.
    pub fn has_name(&self, normalized_query: &str) -> bool {
        std::iter::once(&self.name)
            .chain(std::iter::once(&self.original_name))
            .chain(self.alternate_names.iter())
            .any(|name| name.to_lowercase() == normalized_query)
    }
}

/// Audio/subtitle variant of a link. The declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TranslationTrack {
    Original,
    OriginalSubtitles,
    LocalizedSubtitles,
    Localized,
    Unknown,
}

impl TranslationTrack {
    /// Map a backend-reported track label onto the closed set.
    ///
    /// Labels that are not one of the well-known names (e.g. a dubbing
    /// studio) stay `Unknown`; the label itself is still shown to the user.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "original" | "оригинал" => Self::Original,
            "original subtitles" => Self::OriginalSubtitles,
            "subtitles" | "субтитры" => Self::LocalizedSubtitles,
            "localized" => Self::Localized,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::OriginalSubtitles => "Original Subtitles",
            Self::LocalizedSubtitles => "Subtitles",
            Self::Localized => "Localized",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TranslationTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Standard,
    Hd,
    FullHd,
    Uhd,
    Unknown,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "Standard",
            Self::Hd => "HD",
            Self::FullHd => "FullHD",
            Self::Uhd => "UHD",
            Self::Unknown => "Unknown",
        })
    }
}

/// A single downloadable file for an episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub track: TranslationTrack,
    /// Track name as the backend reported it.
    pub label: String,
    pub quality: Option<Quality>,
}

/// A raw entry of a season listing, before episode filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonEntry {
    /// Backend episode label; starts with the episode number (e.g. `"5 серия"`).
    pub label: String,
    pub link: Link,
}

/// Everything a backend knows about one season of one show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonListing {
    pub show: ShowCandidate,
    pub entries: Vec<SeasonEntry>,
}

/// Result of a global episode lookup (permalink resolution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    pub show_name: String,
    pub season: i32,
    pub episode: i32,
}

/// Capability interface every catalog backend implements.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    /// Short, lowercase backend identifier (e.g. `"seasonvar"`).
    fn name(&self) -> &'static str;

    /// Search shows by free-text name. One candidate per show season.
    async fn search_by_name(&self, query: &str) -> Result<Vec<ShowCandidate>, CatalogError>;

    /// Fetch the whole season listing for a show.
    ///
    /// `season` is `None` when the identifier alone implies the season
    /// (direct identifier links); backends that need it report `InvalidData`.
    async fn season_links(
        &self,
        show_id: &str,
        season: Option<i32>,
    ) -> Result<SeasonListing, CatalogError>;

    /// Whether [`CatalogAdapter::episode_by_global_id`] is available.
    fn supports_episode_lookup(&self) -> bool {
        false
    }

    /// Resolve a global episode id to a show name, season and episode.
    ///
    /// `Ok(None)` means the backend does not know the episode.
    async fn episode_by_global_id(&self, _id: u64) -> Result<Option<EpisodeRef>, CatalogError> {
        Err(CatalogError::Unsupported("episode lookup"))
    }
}

/// Adds the myshows episode lookup to any link backend.
///
/// Search and season listings go to the wrapped catalog untouched.
pub struct WithEpisodeLookup {
    catalog: Box<dyn CatalogAdapter>,
    lookup: MyShowsClient,
}

impl WithEpisodeLookup {
    pub fn new(catalog: Box<dyn CatalogAdapter>, lookup: MyShowsClient) -> Self {
        Self { catalog, lookup }
    }
}

#[async_trait]
impl CatalogAdapter for WithEpisodeLookup {
    fn name(&self) -> &'static str {
        self.catalog.name()
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<ShowCandidate>, CatalogError> {
        self.catalog.search_by_name(query).await
    }

    async fn season_links(
        &self,
        show_id: &str,
        season: Option<i32>,
    ) -> Result<SeasonListing, CatalogError> {
        self.catalog.season_links(show_id, season).await
    }

    fn supports_episode_lookup(&self) -> bool {
        true
    }

    async fn episode_by_global_id(&self, id: u64) -> Result<Option<EpisodeRef>, CatalogError> {
        self.lookup.episode_by_id(id).await
    }
}

/// Build the catalog selected by configuration.
pub fn build(config: &CatalogConfig, client: Client) -> Arc<dyn CatalogAdapter> {
    let catalog: Box<dyn CatalogAdapter> = match config.backend {
        CatalogBackend::Seasonvar => Box::new(SeasonvarClient::new(
            client.clone(),
            &config.seasonvar.api_key,
            config.seasonvar.api_base.as_deref(),
        )),
        CatalogBackend::Soap4me => Box::new(Soap4meClient::new(
            client.clone(),
            &config.soap4me.token,
            &config.soap4me.session,
            config.soap4me.api_base.as_deref(),
            config.soap4me.storage_base.as_deref(),
            config.max_search_results,
        )),
    };

    info!(
        backend = config.backend.as_str(),
        episode_lookup = config.myshows.enabled,
        "Catalog configured"
    );

    if config.myshows.enabled {
        let lookup = MyShowsClient::new(client, config.myshows.api_base.as_deref());
        Arc::new(WithEpisodeLookup::new(catalog, lookup))
    } else {
        Arc::from(catalog)
    }
}
