//! In-memory catalog for tests. Records every season-listing call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    CatalogAdapter, CatalogError, EpisodeRef, Link, SeasonEntry, SeasonListing, ShowCandidate,
    TranslationTrack,
};

#[derive(Default)]
pub struct FakeCatalog {
    pub candidates: Vec<ShowCandidate>,
    pub listings: HashMap<String, SeasonListing>,
    pub episodes: HashMap<u64, EpisodeRef>,
    pub lookup: bool,
    pub failing: bool,
    pub listing_calls: Mutex<Vec<(String, Option<i32>)>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidate(mut self, candidate: ShowCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn with_listing(mut self, listing: SeasonListing) -> Self {
        self.listings.insert(listing.show.catalog_id.clone(), listing);
        self
    }

    pub fn with_episode(mut self, id: u64, episode: EpisodeRef) -> Self {
        self.lookup = true;
        self.episodes.insert(id, episode);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<i32>)> {
        self.listing_calls.lock().unwrap().clone()
    }
}

pub fn candidate(id: &str, name: &str, season: i32) -> ShowCandidate {
    ShowCandidate {
        name: name.to_string(),
        original_name: String::new(),
        alternate_names: Vec::new(),
        catalog_id: id.to_string(),
        season_number: season,
        year: "2010".to_string(),
    }
}

pub fn entry(episode: i32, track: TranslationTrack, url: &str) -> SeasonEntry {
    SeasonEntry {
        label: format!("{} серия", episode),
        link: Link {
            url: url.to_string(),
            track,
            label: track.as_str().to_string(),
            quality: None,
        },
    }
}

#[async_trait]
impl CatalogAdapter for FakeCatalog {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search_by_name(&self, _query: &str) -> Result<Vec<ShowCandidate>, CatalogError> {
        if self.failing {
            return Err(CatalogError::Status { status: 502 });
        }
        Ok(self.candidates.clone())
    }

    async fn season_links(
        &self,
        show_id: &str,
        season: Option<i32>,
    ) -> Result<SeasonListing, CatalogError> {
        self.listing_calls
            .lock()
            .unwrap()
            .push((show_id.to_string(), season));
        if self.failing {
            return Err(CatalogError::Status { status: 502 });
        }
        self.listings
            .get(show_id)
            .cloned()
            .ok_or_else(|| CatalogError::InvalidData(format!("no listing for {}", show_id)))
    }

    fn supports_episode_lookup(&self) -> bool {
        self.lookup
    }

    async fn episode_by_global_id(&self, id: u64) -> Result<Option<EpisodeRef>, CatalogError> {
        if !self.lookup {
            return Err(CatalogError::Unsupported("episode lookup"));
        }
        Ok(self.episodes.get(&id).cloned())
    }
}
