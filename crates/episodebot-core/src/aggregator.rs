//! Link aggregator: one season listing in, one episode's links out.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{CatalogAdapter, CatalogError, Link, SeasonEntry, ShowCandidate, TranslationTrack};
use crate::token::{InteractionToken, Verb};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Backend(#[from] CatalogError),

    #[error("no links for show {show_id} season {season:?} episode {episode}")]
    NotFound {
        show_id: String,
        season: Option<i32>,
        episode: i32,
    },
}

/// A single episode with all its links, in backend order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEpisode {
    pub show: ShowCandidate,
    pub season_number: i32,
    pub episode_number: i32,
    pub links: Vec<Link>,
}

impl ResolvedEpisode {
    /// Links partitioned by track, tracks in display order.
    pub fn grouped(&self) -> Vec<(TranslationTrack, Vec<&Link>)> {
        let mut groups: BTreeMap<TranslationTrack, Vec<&Link>> = BTreeMap::new();
        for link in &self.links {
            groups.entry(link.track).or_default().push(link);
        }
        groups.into_iter().collect()
    }

    pub fn token(&self, verb: Verb) -> InteractionToken {
        InteractionToken::new(
            verb,
            self.show.catalog_id.as_str(),
            self.season_number,
            self.episode_number,
        )
    }

    pub fn next_token(&self) -> InteractionToken {
        self.token(Verb::SendById).next()
    }

    pub fn previous_token(&self) -> InteractionToken {
        self.token(Verb::SendById).previous()
    }
}

pub struct LinkAggregator {
    catalog: Arc<dyn CatalogAdapter>,
}

impl LinkAggregator {
    pub fn new(catalog: Arc<dyn CatalogAdapter>) -> Self {
        Self { catalog }
    }

    /// Fetch the season listing and keep the entries for `episode`.
    ///
    /// `season` is `None` for identifiers that already pin the season; the
    /// listing's own season number is used then.
    pub async fn resolve_episode(
        &self,
        show_id: &str,
        season: Option<i32>,
        episode: i32,
    ) -> Result<ResolvedEpisode, AggregateError> {
        let listing = self.catalog.season_links(show_id, season).await?;
        let total = listing.entries.len();

        let links: Vec<Link> = listing
            .entries
            .into_iter()
            .filter(|entry| episode_number(&entry.label) == Some(episode))
            .map(tag_track)
            .collect();

        debug!(show_id, episode, total, matched = links.len(), "Filtered season listing");

        if links.is_empty() {
            return Err(AggregateError::NotFound {
                show_id: show_id.to_string(),
                season,
                episode,
            });
        }

        Ok(ResolvedEpisode {
            season_number: season.unwrap_or(listing.show.season_number),
            show: listing.show,
            episode_number: episode,
            links,
        })
    }
}

/// Leading whitespace-delimited integer of an entry label.
fn episode_number(label: &str) -> Option<i32> {
    label.split_whitespace().next()?.parse().ok()
}

fn tag_track(entry: SeasonEntry) -> Link {
    let mut link = entry.link;
    if link.label.trim().is_empty() {
        link.track = TranslationTrack::Original;
        link.label = TranslationTrack::Original.as_str().to_string();
    }
    link
}
