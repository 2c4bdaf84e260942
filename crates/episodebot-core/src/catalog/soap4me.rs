//! Soap4me catalog backend (API v2).
//!
//! Soap4me ids are per show, not per season, so a search expands every hit
//! into one candidate per season by fetching the show's episode list. All
//! requests carry the API token header and the session cookie.

use async_trait::async_trait;
use futures::future::try_join_all;
use md5::{Digest, Md5};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use super::{
    CatalogAdapter, CatalogError, Link, Quality, SeasonEntry, SeasonListing, ShowCandidate,
    TranslationTrack,
};

const DEFAULT_API_URL: &str = "https://api.soap4.me/v2";
const DEFAULT_STORAGE_URL: &str = "https://storage.soap4.me";

pub struct Soap4meClient {
    client: Client,
    token: String,
    session: String,
    api_url: String,
    storage_url: String,
    max_results: usize,
}

impl Soap4meClient {
    pub fn new(
        client: Client,
        token: &str,
        session: &str,
        api_base: Option<&str>,
        storage_base: Option<&str>,
        max_results: usize,
    ) -> Self {
        let api_url = api_base
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        let storage_url = storage_base
            .unwrap_or(DEFAULT_STORAGE_URL)
            .trim_end_matches('/')
            .to_string();

        debug!(api_url = %api_url, "Initialized soap4me client");

        Self {
            client,
            token: token.to_string(),
            session: session.to_string(),
            api_url,
            storage_url,
            max_results,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.api_url, path);

        debug!(url = %url, "Sending soap4me request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("X-Api-Token", &self.token)
            .header("Cookie", format!("PHPSESSID={}", self.session))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn episodes(&self, sid: &str) -> Result<Vec<EpisodeItem>, CatalogError> {
        let result: EpisodesResult = self.get(&format!("episodes/{}/", sid), &[]).await?;
        Ok(result.episodes)
    }

    async fn description(&self, sid: &str) -> Result<ShowItem, CatalogError> {
        let result: DescriptionResult = self
            .get(&format!("soap/description/{}/", sid), &[])
            .await?;
        Ok(result.soap)
    }

    /// Signed storage URL for one file of an episode.
    fn download_url(&self, sid: &str, file: &FileItem) -> String {
        let signature = Md5::digest(format!("{}{}{}{}", self.token, file.eid, sid, file.hash));
        format!(
            "{}/{:x}/{}/{}/",
            self.storage_url, signature, file.eid, file.hash
        )
    }

    fn to_link(&self, sid: &str, file: &FileItem) -> Link {
        let track = translation_track(&file.translate);
        Link {
            url: self.download_url(sid, file),
            track,
            label: track.as_str().to_string(),
            quality: Some(quality(&file.quality)),
        }
    }
}

/// Soap4me sends small codes as numbers or strings depending on the endpoint.
fn as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn translation_track(code: &Value) -> TranslationTrack {
    match as_code(code) {
        Some(1) => TranslationTrack::Original,
        Some(2) => TranslationTrack::OriginalSubtitles,
        Some(3) => TranslationTrack::LocalizedSubtitles,
        Some(4) => TranslationTrack::Localized,
        _ => TranslationTrack::Unknown,
    }
}

fn quality(code: &Value) -> Quality {
    match as_code(code) {
        Some(1) => Quality::Standard,
        Some(2) => Quality::Hd,
        Some(3) => Quality::FullHd,
        Some(4) => Quality::Uhd,
        _ => Quality::Unknown,
    }
}

// ── Soap4me API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    series: Vec<ShowItem>,
}

#[derive(Deserialize)]
struct DescriptionResult {
    soap: ShowItem,
}

#[derive(Deserialize, Clone)]
struct ShowItem {
    sid: String,
    title: String,
    #[serde(default)]
    title_ru: Option<String>,
    #[serde(default)]
    year: Option<Value>,
}

#[derive(Deserialize)]
struct EpisodesResult {
    #[serde(default)]
    episodes: Vec<EpisodeItem>,
}

#[derive(Deserialize)]
struct EpisodeItem {
    season: Value,
    episode: Value,
    #[serde(default)]
    files: Vec<FileItem>,
}

#[derive(Deserialize)]
struct FileItem {
    eid: String,
    hash: String,
    #[serde(default)]
    quality: Value,
    #[serde(default)]
    translate: Value,
}

impl ShowItem {
    fn candidate(&self, season_number: i32) -> ShowCandidate {
        let localized = self.title_ru.clone().unwrap_or_default();
        let year = match &self.year {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        ShowCandidate {
            name: if localized.is_empty() {
                self.title.clone()
            } else {
                localized
            },
            original_name: self.title.clone(),
            alternate_names: Vec::new(),
            catalog_id: self.sid.clone(),
            season_number,
            year,
        }
    }
}

// ── CatalogAdapter implementation ───────────────────────────────────

#[async_trait]
impl CatalogAdapter for Soap4meClient {
    fn name(&self) -> &'static str {
        "soap4me"
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<ShowCandidate>, CatalogError> {
        let result: SearchResult = self.get("search/", &[("q", query)]).await?;
        let shows: Vec<ShowItem> = result.series.into_iter().take(self.max_results).collect();

        debug!(query, shows = shows.len(), "Soap4me search complete, expanding seasons");

        let episode_lists = try_join_all(shows.iter().map(|show| self.episodes(&show.sid))).await?;

        let mut candidates = Vec::new();
        for (show, episodes) in shows.iter().zip(episode_lists) {
            let seasons: BTreeSet<i32> = episodes
                .iter()
                .filter_map(|ep| as_code(&ep.season))
                .filter_map(|s| i32::try_from(s).ok())
                .collect();
            candidates.extend(seasons.into_iter().map(|season| show.candidate(season)));
        }

        Ok(candidates)
    }

    async fn season_links(
        &self,
        show_id: &str,
        season: Option<i32>,
    ) -> Result<SeasonListing, CatalogError> {
        let season = season.ok_or_else(|| {
            CatalogError::InvalidData("soap4me listings need a season number".to_string())
        })?;

        let (show, episodes) =
            futures::try_join!(self.description(show_id), self.episodes(show_id))?;

        let mut entries = Vec::new();
        for episode in episodes
            .iter()
            .filter(|ep| as_code(&ep.season) == Some(i64::from(season)))
        {
            let Some(number) = as_code(&episode.episode) else {
                continue;
            };
            for file in &episode.files {
                entries.push(SeasonEntry {
                    label: number.to_string(),
                    link: self.to_link(show_id, file),
                });
            }
        }

        Ok(SeasonListing {
            show: show.candidate(season),
            entries,
        })
    }
}
