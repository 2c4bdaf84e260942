//! Seasonvar catalog backend.
//!
//! Seasonvar exposes a single form-encoded POST endpoint that dispatches on
//! a `command` field. Catalog ids are per season, so a season listing only
//! needs the id.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{
    CatalogAdapter, CatalogError, Link, SeasonEntry, SeasonListing, ShowCandidate,
    TranslationTrack,
};

const DEFAULT_API_URL: &str = "http://api.seasonvar.ru";

/// Track label used when the playlist entry carries no `perevod`.
const ORIGINAL_LABEL: &str = "Original";

pub struct SeasonvarClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl SeasonvarClient {
    pub fn new(client: Client, api_key: &str, api_base: Option<&str>) -> Self {
        let api_url = api_base
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        debug!(api_url = %api_url, "Initialized seasonvar client");

        Self {
            client,
            api_key: api_key.to_string(),
            api_url,
        }
    }

    async fn command<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let mut form = vec![("key", self.api_key.as_str()), ("command", command)];
        form.extend_from_slice(params);

        debug!(command, "Sending seasonvar request");

        let response = self.client.post(&self.api_url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

// ── Seasonvar API response types ────────────────────────────────────

/// Seasonvar is loose with JSON types; ids and numbers arrive as either.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(i64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }

    fn as_int(&self) -> Option<i32> {
        match self {
            Self::Text(s) => s.trim().parse().ok(),
            Self::Number(n) => i32::try_from(*n).ok(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(untagged)]
enum AlternateNames {
    #[default]
    None,
    Many(Vec<String>),
    One(String),
}

impl AlternateNames {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Many(names) => names,
            Self::One(name) if name.is_empty() => Vec::new(),
            Self::One(name) => vec![name],
        }
    }
}

#[derive(Deserialize)]
struct SearchHit {
    id: Scalar,
    name: String,
    #[serde(default)]
    name_original: Option<String>,
    #[serde(default)]
    name_alternative: AlternateNames,
    #[serde(default)]
    season: Vec<Scalar>,
    #[serde(default)]
    year: Option<Scalar>,
}

#[derive(Deserialize)]
struct SeasonResponse {
    name: String,
    #[serde(default)]
    name_original: Option<String>,
    #[serde(default)]
    name_alternative: AlternateNames,
    #[serde(default)]
    season_number: Option<Scalar>,
    #[serde(default)]
    year: Option<Scalar>,
    #[serde(default)]
    playlist: Vec<PlaylistItem>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    name: String,
    link: String,
    #[serde(default)]
    perevod: Option<String>,
}

impl SearchHit {
    fn into_candidate(self) -> Result<ShowCandidate, CatalogError> {
        let season_number = self
            .season
            .first()
            .and_then(Scalar::as_int)
            .ok_or_else(|| {
                CatalogError::InvalidData(format!("search hit '{}' has no season number", self.name))
            })?;

        Ok(ShowCandidate {
            name: self.name,
            original_name: self.name_original.unwrap_or_default(),
            alternate_names: self.name_alternative.into_vec(),
            catalog_id: self.id.into_string(),
            season_number,
            year: self.year.map(Scalar::into_string).unwrap_or_default(),
        })
    }
}

impl PlaylistItem {
    fn into_entry(self) -> SeasonEntry {
        let label = self
            .perevod
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| ORIGINAL_LABEL.to_string());

        SeasonEntry {
            label: self.name,
            link: Link {
                url: self.link,
                track: TranslationTrack::from_label(&label),
                label,
                quality: None,
            },
        }
    }
}

// ── CatalogAdapter implementation ───────────────────────────────────

#[async_trait]
impl CatalogAdapter for SeasonvarClient {
    fn name(&self) -> &'static str {
        "seasonvar"
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<ShowCandidate>, CatalogError> {
        let hits: Vec<SearchHit> = self.command("search", &[("query", query)]).await?;

        debug!(query, hits = hits.len(), "Seasonvar search complete");

        hits.into_iter().map(SearchHit::into_candidate).collect()
    }

    async fn season_links(
        &self,
        show_id: &str,
        _season: Option<i32>,
    ) -> Result<SeasonListing, CatalogError> {
        let season: SeasonResponse = self
            .command("getSeason", &[("season_id", show_id)])
            .await?;

        let show = ShowCandidate {
            name: season.name,
            original_name: season.name_original.unwrap_or_default(),
            alternate_names: season.name_alternative.into_vec(),
            catalog_id: show_id.to_string(),
            season_number: season
                .season_number
                .as_ref()
                .and_then(Scalar::as_int)
                .unwrap_or(0),
            year: season.year.map(Scalar::into_string).unwrap_or_default(),
        };

        let entries = season
            .playlist
            .into_iter()
            .map(PlaylistItem::into_entry)
            .collect();

        Ok(SeasonListing { show, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_maps_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("command=search"))
            .and(body_string_contains("key=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "1234",
                    "name": "Во все тяжкие",
                    "name_original": "Breaking Bad",
                    "name_alternative": ["BrBa"],
                    "season": ["2"],
                    "year": "2009"
                },
                {
                    "id": 99,
                    "name": "Breaking",
                    "name_original": null,
                    "season": ["1"],
                    "year": "2011"
                }
            ])))
            .mount(&server)
            .await;

        let client = SeasonvarClient::new(Client::new(), "secret", Some(&server.uri()));
        let hits = client.search_by_name("Breaking Bad").await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].catalog_id, "1234");
        assert_eq!(hits[0].season_number, 2);
        assert_eq!(hits[0].display_name(), "Breaking Bad");
        assert_eq!(hits[0].alternate_names, vec!["BrBa".to_string()]);
        assert_eq!(hits[1].catalog_id, "99");
        assert_eq!(hits[1].original_name, "");
        assert!(hits[1].alternate_names.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_hit_without_season() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "1", "name": "Broken", "season": ["x"] }
            ])))
            .mount(&server)
            .await;

        let client = SeasonvarClient::new(Client::new(), "k", Some(&server.uri()));
        let err = client.search_by_name("Broken").await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_season_links_defaults_to_original_track() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("command=getSeason"))
            .and(body_string_contains("season_id=1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Во все тяжкие",
                "name_original": "Breaking Bad",
                "season_number": "2",
                "year": "2009",
                "playlist": [
                    { "name": "5 серия", "link": "http://cdn/5.mp4" },
                    { "name": "5 серия", "link": "http://cdn/5-lf.mp4", "perevod": "LostFilm" },
                    { "name": "6 серия", "link": "http://cdn/6.mp4", "perevod": "Субтитры" }
                ]
            })))
            .mount(&server)
            .await;

        let client = SeasonvarClient::new(Client::new(), "k", Some(&server.uri()));
        let listing = client.season_links("1234", None).await.unwrap();

        assert_eq!(listing.show.catalog_id, "1234");
        assert_eq!(listing.show.season_number, 2);
        assert_eq!(listing.entries.len(), 3);

        let first = &listing.entries[0];
        assert_eq!(first.label, "5 серия");
        assert_eq!(first.link.track, TranslationTrack::Original);
        assert_eq!(first.link.label, "Original");

        assert_eq!(listing.entries[1].link.track, TranslationTrack::Unknown);
        assert_eq!(listing.entries[1].link.label, "LostFilm");
        assert_eq!(listing.entries[2].link.track, TranslationTrack::LocalizedSubtitles);
    }

    #[tokio::test]
    async fn test_http_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = SeasonvarClient::new(Client::new(), "k", Some(&server.uri()));
        let err = client.season_links("1", None).await.unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = SeasonvarClient::new(Client::new(), "k", Some(&server.uri()));
        let err = client.search_by_name("x").await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
