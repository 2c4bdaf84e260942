//! Episode pipeline: one inbound message in, zero or more replies out.
//!
//! Text goes through the classifier, then either straight to the link
//! aggregator (direct identifiers) or through the show resolver first.
//! Button payloads skip both and decode into aggregator arguments.
//! Every failure ends in a log line plus "Not found"; nothing here panics
//! on user input.

pub mod render;

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::aggregator::{AggregateError, LinkAggregator};
use crate::bus::events::{InboundKind, InboundMessage, Reply};
use crate::catalog::CatalogAdapter;
use crate::intent::{Intent, IntentClassifier};
use crate::resolver::ShowResolver;
use crate::token::InteractionToken;

pub struct EpisodePipeline {
    catalog: Arc<dyn CatalogAdapter>,
    classifier: IntentClassifier,
    resolver: ShowResolver,
    aggregator: LinkAggregator,
}

impl EpisodePipeline {
    pub fn new(catalog: Arc<dyn CatalogAdapter>) -> Result<Self, regex::Error> {
        Ok(Self {
            classifier: IntentClassifier::new(catalog.supports_episode_lookup())?,
            resolver: ShowResolver::new(Arc::clone(&catalog)),
            aggregator: LinkAggregator::new(Arc::clone(&catalog)),
            catalog,
        })
    }

    /// Whether `msg` will lead to a catalog request. Used to decide on a
    /// typing indicator before the work starts.
    pub fn accepts(&self, msg: &InboundMessage) -> bool {
        match msg.kind {
            InboundKind::Text => self.classifier.matches(&msg.content),
            InboundKind::Callback => true,
        }
    }

    pub async fn handle(&self, msg: &InboundMessage) -> Vec<Reply> {
        match msg.kind {
            InboundKind::Text => self.handle_text(&msg.content).await,
            InboundKind::Callback => self.handle_callback(&msg.content).await,
        }
    }

    async fn handle_text(&self, text: &str) -> Vec<Reply> {
        let Some(classified) = self.classifier.classify(text) else {
            return Vec::new();
        };

        match classified.intent {
            Intent::Direct { show_id, episode } => self.send_episode(&show_id, None, episode).await,
            Intent::Search {
                query,
                season,
                episode,
            } => self.search(&query, season, episode).await,
            Intent::Permalink { episode_id } => self.permalink(episode_id).await,
        }
    }

    async fn handle_callback(&self, payload: &str) -> Vec<Reply> {
        let token = match InteractionToken::decode(payload) {
            Ok(token) => token,
            Err(e) => {
                warn!(payload, error = %e, "Ignoring invalid button payload");
                return Vec::new();
            }
        };

        info!(
            verb = token.verb.as_str(),
            show_id = %token.show_id,
            season = token.season,
            episode = token.episode,
            "Button pressed"
        );

        self.send_episode(&token.show_id, Some(token.season), token.episode)
            .await
    }

    async fn search(&self, query: &str, season: i32, episode: i32) -> Vec<Reply> {
        let candidates = match self.resolver.resolve(query, season).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(query, error = %e, "Show search failed");
                return vec![render::not_found()];
            }
        };

        match candidates.as_slice() {
            [] => {
                info!(query, season, "No matching show");
                vec![render::not_found()]
            }
            [show] => {
                self.send_episode(&show.catalog_id, Some(season), episode)
                    .await
            }
            many => vec![render::selection(many, episode)],
        }
    }

    async fn permalink(&self, episode_id: u64) -> Vec<Reply> {
        match self.catalog.episode_by_global_id(episode_id).await {
            Ok(Some(found)) => {
                info!(
                    episode_id,
                    show = %found.show_name,
                    season = found.season,
                    episode = found.episode,
                    "Resolved permalink"
                );
                self.search(&found.show_name, found.season, found.episode)
                    .await
            }
            Ok(None) => {
                info!(episode_id, "Unknown episode permalink");
                vec![render::not_found()]
            }
            Err(e) => {
                error!(episode_id, error = %e, "Episode lookup failed");
                vec![render::not_found()]
            }
        }
    }

    async fn send_episode(&self, show_id: &str, season: Option<i32>, episode: i32) -> Vec<Reply> {
        match self.aggregator.resolve_episode(show_id, season, episode).await {
            Ok(resolved) => vec![render::episode(&resolved)],
            Err(AggregateError::NotFound { .. }) => {
                info!(show_id, ?season, episode, "Episode not found");
                vec![render::not_found()]
            }
            Err(AggregateError::Backend(e)) => {
                error!(show_id, ?season, episode, error = %e, "Season listing failed");
                vec![render::not_found()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::events::TextFormat;
    use crate::catalog::fake::{candidate, entry, FakeCatalog};
    use crate::catalog::{EpisodeRef, SeasonListing, TranslationTrack};

    fn listing(id: &str, name: &str, season: i32, episodes: i32) -> SeasonListing {
        let mut entries = Vec::new();
        for n in 1..=episodes {
            entries.push(entry(n, TranslationTrack::Original, &format!("http://{id}/{n}/orig")));
            entries.push(entry(n, TranslationTrack::Localized, &format!("http://{id}/{n}/loc")));
        }
        SeasonListing {
            show: candidate(id, name, season),
            entries,
        }
    }

    fn pipeline(catalog: &Arc<FakeCatalog>) -> EpisodePipeline {
        let catalog: Arc<dyn CatalogAdapter> = Arc::clone(catalog) as Arc<dyn CatalogAdapter>;
        EpisodePipeline::new(catalog).unwrap()
    }

    async fn text(pipeline: &EpisodePipeline, content: &str) -> Vec<Reply> {
        pipeline.handle(&InboundMessage::cli(content)).await
    }

    async fn press(pipeline: &EpisodePipeline, payload: &str) -> Vec<Reply> {
        pipeline.handle(&InboundMessage::cli_callback(payload)).await
    }

    #[tokio::test]
    async fn test_search_to_episode() {
        let catalog = Arc::new(
            FakeCatalog::new()
                .with_candidate(candidate("1234", "Breaking Bad", 2))
                .with_candidate(candidate("1233", "Breaking Bad", 1))
                .with_listing(listing("1234", "Breaking Bad", 2, 6)),
        );
        let replies = text(&pipeline(&catalog), "Breaking Bad: 2: 5").await;

        assert_eq!(catalog.calls(), vec![("1234".to_string(), Some(2))]);
        assert_eq!(replies.len(), 1);
        let reply = &replies[0];
        assert_eq!(reply.format, TextFormat::Html);
        let lines: Vec<&str> = reply.content.split("\n\n").collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("http://1234/5/orig"));
        assert!(lines[1].contains("http://1234/5/loc"));
        assert_eq!(reply.buttons[0].data, "Next:1234:2:6");
    }

    #[tokio::test]
    async fn test_disambiguation_then_press() {
        let catalog = Arc::new(
            FakeCatalog::new()
                .with_candidate(candidate("11", "Shameless", 3))
                .with_candidate(candidate("12", "Shameless US", 3))
                .with_listing(listing("11", "Shameless", 3, 4))
                .with_listing(listing("12", "Shameless US", 3, 4)),
        );
        let pipeline = pipeline(&catalog);

        let replies = text(&pipeline, "shameles 3 4").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].content, "Select tv show");
        assert_eq!(replies[0].buttons.len(), 2);
        assert!(catalog.calls().is_empty());

        let second = replies[0].buttons[1].data.clone();
        let replies = press(&pipeline, &second).await;
        assert_eq!(catalog.calls(), vec![("12".to_string(), Some(3))]);
        assert!(replies[0].content.starts_with("Shameless US 2010 s03e04"));
    }

    #[tokio::test]
    async fn test_next_past_last_episode() {
        let catalog = Arc::new(FakeCatalog::new().with_listing(listing("7", "showX", 1, 3)));
        let pipeline = pipeline(&catalog);

        let replies = press(&pipeline, "SendById:7:1:3").await;
        let next = replies[0].buttons[0].data.clone();
        assert_eq!(next, "Next:7:1:4");

        let replies = press(&pipeline, &next).await;
        assert_eq!(replies, vec![Reply::plain("Not found")]);
    }

    #[tokio::test]
    async fn test_direct_id_has_no_season() {
        let catalog = Arc::new(FakeCatalog::new().with_listing(listing("4321", "Lost", 2, 3)));
        let replies = text(&pipeline(&catalog), "id4321 2").await;

        assert_eq!(catalog.calls(), vec![("4321".to_string(), None)]);
        assert!(replies[0].content.starts_with("Lost 2010 s02e02"));
    }

    #[tokio::test]
    async fn test_unmatched_text_and_bad_token_are_silent() {
        let catalog = Arc::new(FakeCatalog::new());
        let pipeline = pipeline(&catalog);

        assert!(!pipeline.accepts(&InboundMessage::cli("hello")));
        assert!(text(&pipeline, "hello").await.is_empty());
        assert!(press(&pipeline, "SendById:7:one:3").await.is_empty());
        assert!(press(&pipeline, "Play:7:1:3").await.is_empty());
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_candidates_and_backend_failure() {
        let catalog = Arc::new(FakeCatalog::new());
        let replies = text(&pipeline(&catalog), "Nothing 1 1").await;
        assert_eq!(replies, vec![Reply::plain("Not found")]);

        let catalog = Arc::new(FakeCatalog::new().failing());
        let pipeline = pipeline(&catalog);
        assert_eq!(text(&pipeline, "Lost 1 1").await, vec![Reply::plain("Not found")]);
        assert_eq!(press(&pipeline, "Next:1:1:1").await, vec![Reply::plain("Not found")]);
    }

    #[tokio::test]
    async fn test_permalink_goes_through_search() {
        let catalog = Arc::new(
            FakeCatalog::new()
                .with_candidate(candidate("55", "Fargo", 3))
                .with_listing(listing("55", "Fargo", 3, 8))
                .with_episode(
                    900,
                    EpisodeRef {
                        show_name: "Fargo".into(),
                        season: 3,
                        episode: 7,
                    },
                ),
        );
        let pipeline = pipeline(&catalog);

        let replies = text(&pipeline, "https://myshows.me/view/episode/900/").await;
        assert_eq!(catalog.calls(), vec![("55".to_string(), Some(3))]);
        assert!(replies[0].content.starts_with("Fargo 2010 s03e07"));

        let replies = text(&pipeline, "https://myshows.me/view/episode/901/").await;
        assert_eq!(replies, vec![Reply::plain("Not found")]);
    }
}
