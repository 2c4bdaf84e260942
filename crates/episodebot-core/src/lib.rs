//! episodebot-core: the building blocks of a chat bot that finds download
//! links for TV show episodes.
//!
//! - [`config`]: typed configuration loading from JSON
//! - [`catalog`]: catalog adapter trait and the seasonvar, soap4me and myshows backends
//! - [`intent`]: ordered strategies that turn free text into an intent
//! - [`resolver`]: show name to catalog candidates
//! - [`aggregator`]: season listing to one episode's links
//! - [`token`]: button payloads carrying show, season and episode
//! - [`pipeline`]: wires the above together and renders replies
//! - [`bus`] and [`gateway`]: message plumbing between chat transports and the pipeline
//!
//! # Quick Start
//!
//! ```no_run
//! use episodebot_core::bus::events::InboundMessage;
//! use episodebot_core::catalog;
//! use episodebot_core::config::Config;
//! use episodebot_core::pipeline::EpisodePipeline;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let client = config.http.build_client()?;
//! let pipeline = EpisodePipeline::new(catalog::build(&config.catalog, client))?;
//!
//! for reply in pipeline.handle(&InboundMessage::cli("Breaking Bad: 2: 5")).await {
//!     println!("{}", reply.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod bus;
pub mod catalog;
pub mod config;
pub mod gateway;
pub mod intent;
pub mod pipeline;
pub mod resolver;
pub mod token;
