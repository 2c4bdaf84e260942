//! MyShows episode lookup over JSON-RPC.
//!
//! MyShows has no download links. It only turns an episode permalink id
//! into a show title plus season and episode numbers, which are then
//! searched for in the link backend.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{CatalogError, EpisodeRef};

const DEFAULT_RPC_URL: &str = "https://api.myshows.me/v2/rpc/";

pub struct MyShowsClient {
    client: Client,
    rpc_url: String,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u32,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeResult {
    show_id: u64,
    season_number: i32,
    episode_number: i32,
}

#[derive(Deserialize)]
struct ShowResult {
    title: String,
}

impl MyShowsClient {
    pub fn new(client: Client, api_base: Option<&str>) -> Self {
        let rpc_url = api_base.unwrap_or(DEFAULT_RPC_URL).to_string();
        debug!(rpc_url = %rpc_url, "Initialized myshows client");
        Self { client, rpc_url }
    }

    /// Call a JSON-RPC method. A missing `result` is `Ok(None)`.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, CatalogError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        debug!(method, "Sending myshows request");

        let response = self.client.post(&self.rpc_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: RpcResponse<T> = serde_json::from_str(&body)?;

        if let Some(err) = parsed.error {
            warn!(method, code = err.code, message = %err.message, "myshows returned an RPC error");
        }

        Ok(parsed.result)
    }

    /// Look up an episode by its global myshows id.
    pub async fn episode_by_id(&self, id: u64) -> Result<Option<EpisodeRef>, CatalogError> {
        let Some(episode) = self
            .call::<EpisodeResult>("shows.Episode", json!({ "id": id }))
            .await?
        else {
            return Ok(None);
        };

        let Some(show) = self
            .call::<ShowResult>(
                "shows.GetById",
                json!({ "showId": episode.show_id, "fetchEpisodes": false }),
            )
            .await?
        else {
            return Ok(None);
        };

        if show.title.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(EpisodeRef {
            show_name: show.title,
            season: episode.season_number,
            episode: episode.episode_number,
        }))
    }
}
