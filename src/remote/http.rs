//! HTTP remote - maps the CRUD collaborator onto a JSON REST resource.
//!
//! Requires the `http` feature. Uses reqwest.
//!
//! ## Routes
//!
//! - `GET {base}/{collection}`: list
//! - `POST {base}/{collection}`: create, body = payload
//! - `PUT {base}/{collection}/{id}`: update, body = payload
//! - `DELETE {base}/{collection}/{id}`: delete
//!
//! ## Example
//!
//! ```ignore
//! use optimistic_cache::{Collection, HttpRemote, Todo};
//!
//! let todos = Collection::new(HttpRemote::<Todo>::jsonplaceholder()?);
//! todos.refetch().await?;
//! ```

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::HttpRemoteConfig;
use super::{Remote, RemoteError};
use crate::entity::{Entity, Payload};

/// REST-over-HTTP remote for one entity collection.
pub struct HttpRemote<E> {
    client: Client,
    config: HttpRemoteConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for HttpRemote<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> HttpRemote<E> {
    pub fn new(config: HttpRemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Use an existing client (shared connection pool, custom middleware).
    /// `config.timeout` and `config.user_agent` are not applied to it.
    pub fn with_client(client: Client, config: HttpRemoteConfig) -> Self {
        Self {
            client,
            config,
            _entity: PhantomData,
        }
    }

    /// Remote for the public JSONPlaceholder mock API.
    pub fn jsonplaceholder() -> Result<Self, RemoteError> {
        Self::new(HttpRemoteConfig::default())
    }

    pub fn config(&self) -> &HttpRemoteConfig {
        &self.config
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            E::COLLECTION
        )
    }

    fn entity_url(&self, id: &E::Id) -> String {
        format!("{}/{}", self.collection_url(), id)
    }
}

#[async_trait]
impl<E: Entity> Remote<E> for HttpRemote<E> {
    async fn list(&self) -> Result<Vec<E>, RemoteError> {
        let url = self.collection_url();
        tracing::trace!(%url, "GET");
        let response = self.client.get(&url).send().await.map_err(transport)?;
        decode(response).await
    }

    async fn create(&self, payload: &Payload) -> Result<E, RemoteError> {
        let url = self.collection_url();
        tracing::trace!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn update(&self, id: &E::Id, payload: &Payload) -> Result<E, RemoteError> {
        let url = self.entity_url(id);
        tracing::trace!(%url, "PUT");
        let response = self
            .client
            .put(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn delete(&self, id: &E::Id) -> Result<(), RemoteError> {
        let url = self.entity_url(id);
        tracing::trace!(%url, "DELETE");
        let response = self.client.delete(&url).send().await.map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(RemoteError::from)
}

async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        message: extract_message(&body),
    })
}

/// Pull a human-readable message out of an error body:
/// `{"message": "..."}` or `{"error": "..."}`.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}
