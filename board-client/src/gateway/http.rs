//! PostgREST gateway.
//!
//! Talks to a PostgREST endpoint (for example a Supabase project) exposing
//! two tables:
//!
//! ```text
//! lists(id, title, sort_order, created_at)
//! cards(id, title, list_id, sort_order, created_at)
//! ```
//!
//! Writes ask for `Prefer: return=representation`, so the response body is
//! an array holding the stored row. An empty array maps to `Ok(None)`.

use async_trait::async_trait;
use board_types::{CardId, CardRecord, CardUpdate, GatewayError, ListRecord, NewCard, NewList};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::RemoteGateway;

/// Path prefix of the REST API.
const REST_PREFIX: &str = "rest/v1";

/// Gateway to a PostgREST backend.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

// Custom Debug to avoid exposing the api key
impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpGateway {
    /// Create a gateway for the project at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    /// Create a gateway reusing an existing HTTP client.
    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// The project URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{REST_PREFIX}/{table}", self.base_url);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn select_ordered(&self, table: &str) -> RequestBuilder {
        self.request(Method::GET, table)
            .query(&[("select", "*"), ("order", "sort_order.asc")])
    }

    fn write(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", "return=representation")
    }
}

/// Send a request and fail on transport errors or non-2xx statuses.
async fn send(request: RequestBuilder) -> Result<Response, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::Request(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(body));
    }
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>, GatewayError> {
    send(request)
        .await?
        .json::<Vec<T>>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

async fn first_row<T: DeserializeOwned>(request: RequestBuilder) -> Result<Option<T>, GatewayError> {
    Ok(rows(request).await?.into_iter().next())
}

fn id_filter(card_id: &CardId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{card_id}"))]
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn load_lists(&self) -> Result<Vec<ListRecord>, GatewayError> {
        let lists: Vec<ListRecord> = rows(self.select_ordered("lists")).await?;
        debug!(count = lists.len(), "loaded lists");
        Ok(lists)
    }

    async fn load_cards(&self) -> Result<Vec<CardRecord>, GatewayError> {
        let cards: Vec<CardRecord> = rows(self.select_ordered("cards")).await?;
        debug!(count = cards.len(), "loaded cards");
        Ok(cards)
    }

    async fn create_list(&self, list: NewList) -> Result<Option<ListRecord>, GatewayError> {
        first_row(self.write(Method::POST, "lists").json(&list)).await
    }

    async fn create_card(&self, card: NewCard) -> Result<Option<CardRecord>, GatewayError> {
        first_row(self.write(Method::POST, "cards").json(&card)).await
    }

    async fn update_card(&self, update: CardUpdate) -> Result<Option<CardRecord>, GatewayError> {
        // The id addresses the row; only the changed columns go in the body.
        let mut body = serde_json::to_value(&update).map_err(|e| GatewayError::Encode(e.to_string()))?;
        if let Some(fields) = body.as_object_mut() {
            fields.remove("id");
        }
        let request = self
            .write(Method::PATCH, "cards")
            .query(&id_filter(&update.id))
            .json(&body);
        first_row(request).await
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<(), GatewayError> {
        send(self.request(Method::DELETE, "cards").query(&id_filter(card_id))).await?;
        Ok(())
    }
}
