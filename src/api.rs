// API client module: a small blocking GraphQL client for AniList. It only
// knows the two operations this tool needs, the list collection query and
// the delete mutation. Response classification is kept in free functions
// so it can be tested without a network.

use crate::model::{DeleteOutcome, Entry, MediaList, MediaType};
use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Public AniList GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://graphql.anilist.co";

/// Environment variable that overrides [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "ANILIST_API_URL";

const LIST_COLLECTION_QUERY: &str = r#"
query ($userName: String, $type: MediaType) {
  MediaListCollection(userName: $userName, type: $type) {
    lists {
      name
      entries {
        id
        media {
          title {
            romaji
            english
          }
        }
      }
    }
  }
}
"#;

const DELETE_ENTRY_MUTATION: &str = r#"
mutation ($id: Int) {
  DeleteMediaListEntry(id: $id) {
    deleted
  }
}
"#;

/// The operations the purge flow needs from the remote service.
pub trait MediaListApi {
    /// Fetch every list of `media_type` for `user_name`. Any failure is fatal.
    fn fetch_lists(&self, user_name: &str, media_type: MediaType) -> Result<Vec<MediaList>>;

    /// Issue one delete mutation. `Err` means the request never produced
    /// a response (transport failure).
    fn delete_entry(&self, id: i64) -> Result<DeleteOutcome>;
}

/// Failures reported by the API itself, as opposed to transport errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("response contained no data")]
    MissingData,
}

/// Blocking client holding the reqwest client, the endpoint and the
/// bearer token used for every call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
    token: String,
}

#[derive(Serialize, Debug)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize, Debug)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize, Debug)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize, Debug)]
struct CollectionData {
    #[serde(rename = "MediaListCollection")]
    collection: Option<CollectionDto>,
}

#[derive(Deserialize, Debug)]
struct CollectionDto {
    lists: Option<Vec<Option<ListDto>>>,
}

#[derive(Deserialize, Debug)]
struct ListDto {
    name: Option<String>,
    entries: Option<Vec<Option<EntryDto>>>,
}

#[derive(Deserialize, Debug)]
struct EntryDto {
    id: i64,
    media: Option<MediaDto>,
}

#[derive(Deserialize, Debug)]
struct MediaDto {
    title: Option<TitleDto>,
}

#[derive(Deserialize, Debug)]
struct TitleDto {
    romaji: Option<String>,
    english: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DeleteData {
    #[serde(rename = "DeleteMediaListEntry")]
    result: Option<DeletedDto>,
}

#[derive(Deserialize, Debug)]
struct DeletedDto {
    deleted: Option<bool>,
}

impl ApiClient {
    /// Create a client for `token`, targeting `ANILIST_API_URL` or the
    /// public endpoint.
    pub fn from_env(token: &str) -> Result<Self> {
        let endpoint = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(endpoint, token)
    }

    pub fn new(endpoint: impl Into<String>, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            endpoint: endpoint.into(),
            token: token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut val = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .context("Access token contains characters not allowed in a header")?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn post(&self, query: &str, variables: Value) -> Result<Response> {
        debug!(endpoint = %self.endpoint, %variables, "sending GraphQL request");
        let body = GraphQlRequest { query, variables };
        self.client
            .post(&self.endpoint)
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .context("Failed to send GraphQL request")
    }
}

impl MediaListApi for ApiClient {
    fn fetch_lists(&self, user_name: &str, media_type: MediaType) -> Result<Vec<MediaList>> {
        let res = self.post(
            LIST_COLLECTION_QUERY,
            json!({ "userName": user_name, "type": media_type }),
        )?;
        let status = res.status();
        let body = res.text().context("Failed to read list collection response")?;
        debug!(%status, bytes = body.len(), "list collection response");
        parse_collection(status, &body)
    }

    fn delete_entry(&self, id: i64) -> Result<DeleteOutcome> {
        let res = self.post(DELETE_ENTRY_MUTATION, json!({ "id": id }))?;
        let status = res.status();
        let retry_after = res
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = res.text().context("Failed to read delete response")?;
        debug!(id, %status, "delete response");
        Ok(classify_delete(status, retry_after.as_deref(), &body))
    }
}

/// Turn a list collection response into lists. Non-success statuses and
/// GraphQL errors carry the raw body so it can be shown to the user.
pub fn parse_collection(status: StatusCode, body: &str) -> Result<Vec<MediaList>> {
    if !status.is_success() {
        return Err(ApiError::Status {
            status,
            body: body.to_string(),
        }
        .into());
    }
    let resp: GraphQlResponse<CollectionData> =
        serde_json::from_str(body).context("Parsing list collection response json")?;
    if resp.errors.as_ref().is_some_and(|e| !e.is_empty()) {
        return Err(ApiError::GraphQl(body.to_string()).into());
    }
    let collection = resp
        .data
        .and_then(|d| d.collection)
        .ok_or(ApiError::MissingData)?;

    let lists = collection
        .lists
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|l| MediaList {
            name: l.name.unwrap_or_default(),
            entries: l
                .entries
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .map(|e| {
                    let (romaji, english) = match e.media.and_then(|m| m.title) {
                        Some(t) => (t.romaji, t.english),
                        None => (None, None),
                    };
                    Entry::new(e.id, romaji, english)
                })
                .collect(),
        })
        .collect();
    Ok(lists)
}

/// Classify the response to a delete mutation.
pub fn classify_delete(status: StatusCode, retry_after: Option<&str>, body: &str) -> DeleteOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return DeleteOutcome::RateLimited {
            retry_after: retry_after.and_then(parse_retry_after),
        };
    }
    if !status.is_success() {
        return DeleteOutcome::Failed(format!("HTTP {}: {}", status, body.trim()));
    }
    let resp: GraphQlResponse<DeleteData> = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return DeleteOutcome::Failed(format!("malformed response: {}", e)),
    };
    if let Some(errors) = resp.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return DeleteOutcome::Failed(messages.join("; "));
    }
    match resp.data.and_then(|d| d.result).and_then(|r| r.deleted) {
        Some(true) => DeleteOutcome::Deleted,
        Some(false) => DeleteOutcome::Failed("server reported the entry was not deleted".into()),
        None => {
            debug!(body = body.trim(), "delete response without a result");
            DeleteOutcome::Failed("response did not confirm the deletion".into())
        }
    }
}

/// `Retry-After` in whole seconds. HTTP-date values are not supported.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
