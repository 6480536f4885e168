//! Fetch transport: request payload, response shapes and the HTTP client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use url::Url;

use crate::Row;
use crate::config::SortOrder;
use crate::error::ProtocolError;
use crate::error::TransportError;

/// Body of a fetch request.
///
/// Serialized with camelCase keys. `timestamp` is the table's anchor epoch,
/// which stays the same for the table's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub fixed: bool,
    pub page: usize,
    pub size: usize,
    pub order_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: String,
    pub timestamp: u64,
}

impl FetchRequest {
    /// Serializes the request and merges extra payload into it.
    ///
    /// Keys from `post_data` override the request fields, and keys from
    /// `extra` override both.
    pub fn into_body(self, post_data: &Map<String, Value>, extra: Option<&Map<String, Value>>) -> Value {
        let mut body = match serde_json::to_value(&self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in post_data.iter().chain(extra.into_iter().flatten()) {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

/// A successfully decoded fetch response.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPayload {
    /// A bare array: the whole collection.
    Collection(Vec<Row>),
    /// A paginated catalog: one page of rows plus the total count.
    Envelope {
        subset: Vec<Row>,
        total: usize,
        search: Option<String>,
    },
}

impl FetchPayload {
    /// Decodes a response body.
    ///
    /// An array must hold only objects. An object must carry a `subset` array
    /// and a non-negative integer `total`; a non-string `search` is ignored.
    pub fn from_json(value: Value) -> Result<Self, ProtocolError> {
        match value {
            Value::Array(items) => Ok(FetchPayload::Collection(into_rows(items)?)),
            Value::Object(mut map) => {
                let subset = match map.remove("subset") {
                    Some(Value::Array(items)) => into_rows(items)?,
                    _ => return Err(ProtocolError::NotACatalog),
                };
                let total = map
                    .get("total")
                    .and_then(Value::as_u64)
                    .and_then(|t| usize::try_from(t).ok())
                    .ok_or(ProtocolError::MissingTotal)?;
                let search = match map.remove("search") {
                    Some(Value::String(s)) => Some(s),
                    _ => None,
                };
                Ok(FetchPayload::Envelope {
                    subset,
                    total,
                    search,
                })
            }
            _ => Err(ProtocolError::NotACatalog),
        }
    }

    /// Number of rows carried by this payload.
    pub fn len(&self) -> usize {
        match self {
            FetchPayload::Collection(rows) => rows.len(),
            FetchPayload::Envelope { subset, .. } => subset.len(),
        }
    }

    /// Returns `true` if the payload carries no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn into_rows(items: Vec<Value>) -> Result<Vec<Row>, ProtocolError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(ProtocolError::InvalidRow { index }),
        })
        .collect()
}

/// Posts fetch requests for a table.
///
/// The table awaits exactly one call per fetch and never cancels it; a late
/// answer to an older request is simply discarded.
#[async_trait]
pub trait FetchTransport: Send + Sync {
    /// Posts `body` to `url` and returns the decoded JSON response.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: FetchTransport + ?Sized> FetchTransport for Arc<T> {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        (**self).post_json(url, body).await
    }
}

/// Default transport: `POST` with a JSON body over reqwest.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use kingtable_lib::transport::HttpTransport;
///
/// let transport = HttpTransport::new()
///     .with_base_url("https://example.com/app/".parse().unwrap())
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
    timeout: Option<Duration>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with a default reqwest client.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: None,
            timeout: None,
        }
    }

    /// Sets the URL that relative fetch endpoints are resolved against.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| TransportError::parse(format!("invalid fetch url '{}': {}", url, e)))
    }
}

#[async_trait]
impl FetchTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.resolve(url)?;
        log::trace!("POST {} {}", url, body);

        let mut request = self.client.post(url).json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_reqwest(e))?;

        if !status.is_success() {
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            return Err(TransportError::http(status.as_u16(), message));
        }

        serde_json::from_str(&text).map_err(|e| TransportError::parse_with_body(e.to_string(), text))
    }
}

impl HttpTransport {
    fn map_reqwest(&self, error: reqwest::Error) -> TransportError {
        match self.timeout {
            Some(timeout) if error.is_timeout() => TransportError::Timeout(timeout),
            _ => TransportError::Network(error),
        }
    }
}
