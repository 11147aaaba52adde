//! OpenCTI GraphQL Client
//!
//! Sends a query document with its variables to the OpenCTI GraphQL endpoint
//! and unwraps the response envelope. Failures are sorted into the variants
//! of [`OpenCtiError`].

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::OpenCtiConfig;
use crate::error::{OpenCtiError, Result};

/// A JSON object as returned by OpenCTI (one entity, or the `data` section)
pub type Record = Map<String, Value>;

/// OpenCTI GraphQL client
#[derive(Debug)]
pub struct OpenCtiClient {
    client: Client,
    config: OpenCtiConfig,
}

// ============================================================
// GraphQL Envelope Types
// ============================================================

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Record,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

/// The text of one GraphQL error entry.
///
/// Bare strings are used as-is, objects contribute their string `message`,
/// anything else keeps its raw JSON.
fn error_message(entry: Value) -> String {
    match entry {
        Value::String(message) => message,
        Value::Object(ref fields) => match fields.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => entry.to_string(),
        },
        other => other.to_string(),
    }
}

// ============================================================
// Client Implementation
// ============================================================

impl OpenCtiClient {
    /// Create a client from validated settings.
    ///
    /// # Errors
    /// Returns `OpenCtiError::Configuration` if the token cannot be used as a
    /// header value or the HTTP client cannot be built.
    pub fn new(config: OpenCtiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("opencti-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .default_headers(Self::auth_headers(&config)?)
            .build()
            .map_err(|e| {
                OpenCtiError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        debug!(endpoint = %config.endpoint(), "OpenCTI client initialized");

        Ok(Self { client, config })
    }

    fn auth_headers(config: &OpenCtiConfig) -> Result<HeaderMap> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token()))
            .map_err(|_| {
                OpenCtiError::Configuration("OPENCTI_TOKEN contains invalid characters".into())
            })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Run a GraphQL query and return its `data` section.
    ///
    /// `None` variables are sent as an empty object. A response without
    /// `data` yields an empty record.
    pub async fn execute(&self, query: &str, variables: Option<Record>) -> Result<Record> {
        let variables = variables.unwrap_or_default();
        let request = GraphQlRequest {
            query,
            variables: &variables,
        };

        debug!(endpoint = %self.config.endpoint(), "Sending GraphQL query");

        let body = self
            .client
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let response: GraphQlResponse =
            serde_json::from_str(&body).map_err(|e| OpenCtiError::ResponseFormat(e.to_string()))?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(error_message).collect();
            warn!(count = messages.len(), "OpenCTI returned GraphQL errors");
            return Err(OpenCtiError::RemoteQuery(messages));
        }

        match response.data {
            None | Some(Value::Null) => Ok(Record::new()),
            Some(Value::Object(data)) => Ok(data),
            Some(other) => Err(OpenCtiError::ResponseFormat(format!(
                "`data` is not an object: {}",
                other
            ))),
        }
    }
}

// ============================================================
// Response Accessors
// ============================================================

/// Flatten `data.<field>.edges[*].node` into an ordered list of records.
///
/// A missing connection or `edges` list gives an empty list; edges without
/// an object `node` are skipped.
pub fn connection_nodes(mut data: Record, field: &str) -> Vec<Record> {
    let edges = match data.remove(field) {
        Some(Value::Object(mut connection)) => match connection.remove("edges") {
            Some(Value::Array(edges)) => edges,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    edges
        .into_iter()
        .filter_map(|edge| match edge {
            Value::Object(mut edge) => match edge.remove("node") {
                Some(Value::Object(node)) => Some(node),
                _ => {
                    debug!(field, "Skipping edge without a node");
                    None
                }
            },
            _ => None,
        })
        .collect()
}

/// Take `data.<field>` as a record, or an empty record when absent or `null`
pub fn object_field(mut data: Record, field: &str) -> Record {
    match data.remove(field) {
        Some(Value::Object(record)) => record,
        _ => Record::new(),
    }
}
