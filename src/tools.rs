//! Agent Tools
//!
//! Text-returning wrappers around the query catalog. This is the only place
//! where results and errors become strings; agents never see the bearer
//! token, only rendered JSON or an error description.

use serde::Serialize;
use tracing::{error, warn};

use crate::client::OpenCtiClient;
use crate::error::OpenCtiError;

pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const DEFAULT_INDICATOR_LIMIT: u32 = 10;
pub const DEFAULT_REPORT_LIMIT: u32 = 5;
pub const DEFAULT_LOOKUP_LIMIT: u32 = 10;

/// Threat intelligence tools backed by one OpenCTI client.
///
/// When the client could not be configured the tools still exist and answer
/// every call with the configuration error.
#[derive(Debug)]
pub struct OpenCtiTools {
    client: Result<OpenCtiClient, String>,
}

impl OpenCtiTools {
    pub fn new(client: OpenCtiClient) -> Self {
        Self { client: Ok(client) }
    }

    /// Tools whose client failed to build; `err` is reported on every call
    pub fn unconfigured(err: &OpenCtiError) -> Self {
        warn!(error = %err, "OpenCTI client is not configured");
        Self {
            client: Err(err.to_string()),
        }
    }

    /// Wrap the outcome of building a client, falling back to [`Self::unconfigured`]
    pub fn from_result(client: Result<OpenCtiClient, OpenCtiError>) -> Self {
        match client {
            Ok(client) => Self::new(client),
            Err(e) => Self::unconfigured(&e),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_ok()
    }

    fn client(&self) -> Result<&OpenCtiClient, String> {
        self.client
            .as_ref()
            .map_err(|reason| format!("Error: OpenCTI client is not configured correctly ({}).", reason))
    }

    /// Search threats, observables or entities by keyword
    pub async fn search_threats(&self, keyword: &str, limit: Option<u32>) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        match client
            .search_knowledge(keyword, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
        {
            Ok(results) if results.is_empty() => no_results(keyword),
            Ok(results) => render(&results),
            Err(e) => failure("Error searching OpenCTI", &e),
        }
    }

    /// Latest indicators of compromise, optionally by pattern type
    pub async fn list_latest_indicators(
        &self,
        limit: Option<u32>,
        pattern_type: Option<&str>,
    ) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        match client
            .get_indicators(limit.unwrap_or(DEFAULT_INDICATOR_LIMIT), pattern_type)
            .await
        {
            Ok(indicators) => render(&indicators),
            Err(e) => failure("Error retrieving indicators", &e),
        }
    }

    /// Most recent intelligence reports
    pub async fn get_intelligence_reports(&self, limit: Option<u32>) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        match client
            .get_reports(limit.unwrap_or(DEFAULT_REPORT_LIMIT))
            .await
        {
            Ok(reports) => render(&reports),
            Err(e) => failure("Error retrieving reports", &e),
        }
    }

    /// Every detail OpenCTI holds for one entity ID
    pub async fn get_entity_by_id(&self, entity_id: &str) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        match client.get_entity_details(entity_id).await {
            Ok(entity) if entity.is_empty() => format!("No entity found with ID '{}'.", entity_id),
            Ok(entity) => render(&entity),
            Err(e) => failure("Error retrieving entity details", &e),
        }
    }

    pub async fn search_malware(&self, name: &str, limit: Option<u32>) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        let result = client
            .search_malware(name, limit.unwrap_or(DEFAULT_LOOKUP_LIMIT))
            .await;
        render_lookup(name, result, "Error searching malware")
    }

    pub async fn search_threat_actors(&self, name: &str, limit: Option<u32>) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        let result = client
            .search_threat_actors(name, limit.unwrap_or(DEFAULT_LOOKUP_LIMIT))
            .await;
        render_lookup(name, result, "Error searching threat actors")
    }

    pub async fn search_vulnerabilities(&self, cve: &str, limit: Option<u32>) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        let result = client
            .search_vulnerabilities(cve, limit.unwrap_or(DEFAULT_LOOKUP_LIMIT))
            .await;
        render_lookup(cve, result, "Error searching vulnerabilities")
    }

    pub async fn search_observables(&self, value: &str, limit: Option<u32>) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(message) => return message,
        };

        let result = client
            .search_observables(value, limit.unwrap_or(DEFAULT_LOOKUP_LIMIT))
            .await;
        render_lookup(value, result, "Error searching observables")
    }
}

// ============================================================
// Rendering
// ============================================================

fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("Error rendering OpenCTI result: {}", e))
}

fn no_results(term: &str) -> String {
    format!("No results found for '{}'.", term)
}

fn failure(prefix: &str, err: &OpenCtiError) -> String {
    error!(error = %err, "{}", prefix);
    format!("{}: {}", prefix, err)
}

fn render_lookup<T: Serialize>(
    term: &str,
    result: Result<Vec<T>, OpenCtiError>,
    prefix: &str,
) -> String {
    match result {
        Ok(records) if records.is_empty() => no_results(term),
        Ok(records) => render(&records),
        Err(e) => failure(prefix, &e),
    }
}
