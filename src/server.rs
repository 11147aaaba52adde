//! MCP Server
//!
//! Registers the OpenCTI tools with an MCP runtime. Each tool takes plain
//! parameters and answers with text: rendered JSON or an error description.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::tools::OpenCtiTools;

const INSTRUCTIONS: &str = "Threat intelligence from OpenCTI. Use search_threats for free-text \
lookups, the search_* tools for exact names or values, and get_entity_by_id to expand a result.";

// ============================================================
// Tool Parameters
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchThreatsParams {
    /// Search term (e.g. "Emotet", "CVE-2023-1234", "192.168.1.1")
    pub keyword: String,
    /// Maximum number of results (default 5)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListIndicatorsParams {
    /// Number of indicators to return (default 10)
    #[serde(default)]
    pub limit: Option<u32>,
    /// Only return this pattern type (e.g. "stix", "pcre", "sigma", "snort")
    #[serde(default)]
    pub pattern_type: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportsParams {
    /// Number of reports to return (default 5)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntityParams {
    /// OpenCTI ID of the entity (e.g. "malware--<uuid>")
    pub entity_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MalwareParams {
    /// Exact malware name (e.g. "Emotet")
    pub name: String,
    /// Maximum number of results (default 10)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ThreatActorParams {
    /// Exact threat actor name (e.g. "APT29")
    pub name: String,
    /// Maximum number of results (default 10)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VulnerabilityParams {
    /// CVE identifier (e.g. "CVE-2023-1234")
    pub cve: String,
    /// Maximum number of results (default 10)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ObservableParams {
    /// Exact observable value (IP, domain, hash)
    pub value: String,
    /// Maximum number of results (default 10)
    #[serde(default)]
    pub limit: Option<u32>,
}

// ============================================================
// Server
// ============================================================

/// MCP handler exposing [`OpenCtiTools`]
#[derive(Clone)]
pub struct OpenCtiServer {
    tools: Arc<OpenCtiTools>,
    tool_router: ToolRouter<Self>,
}

fn text(body: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(body)]))
}

#[tool_router]
impl OpenCtiServer {
    pub fn new(tools: OpenCtiTools) -> Self {
        Self {
            tools: Arc::new(tools),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Search OpenCTI for threats, observables or entities by keyword. Useful to find malware, threat actors or specific CVEs."
    )]
    async fn search_threats(
        &self,
        Parameters(params): Parameters<SearchThreatsParams>,
    ) -> Result<CallToolResult, McpError> {
        text(self.tools.search_threats(&params.keyword, params.limit).await)
    }

    #[tool(description = "List the latest indicators of compromise (IOCs) recorded in OpenCTI.")]
    async fn list_latest_indicators(
        &self,
        Parameters(params): Parameters<ListIndicatorsParams>,
    ) -> Result<CallToolResult, McpError> {
        text(
            self.tools
                .list_latest_indicators(params.limit, params.pattern_type.as_deref())
                .await,
        )
    }

    #[tool(
        description = "Get the most recently published intelligence reports. Useful for strategic context or campaign summaries."
    )]
    async fn get_intelligence_reports(
        &self,
        Parameters(params): Parameters<ReportsParams>,
    ) -> Result<CallToolResult, McpError> {
        text(self.tools.get_intelligence_reports(params.limit).await)
    }

    #[tool(description = "Get every available detail of one OpenCTI entity by its ID.")]
    async fn get_entity_by_id(
        &self,
        Parameters(params): Parameters<EntityParams>,
    ) -> Result<CallToolResult, McpError> {
        text(self.tools.get_entity_by_id(&params.entity_id).await)
    }

    #[tool(description = "Find malware by exact name (e.g. \"Emotet\").")]
    async fn search_malware(
        &self,
        Parameters(params): Parameters<MalwareParams>,
    ) -> Result<CallToolResult, McpError> {
        text(self.tools.search_malware(&params.name, params.limit).await)
    }

    #[tool(description = "Find threat actors by exact name (e.g. \"APT29\").")]
    async fn search_threat_actors(
        &self,
        Parameters(params): Parameters<ThreatActorParams>,
    ) -> Result<CallToolResult, McpError> {
        text(self.tools.search_threat_actors(&params.name, params.limit).await)
    }

    #[tool(description = "Find vulnerabilities by CVE identifier (e.g. \"CVE-2023-1234\").")]
    async fn search_vulnerabilities(
        &self,
        Parameters(params): Parameters<VulnerabilityParams>,
    ) -> Result<CallToolResult, McpError> {
        text(self.tools.search_vulnerabilities(&params.cve, params.limit).await)
    }

    #[tool(description = "Find observables (IPs, domains, hashes) by exact value.")]
    async fn search_observables(
        &self,
        Parameters(params): Parameters<ObservableParams>,
    ) -> Result<CallToolResult, McpError> {
        text(self.tools.search_observables(&params.value, params.limit).await)
    }
}

#[tool_handler]
impl ServerHandler for OpenCtiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}
