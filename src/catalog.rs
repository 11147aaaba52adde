//! OpenCTI Query Catalog
//!
//! Fixed GraphQL documents for the questions agents ask most: global search,
//! latest indicators, latest reports, entity details and name/value lookups
//! for malware, threat actors, vulnerabilities and observables.
//!
//! Every list operation unwraps the Relay `edges { node }` connection into a
//! plain ordered list of records.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::client::{connection_nodes, object_field, OpenCtiClient, Record};
use crate::error::Result;

// ============================================================
// Query Documents
// ============================================================

pub const GLOBAL_SEARCH_QUERY: &str = r#"
query GlobalSearch($keyword: String!, $first: Int) {
  globalSearch(keyword: $keyword, first: $first) {
    edges {
      node {
        id
        entity_type
        ... on StixDomainObject {
          created_at
          name
          description
        }
        ... on StixCyberObservable {
          observable_value
        }
      }
    }
  }
}
"#;

pub const INDICATORS_QUERY: &str = r#"
query GetIndicators($first: Int, $filters: [IndicatorFiltering!]) {
  indicators(first: $first, filters: $filters) {
    edges {
      node {
        id
        name
        pattern
        pattern_type
        valid_from
        indicator_types
        created_at
      }
    }
  }
}
"#;

pub const REPORTS_QUERY: &str = r#"
query GetReports($first: Int) {
  reports(first: $first, orderBy: published, orderMode: desc) {
    edges {
      node {
        id
        name
        description
        published
        report_types
        objectLabel {
          edges {
            node {
              value
            }
          }
        }
      }
    }
  }
}
"#;

pub const ENTITY_QUERY: &str = r#"
query GetEntity($id: String!) {
  stixDomainObject(id: $id) {
    id
    name
    description
    aliases
    created_at
    updated_at
    ... on Report {
      published
    }
    ... on Malware {
      is_family
    }
  }
}
"#;

pub const MALWARE_QUERY: &str = r#"
query SearchMalware($first: Int, $filters: FilterGroup) {
  malwares(first: $first, filters: $filters) {
    edges {
      node {
        id
        name
        description
        aliases
        is_family
        created_at
      }
    }
  }
}
"#;

pub const THREAT_ACTORS_QUERY: &str = r#"
query SearchThreatActors($first: Int, $filters: FilterGroup) {
  threatActors(first: $first, filters: $filters) {
    edges {
      node {
        id
        name
        description
        aliases
        sophistication
        primary_motivation
        created_at
      }
    }
  }
}
"#;

pub const VULNERABILITIES_QUERY: &str = r#"
query SearchVulnerabilities($first: Int, $filters: FilterGroup) {
  vulnerabilities(first: $first, filters: $filters) {
    edges {
      node {
        id
        name
        description
        x_opencti_base_severity
        x_opencti_cvss_base_score
        created_at
      }
    }
  }
}
"#;

pub const OBSERVABLES_QUERY: &str = r#"
query SearchObservables($first: Int, $filters: FilterGroup) {
  stixCyberObservables(first: $first, filters: $filters) {
    edges {
      node {
        id
        entity_type
        observable_value
        created_at
      }
    }
  }
}
"#;

// ============================================================
// Filter Types
// ============================================================

/// A single `key == value` filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub key: String,
    pub values: Vec<String>,
    pub operator: String,
}

impl Filter {
    pub fn equals(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            values: vec![value.to_string()],
            operator: "eq".to_string(),
        }
    }
}

/// OpenCTI `FilterGroup` input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    pub mode: String,
    pub filters: Vec<Filter>,
    pub filter_groups: Vec<FilterGroup>,
}

impl FilterGroup {
    /// Group matching every record where `key` equals `value`
    pub fn single(key: &str, value: &str) -> Self {
        Self {
            mode: "and".to_string(),
            filters: vec![Filter::equals(key, value)],
            filter_groups: Vec::new(),
        }
    }
}

// ============================================================
// Variable Builders
// ============================================================

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

pub fn search_variables(keyword: &str, limit: u32) -> Record {
    into_record(json!({ "keyword": keyword, "first": limit }))
}

/// `filters` is always present; it holds one `pattern_type` entry when a type is given
pub fn indicator_variables(limit: u32, filter_type: Option<&str>) -> Record {
    let filters: Vec<Filter> = filter_type
        .filter(|t| !t.is_empty())
        .map(|t| Filter::equals("pattern_type", t))
        .into_iter()
        .collect();

    into_record(json!({ "first": limit, "filters": filters }))
}

pub fn reports_variables(limit: u32) -> Record {
    into_record(json!({ "first": limit }))
}

pub fn entity_variables(entity_id: &str) -> Record {
    into_record(json!({ "id": entity_id }))
}

pub fn filtered_variables(key: &str, value: &str, limit: u32) -> Record {
    into_record(json!({ "first": limit, "filters": FilterGroup::single(key, value) }))
}

// ============================================================
// Catalog Operations
// ============================================================

impl OpenCtiClient {
    /// Search across all OpenCTI knowledge by keyword
    pub async fn search_knowledge(&self, keyword: &str, limit: u32) -> Result<Vec<Record>> {
        info!(keyword = %keyword, limit, "Searching OpenCTI knowledge");
        let data = self
            .execute(GLOBAL_SEARCH_QUERY, Some(search_variables(keyword, limit)))
            .await?;
        Ok(connection_nodes(data, "globalSearch"))
    }

    /// Latest indicators of compromise, optionally restricted to one pattern type
    pub async fn get_indicators(
        &self,
        limit: u32,
        filter_type: Option<&str>,
    ) -> Result<Vec<Record>> {
        info!(limit, pattern_type = ?filter_type, "Listing indicators");
        let data = self
            .execute(INDICATORS_QUERY, Some(indicator_variables(limit, filter_type)))
            .await?;
        Ok(connection_nodes(data, "indicators"))
    }

    /// Most recently published reports, newest first
    pub async fn get_reports(&self, limit: u32) -> Result<Vec<Record>> {
        info!(limit, "Listing reports");
        let data = self
            .execute(REPORTS_QUERY, Some(reports_variables(limit)))
            .await?;
        Ok(connection_nodes(data, "reports"))
    }

    /// Details of one STIX domain object; empty when the ID is unknown
    pub async fn get_entity_details(&self, entity_id: &str) -> Result<Record> {
        info!(entity_id = %entity_id, "Fetching entity details");
        let data = self
            .execute(ENTITY_QUERY, Some(entity_variables(entity_id)))
            .await?;
        Ok(object_field(data, "stixDomainObject"))
    }

    /// Malware families and samples by exact name
    pub async fn search_malware(&self, name: &str, limit: u32) -> Result<Vec<Record>> {
        info!(name = %name, "Searching malware");
        self.filtered_list(MALWARE_QUERY, "malwares", "name", name, limit)
            .await
    }

    /// Threat actors by exact name
    pub async fn search_threat_actors(&self, name: &str, limit: u32) -> Result<Vec<Record>> {
        info!(name = %name, "Searching threat actors");
        self.filtered_list(THREAT_ACTORS_QUERY, "threatActors", "name", name, limit)
            .await
    }

    /// Vulnerabilities are named after their CVE identifier
    pub async fn search_vulnerabilities(&self, cve: &str, limit: u32) -> Result<Vec<Record>> {
        info!(cve = %cve, "Searching vulnerabilities");
        self.filtered_list(VULNERABILITIES_QUERY, "vulnerabilities", "name", cve, limit)
            .await
    }

    /// Observables (IPs, domains, hashes) by exact value
    pub async fn search_observables(&self, value: &str, limit: u32) -> Result<Vec<Record>> {
        info!(value = %value, "Searching observables");
        self.filtered_list(OBSERVABLES_QUERY, "stixCyberObservables", "value", value, limit)
            .await
    }

    async fn filtered_list(
        &self,
        query: &str,
        field: &str,
        key: &str,
        value: &str,
        limit: u32,
    ) -> Result<Vec<Record>> {
        let data = self
            .execute(query, Some(filtered_variables(key, value, limit)))
            .await?;
        Ok(connection_nodes(data, field))
    }
}
