use chrono::{DateTime, Utc};
use pkg_constants::labels::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Role of a namespace in the org/VDC topology, read from its `type` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceRole {
    Organization,
    Vdc,
    Other,
}

impl NamespaceRole {
    pub fn from_labels(labels: &HashMap<String, String>) -> Self {
        match labels.get(LABEL_TYPE).map(String::as_str) {
            Some(TYPE_ORG) => NamespaceRole::Organization,
            Some(TYPE_VDC) => NamespaceRole::Vdc,
            _ => NamespaceRole::Other,
        }
    }
}

/// True iff `managed-by=ovim`.
pub fn is_managed(labels: &HashMap<String, String>) -> bool {
    labels.get(LABEL_MANAGED_BY).map(String::as_str) == Some(MANAGED_BY_OVIM)
}

/// Value of a label, treating an empty string as absent.
pub fn label_value<'a>(labels: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    labels
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

pub fn org_namespace_name(org_id: &str) -> String {
    format!("{}{}", ORG_NAMESPACE_PREFIX, org_id)
}

pub fn vdc_namespace_name(org_id: &str, vdc_id: &str) -> String {
    format!("{}{}-{}", VDC_NAMESPACE_PREFIX, org_id, vdc_id)
}

fn platform_labels(kind: &str, org_id: &str) -> HashMap<String, String> {
    HashMap::from([
        (LABEL_TYPE.to_string(), kind.to_string()),
        (LABEL_MANAGED_BY.to_string(), MANAGED_BY_OVIM.to_string()),
        (LABEL_ORG.to_string(), org_id.to_string()),
        (LABEL_APP_NAME.to_string(), APP_NAME_OVIM.to_string()),
        (
            LABEL_APP_MANAGED_BY.to_string(),
            APP_MANAGED_BY_CONTROLLER.to_string(),
        ),
    ])
}

/// Full label set of a management-plane organization namespace.
pub fn org_namespace_labels(org_id: &str) -> HashMap<String, String> {
    platform_labels(TYPE_ORG, org_id)
}

/// Full label set of a management-plane VDC namespace.
pub fn vdc_namespace_labels(org_id: &str, vdc_id: &str) -> HashMap<String, String> {
    let mut labels = platform_labels(TYPE_VDC, org_id);
    labels.insert(LABEL_VDC.to_string(), vdc_id.to_string());
    labels
}
