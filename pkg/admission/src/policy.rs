use pkg_constants::labels::*;
use pkg_constants::resources::{
    EVALUATED_OPERATIONS, GROUP_CORE, GROUP_KUBEVIRT, KIND_NAMESPACE, KIND_VIRTUAL_MACHINE,
    RESTRICTED_WORKLOAD_KINDS,
};
use pkg_state::NamespaceLookup;
use pkg_types::admission::ObjectWithMeta;
use pkg_types::namespace::{NamespaceRole, is_managed, label_value, org_namespace_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub message: String,
    /// Set only when the payload could not be decoded (always a 4xx).
    pub decode_error_status: Option<u16>,
}

impl AdmissionDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            message: String::new(),
            decode_error_status: None,
        }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: message.into(),
            decode_error_status: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: message.into(),
            decode_error_status: Some(400),
        }
    }

    pub fn is_decode_error(&self) -> bool {
        self.decode_error_status.is_some()
    }
}

/// How the policy treats a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindClass {
    Namespace,
    Workload,
    VirtualMachine,
    Unrestricted,
}

fn classify(group: &str, kind: &str) -> KindClass {
    if (group, kind) == (GROUP_CORE, KIND_NAMESPACE) {
        KindClass::Namespace
    } else if RESTRICTED_WORKLOAD_KINDS.contains(&(group, kind)) {
        KindClass::Workload
    } else if (group, kind) == (GROUP_KUBEVIRT, KIND_VIRTUAL_MACHINE) {
        KindClass::VirtualMachine
    } else {
        KindClass::Unrestricted
    }
}

/// Stateless per call; every decision reads namespaces through `lookup`.
/// At most one lookup happens per call.
pub struct NamespacePolicy<L: ?Sized> {
    lookup: Arc<L>,
}

impl<L> NamespacePolicy<L>
where
    L: NamespaceLookup + ?Sized,
{
    pub fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    /// Decide one request.
    ///
    /// `group` and `kind` identify the resource type; `namespace` is the
    /// request's target namespace (for namespaced kinds); `object` is the raw
    /// incoming object.
    pub async fn decide(
        &self,
        group: &str,
        kind: &str,
        operation: &str,
        namespace: Option<&str>,
        object: Option<&serde_json::Value>,
    ) -> AdmissionDecision {
        if !EVALUATED_OPERATIONS.contains(&operation) {
            return AdmissionDecision::allow();
        }

        let class = classify(group, kind);
        if class == KindClass::Unrestricted {
            debug!("Admission: kind {}/{} is not restricted, allowing", group, kind);
            return AdmissionDecision::allow();
        }

        let meta = match object {
            Some(value) => match serde_json::from_value::<ObjectWithMeta>(value.clone()) {
                Ok(obj) => obj.metadata,
                Err(e) => {
                    warn!("Admission: cannot decode {} object: {}", kind, e);
                    return AdmissionDecision::bad_request(format!(
                        "failed to decode {} object: {}",
                        kind, e
                    ));
                }
            },
            None if class == KindClass::Namespace => {
                return AdmissionDecision::bad_request("namespace request carries no object");
            }
            None => Default::default(),
        };

        let decision = match class {
            KindClass::Namespace => {
                let name = meta.name.as_deref().unwrap_or_default();
                self.validate_namespace(name, &meta.labels).await
            }
            KindClass::Workload | KindClass::VirtualMachine => {
                let target = namespace
                    .filter(|ns| !ns.is_empty())
                    .or(meta.namespace.as_deref())
                    .unwrap_or_default();
                self.validate_workload_target(kind, target).await
            }
            KindClass::Unrestricted => AdmissionDecision::allow(),
        };

        if !decision.allowed {
            info!("Admission denied: kind={} op={} reason={}", kind, operation, decision.message);
        }
        decision
    }

    async fn validate_namespace(
        &self,
        name: &str,
        labels: &HashMap<String, String>,
    ) -> AdmissionDecision {
        let role = NamespaceRole::from_labels(labels);
        let type_label = match role {
            NamespaceRole::Organization => TYPE_ORG,
            NamespaceRole::Vdc => TYPE_VDC,
            NamespaceRole::Other => return AdmissionDecision::allow(),
        };

        if !is_managed(labels) {
            return AdmissionDecision::deny(format!(
                "namespace {} with {}={} must be created by management plane ({}={} is required)",
                name, LABEL_TYPE, type_label, LABEL_MANAGED_BY, MANAGED_BY_OVIM
            ));
        }

        for key in [LABEL_APP_NAME, LABEL_APP_MANAGED_BY] {
            if label_value(labels, key).is_none() {
                return AdmissionDecision::deny(format!(
                    "namespace {} is missing required label {}",
                    name, key
                ));
            }
        }

        match role {
            NamespaceRole::Organization => validate_org_namespace(name, labels),
            NamespaceRole::Vdc => self.validate_vdc_namespace(name, labels).await,
            NamespaceRole::Other => AdmissionDecision::allow(),
        }
    }

    async fn validate_vdc_namespace(
        &self,
        name: &str,
        labels: &HashMap<String, String>,
    ) -> AdmissionDecision {
        if !name.starts_with(VDC_NAMESPACE_PREFIX) {
            return AdmissionDecision::deny(format!(
                "VDC namespace {} must have prefix {}",
                name, VDC_NAMESPACE_PREFIX
            ));
        }
        let Some(org) = label_value(labels, LABEL_ORG) else {
            return AdmissionDecision::deny(format!(
                "VDC namespace {} must have a non-empty {} label",
                name, LABEL_ORG
            ));
        };
        if label_value(labels, LABEL_VDC).is_none() {
            return AdmissionDecision::deny(format!(
                "VDC namespace {} must have a non-empty {} label",
                name, LABEL_VDC
            ));
        }

        let parent = org_namespace_name(org);
        match self.lookup.get_namespace(&parent).await {
            Ok(Some(_)) => AdmissionDecision::allow(),
            Ok(None) => AdmissionDecision::deny(format!(
                "parent organization namespace {} not found for VDC namespace {}",
                parent, name
            )),
            Err(e) => {
                warn!("Admission: lookup of {} failed: {}", parent, e);
                AdmissionDecision::deny(format!(
                    "parent organization namespace {} could not be resolved: {}",
                    parent, e
                ))
            }
        }
    }

    async fn validate_workload_target(&self, kind: &str, namespace: &str) -> AdmissionDecision {
        if namespace.starts_with(ORG_NAMESPACE_PREFIX) && !namespace.starts_with(VDC_NAMESPACE_PREFIX)
        {
            return AdmissionDecision::deny(format!(
                "workloads not allowed in organization namespaces: {} in {} must be placed in a VDC namespace",
                kind, namespace
            ));
        }
        if !namespace.starts_with(VDC_NAMESPACE_PREFIX) {
            return AdmissionDecision::allow();
        }

        let ns = match self.lookup.get_namespace(namespace).await {
            Ok(Some(ns)) => ns,
            Ok(None) => {
                return AdmissionDecision::deny(format!(
                    "VDC namespace {} not found",
                    namespace
                ));
            }
            Err(e) => {
                warn!("Admission: lookup of {} failed: {}", namespace, e);
                return AdmissionDecision::deny(format!(
                    "VDC namespace {} could not be resolved: {}",
                    namespace, e
                ));
            }
        };

        if NamespaceRole::from_labels(&ns.labels) != NamespaceRole::Vdc
            || !is_managed(&ns.labels)
            || label_value(&ns.labels, LABEL_ORG).is_none()
        {
            return AdmissionDecision::deny(format!(
                "namespace {} is not a valid VDC namespace (requires {}={}, {}={} and a non-empty {} label)",
                namespace, LABEL_TYPE, TYPE_VDC, LABEL_MANAGED_BY, MANAGED_BY_OVIM, LABEL_ORG
            ));
        }
        AdmissionDecision::allow()
    }
}

fn validate_org_namespace(name: &str, labels: &HashMap<String, String>) -> AdmissionDecision {
    if !name.starts_with(ORG_NAMESPACE_PREFIX) {
        return AdmissionDecision::deny(format!(
            "organization namespace {} must have prefix {}",
            name, ORG_NAMESPACE_PREFIX
        ));
    }
    if label_value(labels, LABEL_ORG).is_none() {
        return AdmissionDecision::deny(format!(
            "organization namespace {} must have a non-empty {} label",
            name, LABEL_ORG
        ));
    }
    AdmissionDecision::allow()
}
