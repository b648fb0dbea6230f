//! Namespace topology labels and name prefixes.

/// Label carrying the namespace role (`org` or `vdc`).
pub const LABEL_TYPE: &str = "type";

/// Label naming the component that owns the namespace.
pub const LABEL_MANAGED_BY: &str = "managed-by";

/// Label carrying the organization ID.
pub const LABEL_ORG: &str = "org";

/// Label carrying the VDC ID.
pub const LABEL_VDC: &str = "vdc";

/// Platform-identity label: application name.
pub const LABEL_APP_NAME: &str = "app.kubernetes.io/name";

/// Platform-identity label: managing controller.
pub const LABEL_APP_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of `managed-by` for namespaces created by the management plane.
pub const MANAGED_BY_OVIM: &str = "ovim";

/// Value of `app.kubernetes.io/name` on platform namespaces.
pub const APP_NAME_OVIM: &str = "ovim";

/// Value of `app.kubernetes.io/managed-by` on platform namespaces.
pub const APP_MANAGED_BY_CONTROLLER: &str = "ovim-controller";

/// `type` label value for organization namespaces.
pub const TYPE_ORG: &str = "org";

/// `type` label value for VDC namespaces.
pub const TYPE_VDC: &str = "vdc";

/// Name prefix of organization namespaces.
pub const ORG_NAMESPACE_PREFIX: &str = "org-";

/// Name prefix of VDC namespaces.
pub const VDC_NAMESPACE_PREFIX: &str = "vdc-";
