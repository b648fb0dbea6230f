//! Resource kinds seen by the admission webhook.
//!
//! A kind only means something together with its API group: a custom
//! resource named `Pod` in another group is not a pod.

/// Core API group (`v1`).
pub const GROUP_CORE: &str = "";
pub const GROUP_APPS: &str = "apps";
/// API group of the platform's virtual machines.
pub const GROUP_KUBEVIRT: &str = "kubevirt.io";

pub const KIND_NAMESPACE: &str = "Namespace";
pub const KIND_POD: &str = "Pod";
pub const KIND_DEPLOYMENT: &str = "Deployment";
pub const KIND_STATEFULSET: &str = "StatefulSet";
pub const KIND_DAEMONSET: &str = "DaemonSet";

/// Platform VM resource kind (not a native workload type).
pub const KIND_VIRTUAL_MACHINE: &str = "VirtualMachine";

/// Native workload `(group, kind)` pairs that may only run in VDC namespaces.
pub const RESTRICTED_WORKLOAD_KINDS: &[(&str, &str)] = &[
    (GROUP_CORE, KIND_POD),
    (GROUP_APPS, KIND_DEPLOYMENT),
    (GROUP_APPS, KIND_STATEFULSET),
    (GROUP_APPS, KIND_DAEMONSET),
];

/// Admission operations that are evaluated. Everything else is allowed.
pub const EVALUATED_OPERATIONS: &[&str] = &["CREATE", "UPDATE"];
