//! Deploy Kubernetes manifests and report pod/node resource usage.
//!
//! Both commands are thin layers over the Kubernetes API: `apply` resolves
//! every manifest against the cluster's discovery data and submits it with
//! server-side apply, `top` joins pods and nodes with their `metrics.k8s.io`
//! counterparts and prints them as aligned tables.

pub mod apply;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod manifest;
pub mod metrics;
pub mod output;
pub mod quantity;
pub mod top;

/// Field manager recorded on every object this tool applies.
pub const FIELD_MANAGER: &str = "cloudedge-cli";
