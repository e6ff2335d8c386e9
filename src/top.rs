//! The `top` command: per-container and per-node resource usage.

use std::{collections::HashMap, io::Write};

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{ContainerState, Node, Pod};
use kube::{
    api::{Api, ListParams},
    Client, ResourceExt,
};
use tracing::instrument;

use crate::{
    cli::TopArgs,
    config,
    metrics::{NodeMetrics, PodMetrics, Usage},
    output, quantity,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRow {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub status: String,
    pub cpu_millis: i64,
    pub memory_mebibytes: i64,
    pub node: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub node: String,
    pub ready: String,
    pub cpu_millis: i64,
    pub memory_mebibytes: i64,
}

/// Human readable state of a container, as `kubectl get pods` reports it.
pub fn container_status(state: Option<&ContainerState>) -> String {
    let Some(state) = state else {
        return "Waiting".to_owned();
    };
    if let Some(waiting) = &state.waiting {
        non_empty_or(waiting.reason.as_deref(), "Waiting")
    } else if state.running.is_some() {
        "Running".to_owned()
    } else if let Some(terminated) = &state.terminated {
        non_empty_or(terminated.reason.as_deref(), "Terminated")
    } else {
        "Waiting".to_owned()
    }
}

fn non_empty_or(reason: Option<&str>, fallback: &str) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => reason.to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Status of the node's `Ready` condition, `Unknown` when it reports none.
pub fn node_ready(node: &Node) -> String {
    node.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .map_or_else(|| "Unknown".to_owned(), |c| c.status.clone())
}

/// CPU millicores and memory mebibytes of a usage sample.
///
/// A quantity that cannot be parsed is reported as zero.
fn usage_values(usage: &Usage) -> (i64, i64) {
    let cpu = quantity::cpu_millis(&usage.cpu.0).unwrap_or_else(|err| {
        tracing::warn!(%err, "unreadable cpu usage");
        0
    });
    let memory = quantity::memory_mebibytes(&usage.memory.0).unwrap_or_else(|err| {
        tracing::warn!(%err, "unreadable memory usage");
        0
    });
    (cpu, memory)
}

/// One row per container status, joined with the pod's metrics.
///
/// Pods are matched to metrics by namespace and name, containers by name.
/// Missing metrics are reported as zero usage.
pub fn container_rows(pods: &[Pod], metrics: &[PodMetrics]) -> Vec<ContainerRow> {
    let by_pod: HashMap<(String, String), &PodMetrics> = metrics
        .iter()
        .map(|m| ((m.namespace().unwrap_or_default(), m.name_any()), m))
        .collect();

    let mut rows = Vec::new();
    for pod in pods {
        let namespace = pod.namespace().unwrap_or_default();
        let name = pod.name_any();
        let node = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.node_name.clone())
            .unwrap_or_default();
        let pod_metrics = by_pod.get(&(namespace.clone(), name.clone()));
        if pod_metrics.is_none() {
            tracing::debug!(pod = %name, namespace = %namespace, "no metrics for pod");
        }

        let statuses = pod
            .status
            .as_ref()
            .and_then(|status| status.container_statuses.as_deref())
            .unwrap_or_default();
        for status in statuses {
            let (cpu_millis, memory_mebibytes) = pod_metrics
                .and_then(|m| m.containers.iter().find(|c| c.name == status.name))
                .map_or((0, 0), |c| usage_values(&c.usage));
            rows.push(ContainerRow {
                namespace: namespace.clone(),
                pod: name.clone(),
                container: status.name.clone(),
                status: container_status(status.state.as_ref()),
                cpu_millis,
                memory_mebibytes,
                node: node.clone(),
            });
        }
    }
    rows
}

/// One row per node, joined with node metrics by name.
pub fn node_rows(nodes: &[Node], metrics: &[NodeMetrics]) -> Vec<NodeRow> {
    let by_node: HashMap<String, &NodeMetrics> =
        metrics.iter().map(|m| (m.name_any(), m)).collect();

    nodes
        .iter()
        .map(|node| {
            let name = node.name_any();
            let (cpu_millis, memory_mebibytes) = by_node
                .get(&name)
                .map_or((0, 0), |m| usage_values(&m.usage));
            NodeRow {
                ready: node_ready(node),
                node: name,
                cpu_millis,
                memory_mebibytes,
            }
        })
        .collect()
}

/// Pods and their metrics in `namespace`, or in every namespace when it is empty.
#[instrument(skip(client))]
pub async fn fetch_containers(client: &Client, namespace: &str) -> Result<Vec<ContainerRow>> {
    let (pods, pod_metrics): (Api<Pod>, Api<PodMetrics>) = if namespace.is_empty() {
        (Api::all(client.clone()), Api::all(client.clone()))
    } else {
        (
            Api::namespaced(client.clone(), namespace),
            Api::namespaced(client.clone(), namespace),
        )
    };

    let pods = pods
        .list(&ListParams::default())
        .await
        .context("Failed to list pods")?;
    let pod_metrics = pod_metrics
        .list(&ListParams::default())
        .await
        .context("Failed to list pod metrics")?;
    tracing::debug!(pods = pods.items.len(), metrics = pod_metrics.items.len(), "listed pods");

    Ok(container_rows(&pods.items, &pod_metrics.items))
}

#[instrument(skip_all)]
pub async fn fetch_nodes(client: &Client) -> Result<Vec<NodeRow>> {
    let nodes: Api<Node> = Api::all(client.clone());
    let node_metrics: Api<NodeMetrics> = Api::all(client.clone());

    let nodes = nodes
        .list(&ListParams::default())
        .await
        .context("Failed to list nodes")?;
    let node_metrics = node_metrics
        .list(&ListParams::default())
        .await
        .context("Failed to list node metrics")?;
    tracing::debug!(
        nodes = nodes.items.len(),
        metrics = node_metrics.items.len(),
        "listed nodes"
    );

    Ok(node_rows(&nodes.items, &node_metrics.items))
}

/// Fetch everything first, so a failed list call leaves `out` untouched.
pub async fn report<W: Write>(client: &Client, namespace: &str, out: W) -> Result<()> {
    let containers = fetch_containers(client, namespace).await?;
    let nodes = fetch_nodes(client).await?;

    output::write_report(out, &containers, &nodes).context("Failed to write the report")
}

pub async fn run(args: TopArgs) -> Result<()> {
    let client = config::client(&args.kubeconfig, args.context.as_deref()).await?;
    report(&client, &args.namespace, std::io::stdout()).await
}
