//! Resolving manifest kinds to API resources.
//!
//! The cluster's discovery API is queried once. Each manifest's apiVersion and
//! kind are then mapped to the [`ApiResource`] that builds its request path,
//! together with whether the resource lives in a namespace.

use std::collections::HashMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::{
    core::GroupVersionKind,
    discovery::ApiResource,
    Client,
};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to get API group resources")]
    Discovery(#[source] kube::Error),

    #[error("manifest has no apiVersion")]
    MissingApiVersion,

    #[error("manifest has no kind")]
    MissingKind,

    #[error("no matches for kind \"{kind}\" in version \"{api_version}\"")]
    NoMatch { kind: String, api_version: String },
}

/// Whether a resource is addressed inside a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    Namespaced,
    ClusterWide,
}

#[derive(Debug, Clone)]
pub struct RestMapping {
    pub resource: ApiResource,
    pub scope: ResourceScope,
}

/// Extract the GroupVersionKind of a decoded manifest object.
pub fn gvk_of(object: &serde_json::Value) -> Result<GroupVersionKind, DiscoveryError> {
    let api_version = object
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(DiscoveryError::MissingApiVersion)?;
    let kind = object
        .get("kind")
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(DiscoveryError::MissingKind)?;
    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
    Ok(GroupVersionKind::gvk(group, version, kind))
}

/// Render a GVK as `group/version, Kind=kind`; the core group renders as `/v1, Kind=Pod`.
pub fn format_gvk(gvk: &GroupVersionKind) -> String {
    format!("{}/{}, Kind={}", gvk.group, gvk.version, gvk.kind)
}

/// Top-level resources of one group version; subresources such as `pods/log` are left out.
fn served_resources(
    list: &APIResourceList,
    group_version: &str,
) -> Vec<(ApiResource, ResourceScope)> {
    list.resources
        .iter()
        .filter(|resource| !resource.name.contains('/'))
        .map(|resource| {
            let scope = if resource.namespaced {
                ResourceScope::Namespaced
            } else {
                ResourceScope::ClusterWide
            };
            let (group, version) = group_version.split_once('/').unwrap_or(("", group_version));
            let api_resource = ApiResource {
                group: resource.group.clone().unwrap_or_else(|| group.to_string()),
                version: resource.version.clone().unwrap_or_else(|| version.to_string()),
                api_version: group_version.to_string(),
                kind: resource.kind.clone(),
                plural: resource.name.clone(),
            };
            (api_resource, scope)
        })
        .collect()
}

/// Lookup table from GVK to the API resource serving it.
#[derive(Debug, Clone, Default)]
pub struct RestMapper {
    mappings: HashMap<GroupVersionKind, RestMapping>,
}

impl RestMapper {
    /// Discover the resources of every served group version.
    ///
    /// Only the group and version listings must succeed. A group version that
    /// fails to answer, typically an unavailable aggregated API, is skipped
    /// with a warning and its kinds stay unmapped.
    #[instrument(skip_all)]
    pub async fn discover(client: Client) -> Result<Self, DiscoveryError> {
        let core = client
            .list_core_api_versions()
            .await
            .map_err(DiscoveryError::Discovery)?;
        let groups = client
            .list_api_groups()
            .await
            .map_err(DiscoveryError::Discovery)?;

        let mut resources = Vec::new();
        for version in &core.versions {
            match client.list_core_api_resources(version).await {
                Ok(list) => resources.extend(served_resources(&list, version)),
                Err(err) => {
                    tracing::warn!(group_version = %version, %err, "skipping core api version")
                }
            }
        }
        for group in &groups.groups {
            for version in &group.versions {
                let group_version = &version.group_version;
                match client.list_api_group_resources(group_version).await {
                    Ok(list) => resources.extend(served_resources(&list, group_version)),
                    Err(err) => {
                        tracing::warn!(%group_version, %err, "skipping api group version")
                    }
                }
            }
        }

        let mapper = Self::from_resources(resources);
        tracing::debug!(resources = mapper.mappings.len(), "discovered api resources");
        Ok(mapper)
    }

    pub fn from_resources(
        resources: impl IntoIterator<Item = (ApiResource, ResourceScope)>,
    ) -> Self {
        let mappings = resources
            .into_iter()
            .map(|(resource, scope)| {
                let gvk =
                    GroupVersionKind::gvk(&resource.group, &resource.version, &resource.kind);
                (gvk, RestMapping { resource, scope })
            })
            .collect();
        Self { mappings }
    }

    pub fn mapping(&self, gvk: &GroupVersionKind) -> Result<&RestMapping, DiscoveryError> {
        self.mappings.get(gvk).ok_or_else(|| DiscoveryError::NoMatch {
            kind: gvk.kind.clone(),
            api_version: gvk.api_version(),
        })
    }
}
