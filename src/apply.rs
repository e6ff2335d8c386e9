//! The `apply` command: server-side apply of every manifest in a directory.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, DynamicObject, Patch, PatchParams},
    Client,
};
use tracing::instrument;

use crate::{
    cli::ApplyArgs,
    config,
    discovery::{format_gvk, gvk_of, ResourceScope, RestMapper},
    manifest, FIELD_MANAGER,
};

/// An object accepted by the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub gvk: String,
    pub name: String,
}

/// Applies decoded manifest objects into one target namespace.
pub struct Applier {
    client: Client,
    mapper: RestMapper,
    namespace: String,
    dry_run: bool,
}

impl Applier {
    pub fn new(client: Client, mapper: RestMapper, namespace: String, dry_run: bool) -> Self {
        Self {
            client,
            mapper,
            namespace,
            dry_run,
        }
    }

    fn patch_params(&self) -> PatchParams {
        let mut params = PatchParams::apply(FIELD_MANAGER);
        params.dry_run = self.dry_run;
        params
    }

    /// Apply one manifest object read from `source`.
    ///
    /// Namespaced kinds land in the target namespace.
    #[instrument(skip_all, fields(
        source = %source.display(),
        kind = object.get("kind").and_then(|v| v.as_str()).unwrap_or("unknown"),
        name = object.pointer("/metadata/name").and_then(|v| v.as_str()).unwrap_or("unknown"),
    ))]
    pub async fn apply_object(&self, source: &Path, object: &serde_json::Value) -> Result<Applied> {
        let gvk = gvk_of(object).with_context(|| {
            format!("Invalid object in the '{}' manifest file", source.display())
        })?;
        let gvk_name = format_gvk(&gvk);
        let mapping = self
            .mapper
            .mapping(&gvk)
            .with_context(|| format!("Failed to get REST mapping for the '{gvk_name}' GVK"))?;

        let name = object
            .pointer("/metadata/name")
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .with_context(|| {
                format!(
                    "The '{gvk_name}' resource in the '{}' manifest file has no metadata.name",
                    source.display()
                )
            })?;

        let api: Api<DynamicObject> = match mapping.scope {
            ResourceScope::Namespaced => {
                Api::namespaced_with(self.client.clone(), &self.namespace, &mapping.resource)
            }
            ResourceScope::ClusterWide => Api::all_with(self.client.clone(), &mapping.resource),
        };

        api.patch(name, &self.patch_params(), &Patch::Apply(object))
            .await
            .with_context(|| format!("Failed to create the '{gvk_name}' '{name}' resource"))?;
        tracing::debug!(dry_run = self.dry_run, "applied");

        Ok(Applied {
            gvk: gvk_name,
            name: name.to_owned(),
        })
    }

    /// Server-side apply the target namespace itself.
    #[instrument(skip_all, fields(namespace = %self.namespace))]
    pub async fn apply_namespace(&self) -> Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let body = namespace_object(&self.namespace);
        namespaces
            .patch(&self.namespace, &self.patch_params(), &Patch::Apply(&body))
            .await
            .with_context(|| format!("Failed to create the '{}' namespace", self.namespace))?;
        Ok(())
    }
}

fn namespace_object(name: &str) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": { "name": name },
    })
}

/// Create the namespace if asked, then apply every manifest of the directory.
///
/// A success line is written to `out` per applied object. The first failure
/// stops the run; objects applied before it stay applied.
pub async fn apply_dir<W: Write>(client: Client, args: &ApplyArgs, mut out: W) -> Result<()> {
    if args.create_namespace {
        let applier = Applier::new(
            client.clone(),
            RestMapper::default(),
            args.namespace.clone(),
            args.dry_run,
        );
        applier.apply_namespace().await?;
        writeln!(out, "The '{}' Namespace was successfully applied!", args.namespace)?;
    }

    let mapper = RestMapper::discover(client.clone()).await?;
    let applier = Applier::new(client, mapper, args.namespace.clone(), args.dry_run);

    // a file is fully decoded before any of its objects is applied
    for path in manifest::manifest_paths(&args.directory)? {
        let file = manifest::load_file(&path)?;
        for object in &file.objects {
            let applied = applier.apply_object(&file.path, object).await?;
            writeln!(
                out,
                "The resource '{}' named '{}' was successfully applied!",
                applied.gvk, applied.name
            )?;
        }
    }
    Ok(())
}

pub async fn run(args: ApplyArgs) -> Result<()> {
    let client = config::client(&args.kubeconfig, args.context.as_deref()).await?;
    apply_dir(client, &args, std::io::stdout()).await
}
