use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cloud-edge")]
#[command(about = "Deploy and monitor applications in a Kubernetes cluster", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy applications
    #[command(long_about = APPLY_LONG_ABOUT)]
    Apply(ApplyArgs),

    /// Monitor running applications
    #[command(long_about = TOP_LONG_ABOUT)]
    Top(TopArgs),
}

const APPLY_LONG_ABOUT: &str = "\
The 'apply' command applies Kubernetes manifest files via the API server.

Examples of usage:

Apply all Kubernetes manifest files in the 'app' directory to the 'app' namespace.
Create the namespace if it does not already exist:

$ cloud-edge apply --directory app --namespace app --create-namespace --kubeconfig kubeconfig";

const TOP_LONG_ABOUT: &str = "\
The 'top' command monitors running services in a Kubernetes cluster.

Examples of usage:

To monitor services running in the namespace 'app':
$ cloud-edge top --namespace app --kubeconfig kubeconfig

To monitor services running in all namespaces:
$ cloud-edge top --namespace \"\" --kubeconfig kubeconfig

Note:
The command uses the Kubernetes metrics API. A metrics-server must be
deployed in the cluster for the command to function.";

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// The directory that contains the Kubernetes YAML manifests to be applied
    #[arg(short = 'd', long)]
    pub directory: PathBuf,

    /// The path to the kubeconfig file
    #[arg(short = 'k', long)]
    pub kubeconfig: PathBuf,

    /// The namespace into which to apply the manifests
    #[arg(short = 'n', long)]
    pub namespace: String,

    /// Create the specified namespace before applying manifests into it
    #[arg(short = 'c', long)]
    pub create_namespace: bool,

    /// Kubeconfig context to use instead of the current context
    #[arg(long)]
    pub context: Option<String>,

    /// Submit every request as a server-side dry run
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// The path to the kubeconfig file
    #[arg(short = 'k', long)]
    pub kubeconfig: PathBuf,

    /// Namespace to select pods; enter "" to select all pods in the cluster
    #[arg(short = 'n', long)]
    pub namespace: String,

    /// Kubeconfig context to use instead of the current context
    #[arg(long)]
    pub context: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn empty_namespace_is_accepted_for_top() {
        let cli = Cli::try_parse_from(["cloud-edge", "top", "-k", "kc", "-n", ""]).unwrap();
        match cli.command {
            Command::Top(args) => {
                assert_eq!(args.namespace, "");
                assert_eq!(args.kubeconfig, PathBuf::from("kc"));
                assert!(args.context.is_none());
            }
            Command::Apply(_) => panic!("expected top"),
        }
    }
}
