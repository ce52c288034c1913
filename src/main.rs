//! Storage Policy API
//!
//! Provisions a block-storage stack through the policy layer: creates the
//! storage cluster, waits until it is healthy, creates a pool, waits until it
//! is ready, then generates the StorageClass for a block volume on it.
//!
//! Runs against the current Kubernetes context, or fully in memory with
//! `--standalone`.

use clap::Parser;
use kube::CustomResourceExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storage_policy_api::crd::{StorageCluster, StoragePool, StorageVolume};
use storage_policy_api::{
    Clientset, DurabilityClass, DurabilityLevel, DurabilityPolicy, Error, FailureDomain,
    InMemoryStore, KubeStore, OperatorConfig, PerfClass, PerformancePolicy, Result,
    StorageClusterSpec, StoragePoolSpec, StorageVolumeSpec,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage Policy API - policy-driven Rook/Ceph provisioning
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Namespace the Rook operator and its resources live in
    #[arg(long, env = "STORAGE_NAMESPACE", default_value = "rook-ceph")]
    namespace: String,

    /// Storage cluster name
    #[arg(long, env = "CLUSTER_NAME", default_value = "rook-ceph")]
    cluster_name: String,

    /// Storage pool name
    #[arg(long, env = "POOL_NAME", default_value = "bpool1")]
    pool_name: String,

    /// Consume this external cluster instead of provisioning one
    #[arg(long, env = "EXTERNAL_CLUSTER_ID")]
    external_cluster_id: Option<String>,

    /// Failure domain (host, rack)
    #[arg(long, env = "FAILURE_DOMAIN", default_value = "host")]
    failure_domain: FailureDomain,

    /// Durability class (replicated, erasurecoded)
    #[arg(long, env = "DURABILITY_CLASS", default_value = "replicated")]
    durability_class: DurabilityClass,

    /// Durability level (low, semi, normal, high)
    #[arg(long, env = "DURABILITY_LEVEL", default_value = "normal")]
    durability_level: DurabilityLevel,

    /// Performance class (standard, medium, fast)
    #[arg(long, env = "PERF_CLASS")]
    perf_class: Option<PerfClass>,

    /// Pool quota in bytes, 0 for unlimited
    #[arg(long, env = "POOL_QUOTA", default_value = "0")]
    quota: u64,

    /// Configuration file (YAML)
    #[arg(long, env = "STORAGE_CONFIG")]
    config: Option<String>,

    /// Readiness poll interval in seconds
    #[arg(long, env = "POLL_INTERVAL", default_value = "10")]
    poll_interval_secs: u64,

    /// Give up waiting for readiness after this many seconds
    #[arg(long, env = "READY_TIMEOUT", default_value = "1800")]
    ready_timeout_secs: u64,

    /// Apply the generated StorageClass instead of only printing it
    #[arg(long, env = "APPLY_STORAGE_CLASS")]
    apply: bool,

    /// Print the CustomResourceDefinitions and exit
    #[arg(long)]
    print_crds: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Run in standalone mode (no Kubernetes)
    #[arg(long, env = "STANDALONE")]
    standalone: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_crds {
        return print_crds();
    }

    init_logging(&args)?;

    info!("Starting Storage Policy API");
    info!("  Version: {}", storage_policy_api::VERSION);
    info!("  Namespace: {}", args.namespace);
    info!("  Standalone mode: {}", args.standalone);

    let config = match &args.config {
        Some(path) => OperatorConfig::from_file(path)?,
        None => OperatorConfig::default(),
    };

    let mut kube_store = None;
    let clientset = if args.standalone {
        Clientset::new(Arc::new(InMemoryStore::new().with_auto_ready()), config)
    } else {
        let store = Arc::new(KubeStore::try_default().await?);
        kube_store = Some(store.clone());
        Clientset::new(store, config)
    };

    let readiness = clientset.readiness(&args.namespace);
    let poll = Duration::from_secs(args.poll_interval_secs.max(1));
    let timeout = Duration::from_secs(args.ready_timeout_secs);

    // Cluster
    let mut cluster = StorageCluster::new(
        &args.cluster_name,
        StorageClusterSpec {
            external_cluster_id: args.external_cluster_id.clone(),
            ..Default::default()
        },
    );
    clientset
        .storage_clusters(&args.namespace)
        .create(&mut cluster)
        .await?;
    wait_until("cluster", &args.cluster_name, poll, timeout, || {
        readiness.cluster_healthy(&args.cluster_name)
    })
    .await?;

    // Pool
    let pool = StoragePool::new(
        &args.pool_name,
        StoragePoolSpec {
            cluster_id: args.cluster_name.clone(),
            quota: args.quota,
            durability_policy: DurabilityPolicy::new(
                args.failure_domain,
                args.durability_class,
                args.durability_level,
            ),
            perf_policy: PerformancePolicy {
                io_perf_class: args.perf_class,
            },
        },
    );
    clientset.storage_pools(&args.namespace).create(&pool).await?;
    wait_until("pool", &args.pool_name, poll, timeout, || {
        readiness.pool_ready(&args.pool_name)
    })
    .await?;

    // Volume
    let volume = StorageVolume::new(
        &args.pool_name,
        StorageVolumeSpec::block(args.cluster_name.clone(), args.pool_name.clone()),
    );
    let (_, descriptor) = clientset
        .storage_volumes(&args.namespace)
        .create(&volume)
        .await?;

    print!("{}", descriptor.to_yaml()?);

    if args.apply {
        match &kube_store {
            Some(store) => {
                store.apply_storage_class(&descriptor).await?;
                info!("Applied StorageClass: {}", descriptor.name());
            }
            None => warn!("Skipping StorageClass apply in standalone mode"),
        }
    }

    info!("Provisioning complete");
    Ok(())
}

/// Poll `check` until it reports true or `timeout` elapses
async fn wait_until<F, Fut>(
    what: &str,
    name: &str,
    poll: Duration,
    timeout: Duration,
    mut check: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await? {
            info!("Storage {} {} is ready", what, name);
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::Internal(format!(
                "timed out waiting for storage {} {}",
                what, name
            )));
        }
        info!("Waiting for storage {} {}", what, name);
        tokio::time::sleep(poll).await;
    }
}

fn print_crds() -> Result<()> {
    for crd in [StorageCluster::crd(), StoragePool::crd(), StorageVolume::crd()] {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let directive = |s: &str| {
        s.parse::<Directive>()
            .map_err(|e| Error::Configuration(format!("Invalid log directive {}: {}", s, e)))
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive(directive("hyper=warn")?)
        .add_directive(directive("kube=info")?)
        .add_directive(directive("tower=warn")?);

    // stdout carries the generated YAML
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}
