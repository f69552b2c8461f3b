use anyhow::{bail, Context, Result};
use migrate_api::MigrationConfig;
use migrate_core::memory::{CloudExport, InMemoryCloud};
use migrate_core::{Reconciler, RunSummary, SnapshotReader};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::init as tracing_init;

/// One rehearsal run: migration options plus the two cloud exports to
/// reconcile between.
#[derive(Debug, Deserialize)]
struct RunConfig {
    #[serde(default)]
    migration: MigrationConfig,
    source_export: PathBuf,
    destination_export: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MIGRATE_CONFIG").ok())
        .unwrap_or_else(|| "migrate.yaml".to_string());
    let config_path = PathBuf::from(config_path);

    info!("Loading run configuration from {}", config_path.display());
    let raw = tokio::fs::read_to_string(&config_path)
        .await
        .with_context(|| format!("reading {}", config_path.display()))?;
    let run: RunConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    if !run.migration.all_networks && run.migration.tenant.is_none() {
        bail!("all_networks is off but no tenant is configured");
    }

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let source = load_cloud(&resolve_path(base, &run.source_export)).await?;
    let destination = load_cloud(&resolve_path(base, &run.destination_export)).await?;
    let src_handle = source.handle();
    let dst_handle = destination.handle();

    info!("Reading source topology snapshot");
    let snapshot = SnapshotReader::new(&src_handle, &run.migration)
        .read()
        .await?;

    info!("Reconciling against destination");
    let summary = Reconciler::new(&dst_handle, &run.migration)
        .run(&snapshot)
        .await?;
    log_summary(&summary);

    Ok(())
}

async fn load_cloud(path: &Path) -> Result<Arc<InMemoryCloud>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let export: CloudExport =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(InMemoryCloud::new(export))
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn log_summary(summary: &RunSummary) {
    info!(
        networks = summary.networks.created_count(),
        subnets = summary.subnets.created_count(),
        routers = summary.routers.created_count(),
        floating_ips = summary.floating_ips.created_count(),
        security_groups = summary.security_groups.created_count(),
        security_group_rules = summary.security_group_rules.created_count(),
        lb_pools = summary.lb_pools.created_count(),
        lb_monitors = summary.lb_monitors.created_count(),
        lb_associations = summary.lb_associations.created_count(),
        lb_members = summary.lb_members.created_count(),
        lb_vips = summary.lb_vips.created_count(),
        "run finished"
    );
    info!("Created {} resources in total", summary.total_created());
}
