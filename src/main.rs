//! tablerecon - cross-engine table reconciliation
//!
//! Compares the table catalogs of two databases, possibly on different
//! engines, and reports per-table row counts side by side.
//!
//! A run goes through these steps:
//! - Decrypt the two connection descriptors
//! - Load both catalogs and merge them by table name
//! - Count rows on each side concurrently
//! - Write the report to the console and the per-run audit log

mod align;
mod audit;
mod config;
mod connection;
mod db;
mod error;
mod orchestrator;
mod reconcile;
mod report;
mod secret;

use crate::audit::AuditLog;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Context;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Reconciliation aborted");
            eprintln!("Reconciliation failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    info!(
        max_concurrency = settings.reconcile.max_concurrency,
        query_timeout_secs = settings.reconcile.query_timeout.as_secs(),
        "Configuration loaded"
    );

    let audit = AuditLog::new(&settings.log_dir);
    audit.record(&format!("Log file: {}", audit.path().display()), true, false);
    audit.record("Reconciliation started", false, true);

    let orchestrator = Orchestrator::new(&settings, &audit);
    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(e) => {
            audit.record(&format!("FATAL [{}]: {}", e.stage(), e), false, true);
            return Err(anyhow::anyhow!("{} stage failed: {}", e.stage(), e));
        }
    };

    orchestrator.publish(&report);

    if let Some(path) = &settings.report_json {
        match report.write_json(path) {
            Ok(()) => audit.info(&format!("JSON report written to {}", path.display())),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "JSON report not written");
                audit.info(&format!("Could not write JSON report {}: {}", path.display(), e));
            }
        }
    }

    audit.record("Reconciliation finished", false, true);
    Ok(())
}

/// Initialize tracing with structured logging on stderr
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .init();
}
