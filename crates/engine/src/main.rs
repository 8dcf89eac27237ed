//! Delve Engine - headless dry run.
//!
//! Drives the configured instances through the generation pipeline against a
//! logging spawner and flat empty ground, then prints the registry state.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delve_domain::InstanceId;
use delve_engine::infrastructure::config::EngineSettings;
use delve_engine::infrastructure::dry_run::{FlatGround, LoggingSpawner};
use delve_engine::use_cases::instance_generation::{LifecycleSignal, ParticipantPosition};
use delve_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delve_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Delve Engine dry run");

    let settings = EngineSettings::from_env()?;
    let instances = settings
        .dry_run
        .instances
        .iter()
        .map(|name| InstanceId::new(name.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .context("DELVE_INSTANCES contains an invalid instance name")?;
    let spawn = ParticipantPosition::from(settings.dry_run.spawn);

    let spawner = Arc::new(LoggingSpawner::new());
    let app = App::new(settings, spawner.clone()).await?;

    if instances.is_empty() {
        tracing::warn!("DELVE_INSTANCES is empty, nothing to generate");
    }

    let mut handles = Vec::new();
    for instance in &instances {
        let signals = [
            LifecycleSignal::InstanceStarted {
                instance: instance.clone(),
            },
            LifecycleSignal::ParticipantJoined {
                instance: instance.clone(),
                position: spawn,
                ground: Arc::new(FlatGround::empty()),
            },
        ];
        for signal in signals {
            for outcome in app.controller.handle(signal).await {
                match outcome.result {
                    Ok(trigger) => {
                        tracing::info!(instance = %outcome.instance, outcome = ?trigger, "Signal handled");
                        handles.extend(trigger.into_handle());
                    }
                    Err(e) => {
                        tracing::error!(instance = %outcome.instance, error = %e, "Signal failed");
                    }
                }
            }
        }
    }

    for handle in handles {
        let instance = handle.instance().clone();
        match handle.wait().await {
            Ok(report) => tracing::info!(
                instance = %instance,
                tiles = report.tile_count,
                origin = %report.origin.position,
                elapsed_ms = report.elapsed.as_millis() as u64,
                warnings = report.warnings.len(),
                "Generation finished"
            ),
            Err(e) => tracing::error!(instance = %instance, error = %e, "Generation failed"),
        }
    }

    // A recheck after the first pass must be a no-op for everything generated.
    let recheck = app
        .controller
        .handle(LifecycleSignal::RecheckAll { instances })
        .await;
    for outcome in recheck {
        tracing::debug!(instance = %outcome.instance, outcome = ?outcome.result, "Rechecked");
    }

    let status = app.controller.status().await?;
    tracing::info!(
        known = status.known,
        generated = status.generated,
        in_flight = status.in_flight,
        tiles_spawned = spawner.spawned(),
        "Dry run complete"
    );

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
