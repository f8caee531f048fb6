//! Scripted engine demo against the simulated backend.

use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::debug;

use canopymap::backend::SimulatedBackend;
use canopymap::credential::{Credential, CredentialStore, FileCredentialStore};
use canopymap::location::demo_locations;
use canopymap::provider::ProviderKind;
use canopymap::selector::{MapSelector, SelectorConfig};

use crate::error::CliError;

use super::common::ProviderArg;

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Provider to start on
    #[arg(long, value_enum, default_value = "satellite")]
    provider: ProviderArg,

    /// Skip the provider-switch segment of the script
    #[arg(long)]
    no_switch: bool,
}

/// Run the scripted demo: mount, highlight, switch, shut down.
pub async fn run(args: DemoArgs) -> Result<(), CliError> {
    let backend = Arc::new(SimulatedBackend::new());
    let mut selector = MapSelector::new(Arc::clone(&backend), demo_config());
    let locations = demo_locations();

    println!(
        "{}",
        style("CanopyMap demo (simulated backend)").green().bold()
    );

    let start: ProviderKind = args.provider.into();
    selector.set_locations(locations.clone()).await;
    step(&format!("mounting {start} provider"));
    if let Some(mount) = selector.switch_provider(start).await {
        mount.completed().await?;
    }
    report(&backend);

    for location in locations.iter().take(2) {
        step(&format!("highlighting {}", location.name));
        selector.set_highlight(Some(location.id)).await;
        report(&backend);
    }

    step("clearing the highlight");
    selector.set_highlight(None).await;
    report(&backend);

    step("narrowing the list to three projects");
    selector.set_locations(locations[..3].to_vec()).await;
    report(&backend);

    step("restoring the full list");
    selector.set_locations(locations.clone()).await;
    report(&backend);

    if !args.no_switch {
        let other = match start {
            ProviderKind::Satellite => ProviderKind::Hybrid,
            ProviderKind::Hybrid => ProviderKind::Satellite,
        };
        step(&format!("switching to {other} provider"));
        if let Some(mount) = selector.switch_provider(other).await {
            mount.completed().await?;
        }
        report(&backend);
    }

    step("shutting down");
    selector.shutdown().await;
    report(&backend);

    let counters = backend.counters();
    println!(
        "\n{} surfaces created: {}, destroyed: {}, markers added: {}, camera moves: {}",
        style("totals:").bold(),
        counters.create_surface,
        counters.destroy_surface,
        counters.add_marker,
        counters.move_camera,
    );
    Ok(())
}

/// Selector config backed by stored credentials, falling back to built-in
/// demo tokens the simulated backend accepts.
fn demo_config() -> SelectorConfig {
    let store = match FileCredentialStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            debug!(error = %e, "credential store unavailable; using demo tokens");
            None
        }
    };
    let stored = |kind| store.as_ref().and_then(|s| s.get(kind));

    SelectorConfig {
        satellite_credential: stored(canopymap::credential::CredentialKind::Satellite)
            .or_else(|| Credential::new("demo-satellite-token")),
        hybrid_credential: stored(canopymap::credential::CredentialKind::Hybrid)
            .or_else(|| Credential::new("demo-hybrid-key")),
        ..SelectorConfig::default()
    }
}

fn step(message: &str) {
    println!("\n{} {}", style("→").cyan().bold(), message);
}

fn report(backend: &SimulatedBackend) {
    let surfaces = backend.live_surfaces();
    match surfaces.first() {
        Some(surface) => {
            let moves = backend.camera_moves(*surface);
            println!(
                "  surface {} with {} markers, {} open windows, {} camera moves",
                surface.0,
                backend.live_markers(*surface).len(),
                backend.open_overlays(*surface).len(),
                moves.len(),
            );
            if let Some(last) = moves.last() {
                println!(
                    "  camera at ({:.4}, {:.4}) zoom {:.1}",
                    last.lat, last.lng, last.zoom
                );
            }
        }
        None => println!("  no live surface"),
    }
}
