//! CanopyMap - Map visualization synchronization engine
//!
//! This library renders a set of reforestation project locations on an
//! interchangeable map provider, keeps marker state (color, overlay content)
//! synchronized with an externally-driven highlight selection, and manages the
//! lifecycle of provider-native resources (markers, overlays, map surfaces)
//! across reconciliations and provider switches.
//!
//! # High-Level API
//!
//! Most callers interact with the [`selector::MapSelector`], which owns the
//! active provider adapter and forwards location/highlight snapshots to it:
//!
//! ```ignore
//! use canopymap::backend::SimulatedBackend;
//! use canopymap::location::demo_locations;
//! use canopymap::provider::ProviderKind;
//! use canopymap::selector::{MapSelector, SelectorConfig};
//!
//! let backend = std::sync::Arc::new(SimulatedBackend::new());
//! let mut selector = MapSelector::new(backend, SelectorConfig::default());
//!
//! selector.set_locations(demo_locations()).await;
//! if let Some(mount) = selector.switch_provider(ProviderKind::Satellite).await {
//!     mount.completed().await?;
//! }
//! selector.set_highlight(Some(canopymap::location::LocationId(2))).await;
//! ```

pub mod backend;
pub mod catalog;
pub mod credential;
pub mod location;
pub mod provider;
pub mod selector;
pub mod telemetry;

/// Version of the CanopyMap library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
