//! Map provider adapters.
//!
//! This module provides the uniform adapter contract over the two supported
//! map providers and the marker reconciliation logic they share.
//!
//! An adapter owns exactly one Rendering Surface and the Marker Set placed on
//! it. Its lifecycle is `mount` → any number of `reconcile` passes →
//! `teardown`; `reconcile` is idempotent and is a no-op both before a mount
//! has completed and after teardown. Teardown is idempotent and may race an
//! in-flight mount: the mount detects the cancellation and destroys its own
//! surface instead of attaching.
//!
//! # Adapters
//!
//! - [`SatelliteAdapter`] - globe-style satellite imagery, pin markers,
//!   popups opened by marker click only.
//! - [`HybridAdapter`] - satellite/hybrid imagery with an asynchronously
//!   loaded runtime library, circle markers, and info windows driven by the
//!   highlight selection.

mod hybrid;
mod satellite;
mod sync;
mod types;

pub use hybrid::HybridAdapter;
pub use satellite::SatelliteAdapter;
pub use sync::{plan, AdapterResources, MarkerRecord, MarkerSet, ReconcilePlan};
pub use types::{MountConfig, ProviderError, ProviderKind};

/// Zoom level used when the camera centers on a highlighted location.
///
/// Both providers share one animated camera policy: a single ease to the
/// newly highlighted location at this zoom, and no camera change when the
/// highlight is cleared.
pub const DETAIL_ZOOM: f64 = 5.0;
