//! Native map SDK abstraction.
//!
//! The engine never talks to a real mapping SDK directly. Every native
//! capability it needs - creating a map surface, placing markers, showing
//! overlays, moving the camera - goes through the [`MapBackend`] trait. This
//! abstraction allows dependency injection and easier testing: the provider
//! adapters are generic over the backend, and the shipped
//! [`SimulatedBackend`] records every call so tests can assert on the exact
//! sequence of native operations.
//!
//! Only the two operations where real SDKs suspend are asynchronous: library
//! loading and surface creation. Everything else is a synchronous native call.

mod simulated;

use std::future::Future;

use thiserror::Error;

use crate::credential::Credential;

pub use simulated::{CallCounters, SimulatedBackend};

/// Opaque handle to one live map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Opaque handle to one native marker (and its attached overlay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Marker glyph shape. Providers differ: pins for the satellite provider,
/// circle symbols for the hybrid provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Pin,
    Circle,
}

/// Visual style of a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    /// Fill color as a hex string, e.g. `#4CAF50`.
    pub color: String,
}

/// Content of the overlay (popup / info window) attached to a marker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverlayContent {
    /// Heading line, usually the location name.
    pub heading: String,
    /// Region/country line, omitted when unknown.
    pub area: Option<String>,
    /// Trees-planted line, omitted when unknown.
    pub trees: Option<u32>,
    /// Whether a "currently selected" line is shown.
    pub selected: bool,
}

/// Initial configuration for a map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    /// Identifier of the host container the surface renders into.
    pub container: String,
    /// CSS height of the surface.
    pub height: String,
    /// Initial camera center as `(lat, lng)`.
    pub center: (f64, f64),
    /// Initial zoom level.
    pub zoom: f64,
    /// Camera tilt in degrees, where the provider supports it.
    pub tilt: Option<f64>,
    /// Provider-native basemap style or map type identifier.
    pub basemap: String,
}

/// A single camera motion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMove {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
    /// Whether the move is an animated ease or an immediate jump.
    pub animated: bool,
}

/// Full description of a marker at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub lat: f64,
    pub lng: f64,
    /// Native tooltip title.
    pub title: String,
    pub style: MarkerStyle,
    pub overlay: OverlayContent,
}

/// Errors surfaced by a native backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The backend could not be initialized: library load failed, the
    /// credential was rejected, or the network was unavailable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A per-marker native call failed.
    #[error("marker operation failed: {0}")]
    MarkerRender(String),

    /// Operation attempted on a destroyed surface or removed marker.
    #[error("operation on a destroyed native handle")]
    StaleHandle,
}

/// Uniform contract over a native mapping SDK.
///
/// Implementations must be safe to share across tasks; all interior state is
/// the implementation's concern. The async methods return `Send` futures so
/// adapters can be driven from spawned tasks.
pub trait MapBackend: Send + Sync + 'static {
    /// Load the provider's runtime library, authenticating with `credential`.
    ///
    /// For SDKs that are statically available this may complete immediately.
    fn load_library(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Create a map surface. At most one surface per adapter instance.
    fn create_surface(
        &self,
        credential: &Credential,
        config: SurfaceConfig,
    ) -> impl Future<Output = Result<SurfaceId, BackendError>> + Send;

    /// Destroy a surface and release its native resources.
    fn destroy_surface(&self, surface: SurfaceId) -> Result<(), BackendError>;

    /// Place a marker on a surface.
    fn add_marker(&self, surface: SurfaceId, spec: MarkerSpec) -> Result<MarkerId, BackendError>;

    /// Restyle an existing marker.
    fn set_marker_style(&self, marker: MarkerId, style: MarkerStyle) -> Result<(), BackendError>;

    /// Replace the overlay content attached to a marker.
    fn set_overlay_content(
        &self,
        marker: MarkerId,
        content: OverlayContent,
    ) -> Result<(), BackendError>;

    /// Open the overlay attached to a marker.
    fn open_overlay(&self, marker: MarkerId) -> Result<(), BackendError>;

    /// Close the overlay attached to a marker.
    fn close_overlay(&self, marker: MarkerId) -> Result<(), BackendError>;

    /// Remove a marker and its overlay from the surface.
    fn remove_marker(&self, marker: MarkerId) -> Result<(), BackendError>;

    /// Move the surface camera.
    fn move_camera(&self, surface: SurfaceId, motion: CameraMove) -> Result<(), BackendError>;

    /// Attach a provider-native UI control (navigation, map-type toggle).
    fn add_control(&self, surface: SurfaceId, name: &str) -> Result<(), BackendError>;
}
