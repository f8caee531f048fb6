//! In-memory simulated map backend.
//!
//! Stands in for a native mapping SDK: every operation is recorded so tests
//! and the CLI demo can observe exactly which native calls the engine issued.
//! Supports failure injection (rejected credentials, one-shot surface
//! creation failure, per-coordinate marker failures) and configurable latency
//! on the asynchronous operations, which is how tests exercise
//! teardown-during-mount races.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::credential::Credential;

use super::{
    BackendError, CameraMove, MapBackend, MarkerId, MarkerSpec, MarkerStyle, OverlayContent,
    SurfaceConfig, SurfaceId,
};

/// Per-method invocation counts, including failed invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub load_library: u64,
    pub create_surface: u64,
    pub destroy_surface: u64,
    pub add_marker: u64,
    pub set_marker_style: u64,
    pub set_overlay_content: u64,
    pub open_overlay: u64,
    pub close_overlay: u64,
    pub remove_marker: u64,
    pub move_camera: u64,
    pub add_control: u64,
}

#[derive(Debug)]
struct SurfaceRecord {
    config: SurfaceConfig,
    destroyed: bool,
    controls: Vec<String>,
    camera: Vec<CameraMove>,
}

#[derive(Debug)]
struct MarkerRecord {
    surface: SurfaceId,
    spec: MarkerSpec,
    overlay_open: bool,
    removed: bool,
}

#[derive(Default)]
struct Inner {
    next_surface: u64,
    next_marker: u64,
    surfaces: BTreeMap<SurfaceId, SurfaceRecord>,
    markers: BTreeMap<MarkerId, MarkerRecord>,
    counters: CallCounters,
    rejected_credentials: HashSet<String>,
    fail_next_surface: bool,
    failing_marker_coords: Vec<(f64, f64)>,
    latency: Option<Duration>,
}

/// Simulated native mapping SDK.
///
/// Cheap to share behind an `Arc`; all state is interior.
#[derive(Default)]
pub struct SimulatedBackend {
    inner: Mutex<Inner>,
}

impl SimulatedBackend {
    /// Create a backend with no injected failures and no latency.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Failure injection ────────────────────────────────────────────────

    /// Reject this credential value in `load_library` and `create_surface`.
    pub fn reject_credential(&self, value: &str) {
        self.inner.lock().rejected_credentials.insert(value.to_string());
    }

    /// Fail the next `create_surface` call, then behave normally again.
    pub fn fail_next_surface_creation(&self) {
        self.inner.lock().fail_next_surface = true;
    }

    /// Fail `add_marker` for markers at exactly these coordinates.
    pub fn fail_markers_at(&self, lat: f64, lng: f64) {
        self.inner.lock().failing_marker_coords.push((lat, lng));
    }

    /// Apply this latency to the asynchronous operations.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().latency = Some(latency);
    }

    // ── Observations ─────────────────────────────────────────────────────

    /// Snapshot of per-method call counts.
    pub fn counters(&self) -> CallCounters {
        self.inner.lock().counters
    }

    /// Surfaces that have been created and not destroyed.
    pub fn live_surfaces(&self) -> Vec<SurfaceId> {
        self.inner
            .lock()
            .surfaces
            .iter()
            .filter(|(_, s)| !s.destroyed)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether a surface has been destroyed.
    pub fn is_surface_destroyed(&self, surface: SurfaceId) -> bool {
        self.inner
            .lock()
            .surfaces
            .get(&surface)
            .map(|s| s.destroyed)
            .unwrap_or(false)
    }

    /// The configuration a surface was created with.
    pub fn surface_config(&self, surface: SurfaceId) -> Option<SurfaceConfig> {
        self.inner
            .lock()
            .surfaces
            .get(&surface)
            .map(|s| s.config.clone())
    }

    /// Controls attached to a surface, in attachment order.
    pub fn controls(&self, surface: SurfaceId) -> Vec<String> {
        self.inner
            .lock()
            .surfaces
            .get(&surface)
            .map(|s| s.controls.clone())
            .unwrap_or_default()
    }

    /// Every camera move issued against a surface, in order.
    pub fn camera_moves(&self, surface: SurfaceId) -> Vec<CameraMove> {
        self.inner
            .lock()
            .surfaces
            .get(&surface)
            .map(|s| s.camera.clone())
            .unwrap_or_default()
    }

    /// Markers currently live on a surface.
    pub fn live_markers(&self, surface: SurfaceId) -> Vec<MarkerId> {
        self.inner
            .lock()
            .markers
            .iter()
            .filter(|(_, m)| m.surface == surface && !m.removed)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Position of a live marker.
    pub fn marker_position(&self, marker: MarkerId) -> Option<(f64, f64)> {
        let inner = self.inner.lock();
        let record = inner.markers.get(&marker)?;
        (!record.removed).then_some((record.spec.lat, record.spec.lng))
    }

    /// Current style of a live marker.
    pub fn marker_style(&self, marker: MarkerId) -> Option<MarkerStyle> {
        let inner = self.inner.lock();
        let record = inner.markers.get(&marker)?;
        (!record.removed).then(|| record.spec.style.clone())
    }

    /// Current overlay content of a live marker.
    pub fn overlay_content(&self, marker: MarkerId) -> Option<OverlayContent> {
        let inner = self.inner.lock();
        let record = inner.markers.get(&marker)?;
        (!record.removed).then(|| record.spec.overlay.clone())
    }

    /// Markers on a surface whose overlay is currently open.
    pub fn open_overlays(&self, surface: SurfaceId) -> Vec<MarkerId> {
        self.inner
            .lock()
            .markers
            .iter()
            .filter(|(_, m)| m.surface == surface && !m.removed && m.overlay_open)
            .map(|(id, _)| *id)
            .collect()
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn latency(&self) -> Option<Duration> {
        self.inner.lock().latency
    }

    fn check_credential(inner: &Inner, credential: &Credential) -> Result<(), BackendError> {
        if inner.rejected_credentials.contains(credential.expose()) {
            Err(BackendError::Unavailable("credential rejected".into()))
        } else {
            Ok(())
        }
    }

    fn live_marker_mut<'a>(
        inner: &'a mut Inner,
        marker: MarkerId,
    ) -> Result<&'a mut MarkerRecord, BackendError> {
        match inner.markers.get_mut(&marker) {
            Some(record) if !record.removed => Ok(record),
            _ => Err(BackendError::StaleHandle),
        }
    }
}

impl MapBackend for SimulatedBackend {
    async fn load_library(&self, credential: &Credential) -> Result<(), BackendError> {
        if let Some(latency) = self.latency() {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.inner.lock();
        inner.counters.load_library += 1;
        Self::check_credential(&inner, credential)
    }

    async fn create_surface(
        &self,
        credential: &Credential,
        config: SurfaceConfig,
    ) -> Result<SurfaceId, BackendError> {
        if let Some(latency) = self.latency() {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.inner.lock();
        inner.counters.create_surface += 1;
        Self::check_credential(&inner, credential)?;
        if inner.fail_next_surface {
            inner.fail_next_surface = false;
            return Err(BackendError::Unavailable("simulated setup failure".into()));
        }

        inner.next_surface += 1;
        let id = SurfaceId(inner.next_surface);
        debug!(surface = id.0, container = %config.container, "surface created");
        inner.surfaces.insert(
            id,
            SurfaceRecord {
                config,
                destroyed: false,
                controls: Vec::new(),
                camera: Vec::new(),
            },
        );
        Ok(id)
    }

    fn destroy_surface(&self, surface: SurfaceId) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.destroy_surface += 1;
        let inner = &mut *inner;
        match inner.surfaces.get_mut(&surface) {
            Some(record) if !record.destroyed => {
                record.destroyed = true;
                // Destroying a surface takes its markers with it.
                for marker in inner.markers.values_mut() {
                    if marker.surface == surface {
                        marker.removed = true;
                        marker.overlay_open = false;
                    }
                }
                debug!(surface = surface.0, "surface destroyed");
                Ok(())
            }
            _ => Err(BackendError::StaleHandle),
        }
    }

    fn add_marker(&self, surface: SurfaceId, spec: MarkerSpec) -> Result<MarkerId, BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.add_marker += 1;
        match inner.surfaces.get(&surface) {
            Some(record) if !record.destroyed => {}
            _ => return Err(BackendError::StaleHandle),
        }
        if inner
            .failing_marker_coords
            .iter()
            .any(|&(lat, lng)| lat == spec.lat && lng == spec.lng)
        {
            return Err(BackendError::MarkerRender(format!(
                "simulated failure at ({}, {})",
                spec.lat, spec.lng
            )));
        }

        inner.next_marker += 1;
        let id = MarkerId(inner.next_marker);
        inner.markers.insert(
            id,
            MarkerRecord {
                surface,
                spec,
                overlay_open: false,
                removed: false,
            },
        );
        Ok(id)
    }

    fn set_marker_style(&self, marker: MarkerId, style: MarkerStyle) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.set_marker_style += 1;
        Self::live_marker_mut(&mut inner, marker)?.spec.style = style;
        Ok(())
    }

    fn set_overlay_content(
        &self,
        marker: MarkerId,
        content: OverlayContent,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.set_overlay_content += 1;
        Self::live_marker_mut(&mut inner, marker)?.spec.overlay = content;
        Ok(())
    }

    fn open_overlay(&self, marker: MarkerId) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.open_overlay += 1;
        Self::live_marker_mut(&mut inner, marker)?.overlay_open = true;
        Ok(())
    }

    fn close_overlay(&self, marker: MarkerId) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.close_overlay += 1;
        Self::live_marker_mut(&mut inner, marker)?.overlay_open = false;
        Ok(())
    }

    fn remove_marker(&self, marker: MarkerId) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.remove_marker += 1;
        let record = Self::live_marker_mut(&mut inner, marker)?;
        record.removed = true;
        record.overlay_open = false;
        Ok(())
    }

    fn move_camera(&self, surface: SurfaceId, motion: CameraMove) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.move_camera += 1;
        match inner.surfaces.get_mut(&surface) {
            Some(record) if !record.destroyed => {
                record.camera.push(motion);
                Ok(())
            }
            _ => Err(BackendError::StaleHandle),
        }
    }

    fn add_control(&self, surface: SurfaceId, name: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.counters.add_control += 1;
        match inner.surfaces.get_mut(&surface) {
            Some(record) if !record.destroyed => {
                record.controls.push(name.to_string());
                Ok(())
            }
            _ => Err(BackendError::StaleHandle),
        }
    }
}
