//! Hybrid provider adapter.
//!
//! Wraps the hybrid-imagery SDK whose runtime library is fetched
//! asynchronously, so mounting is a two-step sequence: load the library, then
//! create the surface. Teardown may land between the two steps; both awaits
//! are followed by a cancellation check so a torn-down adapter never attaches
//! a surface.
//!
//! # Visuals
//!
//! - Surface opens over the subcontinent view (center (20.5937, 78.9629),
//!   zoom 4, 45 degree tilt) with a map-type toggle control.
//! - Markers are circles, green normally and orange when highlighted.
//! - Info windows carry name, area, tree count, and a selection line; the
//!   window for the highlighted location is opened by the engine and all
//!   others are closed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{
    CameraMove, MapBackend, MarkerShape, MarkerSpec, MarkerStyle, OverlayContent, SurfaceConfig,
    SurfaceId,
};
use crate::location::{Location, LocationId};

use super::sync::{plan, AdapterResources, MarkerRecord};
use super::types::{MountConfig, ProviderError};
use super::DETAIL_ZOOM;

/// Initial camera center (India subcontinent view).
const REGION_CENTER: (f64, f64) = (20.5937, 78.9629);

/// Initial zoom for the regional view.
const REGION_ZOOM: f64 = 4.0;

/// Initial camera tilt in degrees.
const REGION_TILT: f64 = 45.0;

/// Basemap identifier for hybrid satellite imagery.
const BASEMAP_STYLE: &str = "satellite";

/// Name of the map-type toggle control attached after surface creation.
const MAP_TYPE_CONTROL: &str = "map-type-toggle";

/// Normal marker circle color.
const NORMAL_COLOR: &str = "#4CAF50";

/// Highlighted marker circle color.
const HIGHLIGHT_COLOR: &str = "#FF5733";

/// Adapter for the hybrid provider.
///
/// Owns at most one Rendering Surface and the Marker Set placed on it, plus
/// the open/closed state of the per-marker info windows.
pub struct HybridAdapter<B: MapBackend> {
    backend: Arc<B>,
    config: MountConfig,
    cancel: CancellationToken,
    state: tokio::sync::Mutex<AdapterResources>,
}

impl<B: MapBackend> HybridAdapter<B> {
    /// Create an unmounted adapter.
    pub fn new(backend: Arc<B>, config: MountConfig) -> Self {
        Self {
            backend,
            config,
            cancel: CancellationToken::new(),
            state: tokio::sync::Mutex::new(AdapterResources::default()),
        }
    }

    /// Load the runtime library, create the Rendering Surface, and run the
    /// initial reconciliation pass.
    ///
    /// Fails with [`ProviderError::CapabilityUnavailable`] when no credential
    /// is configured and [`ProviderError::InitializationFailure`] when either
    /// setup step is rejected. A teardown that lands during either await
    /// turns the rest of the mount into a stale no-op; any surface already
    /// created is destroyed.
    pub async fn mount(
        &self,
        locations: &[Location],
        highlight: Option<LocationId>,
    ) -> Result<(), ProviderError> {
        let credential = self
            .config
            .credential
            .clone()
            .ok_or(ProviderError::CapabilityUnavailable)?;

        self.backend
            .load_library(&credential)
            .await
            .map_err(|e| ProviderError::InitializationFailure(e.to_string()))?;
        if self.cancel.is_cancelled() {
            debug!("teardown arrived during library load; abandoning mount");
            return Ok(());
        }

        let surface_config = SurfaceConfig {
            container: self.config.container.clone(),
            height: self.config.height.clone(),
            center: REGION_CENTER,
            zoom: REGION_ZOOM,
            tilt: Some(REGION_TILT),
            basemap: BASEMAP_STYLE.to_string(),
        };
        let surface = self
            .backend
            .create_surface(&credential, surface_config)
            .await
            .map_err(|e| ProviderError::InitializationFailure(e.to_string()))?;

        if self.cancel.is_cancelled() {
            self.discard_surface(surface);
            return Ok(());
        }

        let mut state = self.state.lock().await;
        if state.torn_down {
            drop(state);
            self.discard_surface(surface);
            return Ok(());
        }
        if state.surface.is_some() {
            warn!("hybrid adapter mounted twice; discarding the extra surface");
            drop(state);
            self.discard_surface(surface);
            return Ok(());
        }

        state.surface = Some(surface);
        if let Err(e) = self.backend.add_control(surface, MAP_TYPE_CONTROL) {
            warn!(error = %e, "failed to attach map-type control");
        }
        self.apply(&mut state, locations, highlight);
        info!(markers = state.markers.len(), "hybrid map mounted");
        Ok(())
    }

    /// Bring the native markers and info windows in line with
    /// `(locations, highlight)`.
    ///
    /// Idempotent; a no-op before mount completes and after teardown.
    pub async fn reconcile(&self, locations: &[Location], highlight: Option<LocationId>) {
        let mut state = self.state.lock().await;
        if state.torn_down || state.surface.is_none() {
            return;
        }
        self.apply(&mut state, locations, highlight);
    }

    /// Close every info window, remove every marker, destroy the surface,
    /// and make all later calls no-ops. Idempotent; safe to call while a
    /// mount is in flight.
    pub async fn teardown(&self) {
        self.cancel.cancel();
        let mut state = self.state.lock().await;
        if state.torn_down {
            return;
        }
        state.torn_down = true;

        for (id, record) in state.markers.drain() {
            let _ = self.backend.close_overlay(record.handle);
            if let Err(e) = self.backend.remove_marker(record.handle) {
                debug!(location = %id, error = %e, "marker already gone during teardown");
            }
        }
        if let Some(surface) = state.surface.take() {
            if let Err(e) = self.backend.destroy_surface(surface) {
                debug!(error = %e, "surface already gone during teardown");
            }
            info!("hybrid map torn down");
        }
    }

    /// Whether the adapter currently owns a live surface.
    pub async fn is_mounted(&self) -> bool {
        self.state.lock().await.surface.is_some()
    }

    /// Whether teardown has completed.
    pub async fn is_torn_down(&self) -> bool {
        self.state.lock().await.torn_down
    }

    /// The live surface handle, if mounted.
    pub async fn surface(&self) -> Option<SurfaceId> {
        self.state.lock().await.surface
    }

    /// Location ids currently reconciled onto the surface.
    pub async fn marker_locations(&self) -> Vec<LocationId> {
        self.state.lock().await.markers.ids()
    }

    /// Native handle for one reconciled location.
    pub async fn marker_handle(&self, id: LocationId) -> Option<crate::backend::MarkerId> {
        self.state.lock().await.markers.get(id).map(|r| r.handle)
    }

    /// Highlight recorded by the last completed pass.
    pub async fn current_highlight(&self) -> Option<LocationId> {
        self.state.lock().await.highlight
    }

    fn discard_surface(&self, surface: SurfaceId) {
        debug!(surface = surface.0, "discarding surface from a stale mount");
        if let Err(e) = self.backend.destroy_surface(surface) {
            debug!(error = %e, "stale surface already destroyed");
        }
    }

    /// Apply one reconciliation pass to the owned resources.
    fn apply(
        &self,
        state: &mut AdapterResources,
        locations: &[Location],
        highlight: Option<LocationId>,
    ) {
        let surface = match state.surface {
            Some(surface) => surface,
            None => return,
        };
        let plan = plan(&state.markers, state.highlight, locations, highlight);
        let highlight_changed = state.highlight != highlight;

        for loc in &plan.skipped {
            warn!(location = %loc.id, "skipping invalid location entry");
        }

        for id in &plan.remove {
            if let Some(record) = state.markers.remove(*id) {
                let _ = self.backend.close_overlay(record.handle);
                if let Err(e) = self.backend.remove_marker(record.handle) {
                    debug!(location = %id, error = %e, "marker already removed");
                }
            }
        }

        for loc in &plan.create {
            let highlighted = Some(loc.id) == highlight;
            match self.backend.add_marker(surface, Self::marker_spec(loc, highlighted)) {
                Ok(handle) => {
                    state
                        .markers
                        .insert(loc.id, MarkerRecord { handle, highlighted });
                }
                Err(e) => {
                    warn!(location = %loc.id, error = %e, "skipping marker that failed to render");
                }
            }
        }

        for loc in &plan.restyle {
            let highlighted = Some(loc.id) == highlight;
            if let Some(record) = state.markers.get_mut(loc.id) {
                match self
                    .backend
                    .set_marker_style(record.handle, Self::marker_style(highlighted))
                {
                    Ok(()) => record.highlighted = highlighted,
                    Err(e) => warn!(location = %loc.id, error = %e, "marker restyle failed"),
                }
            }
        }

        for loc in &plan.refresh {
            let highlighted = Some(loc.id) == highlight;
            if let Some(record) = state.markers.get(loc.id) {
                if let Err(e) = self
                    .backend
                    .set_overlay_content(record.handle, Self::overlay_content(loc, highlighted))
                {
                    warn!(location = %loc.id, error = %e, "info window refresh failed");
                }
            }
        }

        // Info windows track the highlight: when it moves to a location, that
        // window opens and every other closes. Clearing the highlight leaves
        // windows as the user left them.
        if highlight_changed {
            if let Some(target) = highlight {
                for (id, record) in state.markers.iter() {
                    let result = if id == target {
                        self.backend.open_overlay(record.handle)
                    } else {
                        self.backend.close_overlay(record.handle)
                    };
                    if let Err(e) = result {
                        debug!(location = %id, error = %e, "info window toggle failed");
                    }
                }
            }
        }

        if let Some(target) = plan.camera {
            let motion = CameraMove {
                lat: target.lat,
                lng: target.lng,
                zoom: DETAIL_ZOOM,
                animated: true,
            };
            if let Err(e) = self.backend.move_camera(surface, motion) {
                warn!(location = %target.id, error = %e, "camera move failed");
            }
        }

        state.highlight = highlight;
    }

    fn marker_style(highlighted: bool) -> MarkerStyle {
        MarkerStyle {
            shape: MarkerShape::Circle,
            color: if highlighted { HIGHLIGHT_COLOR } else { NORMAL_COLOR }.to_string(),
        }
    }

    fn overlay_content(loc: &Location, highlighted: bool) -> OverlayContent {
        OverlayContent {
            heading: loc.name.clone(),
            area: loc.area.clone(),
            trees: loc.trees,
            selected: highlighted,
        }
    }

    fn marker_spec(loc: &Location, highlighted: bool) -> MarkerSpec {
        MarkerSpec {
            lat: loc.lat,
            lng: loc.lng,
            title: loc.name.clone(),
            style: Self::marker_style(highlighted),
            overlay: Self::overlay_content(loc, highlighted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;
    use crate::credential::Credential;

    fn mount_config() -> MountConfig {
        MountConfig {
            credential: Credential::new("hyb-test-key"),
            ..MountConfig::default()
        }
    }

    fn adapter(backend: &Arc<SimulatedBackend>) -> HybridAdapter<SimulatedBackend> {
        HybridAdapter::new(Arc::clone(backend), mount_config())
    }

    fn two_locations() -> Vec<Location> {
        vec![
            Location::new(1, "X", 10.0, 20.0),
            Location::new(2, "Y", -5.0, 30.0),
        ]
    }

    #[tokio::test]
    async fn test_mount_without_credential_skips_library_load() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = HybridAdapter::new(Arc::clone(&backend), MountConfig::default());

        let result = adapter.mount(&two_locations(), None).await;
        assert_eq!(result, Err(ProviderError::CapabilityUnavailable));
        assert_eq!(backend.counters().load_library, 0, "gate blocks all native calls");
    }

    #[tokio::test]
    async fn test_mount_loads_library_then_creates_surface() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        adapter.mount(&two_locations(), None).await.unwrap();

        let counters = backend.counters();
        assert_eq!(counters.load_library, 1);
        assert_eq!(counters.create_surface, 1);

        let surface = adapter.surface().await.unwrap();
        let config = backend.surface_config(surface).unwrap();
        assert_eq!(config.center, REGION_CENTER);
        assert_eq!(config.tilt, Some(REGION_TILT));
        assert_eq!(backend.controls(surface), vec![MAP_TYPE_CONTROL.to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_credential_is_initialization_failure() {
        let backend = Arc::new(SimulatedBackend::new());
        backend.reject_credential("hyb-test-key");
        let adapter = adapter(&backend);

        let result = adapter.mount(&two_locations(), None).await;
        assert!(matches!(result, Err(ProviderError::InitializationFailure(_))));
        assert!(!adapter.is_mounted().await);
        assert_eq!(backend.counters().create_surface, 0, "failure stops before surface setup");
    }

    #[tokio::test]
    async fn test_markers_are_circles() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        adapter.mount(&two_locations(), None).await.unwrap();

        let handle = adapter.marker_handle(LocationId(1)).await.unwrap();
        let style = backend.marker_style(handle).unwrap();
        assert_eq!(style.shape, MarkerShape::Circle);
        assert_eq!(style.color, NORMAL_COLOR);
    }

    #[tokio::test]
    async fn test_highlight_opens_its_window_and_closes_others() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        let locations = two_locations();
        adapter.mount(&locations, None).await.unwrap();
        let surface = adapter.surface().await.unwrap();

        adapter.reconcile(&locations, Some(LocationId(1))).await;
        let first = adapter.marker_handle(LocationId(1)).await.unwrap();
        assert_eq!(backend.open_overlays(surface), vec![first]);
        assert!(backend.overlay_content(first).unwrap().selected);

        adapter.reconcile(&locations, Some(LocationId(2))).await;
        let second = adapter.marker_handle(LocationId(2)).await.unwrap();
        assert_eq!(backend.open_overlays(surface), vec![second]);
        assert!(!backend.overlay_content(first).unwrap().selected);
    }

    #[tokio::test]
    async fn test_clearing_highlight_leaves_windows_alone() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        let locations = two_locations();
        adapter.mount(&locations, Some(LocationId(2))).await.unwrap();
        let surface = adapter.surface().await.unwrap();
        let second = adapter.marker_handle(LocationId(2)).await.unwrap();
        assert_eq!(backend.open_overlays(surface), vec![second]);

        adapter.reconcile(&locations, None).await;
        assert_eq!(
            backend.open_overlays(surface),
            vec![second],
            "null highlight does not force windows closed"
        );
        let moves = backend.camera_moves(surface);
        assert_eq!(moves.len(), 1, "no camera move on highlight clear");
    }

    #[tokio::test]
    async fn test_highlight_change_moves_camera_once() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        let locations = two_locations();
        adapter.mount(&locations, None).await.unwrap();
        let surface = adapter.surface().await.unwrap();

        adapter.reconcile(&locations, Some(LocationId(2))).await;
        adapter.reconcile(&locations, Some(LocationId(2))).await;

        let moves = backend.camera_moves(surface);
        assert_eq!(moves.len(), 1, "repeated highlight does not re-ease the camera");
        assert_eq!((moves[0].lat, moves[0].lng), (-5.0, 30.0));
        assert_eq!(moves[0].zoom, DETAIL_ZOOM);
        assert!(moves[0].animated);
    }

    #[tokio::test]
    async fn test_teardown_closes_windows_and_destroys_surface() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        let locations = two_locations();
        adapter.mount(&locations, Some(LocationId(1))).await.unwrap();
        let surface = adapter.surface().await.unwrap();

        adapter.teardown().await;
        assert!(backend.is_surface_destroyed(surface));
        assert!(backend.open_overlays(surface).is_empty());
        assert!(backend.live_markers(surface).is_empty());

        let after = backend.counters();
        adapter.teardown().await;
        assert_eq!(backend.counters(), after, "second teardown issues no native calls");
    }

    #[tokio::test]
    async fn test_teardown_during_library_load_abandons_mount() {
        let backend = Arc::new(SimulatedBackend::new());
        backend.set_latency(std::time::Duration::from_millis(50));
        let adapter = Arc::new(adapter(&backend));

        let mounting = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.mount(&two_locations(), None).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        adapter.teardown().await;

        mounting.await.unwrap().unwrap();
        assert!(backend.live_surfaces().is_empty(), "no surface may survive the teardown");
        assert!(!adapter.is_mounted().await);
    }
}
