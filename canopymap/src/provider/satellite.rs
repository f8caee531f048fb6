//! Satellite provider adapter.
//!
//! Wraps the globe-style satellite imagery SDK. The runtime library is
//! statically available, so mounting only needs to create the surface; there
//! is no asynchronous script-loading step.
//!
//! # Visuals
//!
//! - Surface opens on a world view (center (20, 0), zoom 1.5) with a
//!   navigation control in the top-right corner.
//! - Markers are green pins; the highlighted marker is recolored.
//! - Popups carry name, area, and tree count, and open on marker click only;
//!   the highlight selection does not open them.

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

/// Initial camera center for the world view.
const WORLD_CENTER: (f64, f64) = (20.0, 0.0);

/// Initial zoom for the world view.
const WORLD_ZOOM: f64 = 1.5;

/// Basemap style identifier for satellite imagery.
const BASEMAP_STYLE: &str = "satellite-v9";

/// Name of the navigation control attached after surface creation.
const NAV_CONTROL: &str = "navigation";

/// Normal marker pin color.
const NORMAL_COLOR: &str = "#4CAF50";

/// Highlighted marker pin color.
const HIGHLIGHT_COLOR: &str = "#FF5733";

/// Adapter for the satellite provider.
///
/// Owns at most one Rendering Surface and the Marker Set placed on it. All
/// state is behind an async mutex so reconciliation passes for one instance
/// never interleave; a cancellation token lets teardown race an in-flight
/// mount safely.
pub struct SatelliteAdapter<B: MapBackend> {
    backend: Arc<B>,
    config: MountConfig,
    cancel: CancellationToken,
    state: tokio::sync::Mutex<AdapterResources>,
}

impl<B: MapBackend> SatelliteAdapter<B> {
    /// Create an unmounted adapter.
    pub fn new(backend: Arc<B>, config: MountConfig) -> Self {
        Self {
            backend,
            config,
            cancel: CancellationToken::new(),
            state: tokio::sync::Mutex::new(AdapterResources::default()),
        }
    }

    /// Create the Rendering Surface and run the initial reconciliation pass.
    ///
    /// Fails with [`ProviderError::CapabilityUnavailable`] when no credential
    /// is configured and [`ProviderError::InitializationFailure`] when the
    /// backend rejects setup. If teardown was requested while the surface was
    /// being created, the completed surface is destroyed instead of attached
    /// and the mount returns `Ok` as a stale no-op.
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

        let surface_config = SurfaceConfig {
            container: self.config.container.clone(),
            height: self.config.height.clone(),
            center: WORLD_CENTER,
            zoom: WORLD_ZOOM,
            tilt: None,
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
            warn!("satellite adapter mounted twice; discarding the extra surface");
            drop(state);
            self.discard_surface(surface);
            return Ok(());
        }

        state.surface = Some(surface);
        if let Err(e) = self.backend.add_control(surface, NAV_CONTROL) {
            warn!(error = %e, "failed to attach navigation control");
        }
        self.apply(&mut state, locations, highlight);
        info!(markers = state.markers.len(), "satellite map mounted");
        Ok(())
    }

    /// Bring the native markers in line with `(locations, highlight)`.
    ///
    /// Idempotent; a no-op before mount completes and after teardown.
    pub async fn reconcile(&self, locations: &[Location], highlight: Option<LocationId>) {
        let mut state = self.state.lock().await;
        if state.torn_down || state.surface.is_none() {
            return;
        }
        self.apply(&mut state, locations, highlight);
    }

    /// Remove every marker, destroy the surface, and make all later calls
    /// no-ops. Idempotent; safe to call while a mount is in flight.
    pub async fn teardown(&self) {
        self.cancel.cancel();
        let mut state = self.state.lock().await;
        if state.torn_down {
            return;
        }
        state.torn_down = true;

        for (id, record) in state.markers.drain() {
            // The backend may have dropped the marker with the surface
            // already; stale handles are expected here.
            if let Err(e) = self.backend.remove_marker(record.handle) {
                debug!(location = %id, error = %e, "marker already gone during teardown");
            }
        }
        if let Some(surface) = state.surface.take() {
            if let Err(e) = self.backend.destroy_surface(surface) {
                debug!(error = %e, "surface already gone during teardown");
            }
            info!("satellite map torn down");
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
            match self.backend.add_marker(surface, self.marker_spec(loc, highlighted)) {
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
            if let Some(record) = state.markers.get(loc.id) {
                if let Err(e) = self
                    .backend
                    .set_overlay_content(record.handle, Self::overlay_content(loc))
                {
                    warn!(location = %loc.id, error = %e, "overlay refresh failed");
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
            shape: MarkerShape::Pin,
            color: if highlighted { HIGHLIGHT_COLOR } else { NORMAL_COLOR }.to_string(),
        }
    }

    fn overlay_content(loc: &Location) -> OverlayContent {
        OverlayContent {
            heading: loc.name.clone(),
            area: loc.area.clone(),
            trees: loc.trees,
            // Popups on this provider open on marker click only and carry no
            // selection line.
            selected: false,
        }
    }

    fn marker_spec(&self, loc: &Location, highlighted: bool) -> MarkerSpec {
        MarkerSpec {
            lat: loc.lat,
            lng: loc.lng,
            title: loc.name.clone(),
            style: Self::marker_style(highlighted),
            overlay: Self::overlay_content(loc),
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
            credential: Credential::new("pk.sat-test"),
            ..MountConfig::default()
        }
    }

    fn adapter(backend: &Arc<SimulatedBackend>) -> SatelliteAdapter<SimulatedBackend> {
        SatelliteAdapter::new(Arc::clone(backend), mount_config())
    }

    fn two_locations() -> Vec<Location> {
        vec![
            Location::new(1, "X", 10.0, 20.0),
            Location::new(2, "Y", -5.0, 30.0),
        ]
    }

    #[tokio::test]
    async fn test_mount_without_credential_is_capability_unavailable() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = SatelliteAdapter::new(Arc::clone(&backend), MountConfig::default());

        let result = adapter.mount(&two_locations(), None).await;
        assert_eq!(result, Err(ProviderError::CapabilityUnavailable));
        assert_eq!(backend.counters().create_surface, 0, "gate blocks all native calls");
    }

    #[tokio::test]
    async fn test_mount_surface_failure_is_initialization_failure() {
        let backend = Arc::new(SimulatedBackend::new());
        backend.fail_next_surface_creation();
        let adapter = adapter(&backend);

        let result = adapter.mount(&two_locations(), None).await;
        assert!(matches!(result, Err(ProviderError::InitializationFailure(_))));
        assert!(!adapter.is_mounted().await);
    }

    #[tokio::test]
    async fn test_mount_populates_markers_and_world_view() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        adapter.mount(&two_locations(), None).await.unwrap();

        let surface = adapter.surface().await.unwrap();
        assert_eq!(adapter.marker_locations().await, vec![LocationId(1), LocationId(2)]);
        assert_eq!(backend.live_markers(surface).len(), 2);
        assert_eq!(backend.controls(surface), vec![NAV_CONTROL.to_string()]);

        let config = backend.surface_config(surface).unwrap();
        assert_eq!(config.center, WORLD_CENTER);
        assert_eq!(config.basemap, BASEMAP_STYLE);
        assert!(backend.camera_moves(surface).is_empty(), "no highlight, no camera move");
    }

    #[tokio::test]
    async fn test_reconcile_before_mount_is_noop() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);

        adapter.reconcile(&two_locations(), Some(LocationId(1))).await;
        assert_eq!(backend.counters(), Default::default());
    }

    #[tokio::test]
    async fn test_highlight_flip_recolors_only_that_marker() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        let locations = two_locations();
        adapter.mount(&locations, None).await.unwrap();

        adapter.reconcile(&locations, Some(LocationId(2))).await;

        let first = adapter.marker_handle(LocationId(1)).await.unwrap();
        let second = adapter.marker_handle(LocationId(2)).await.unwrap();
        assert_eq!(backend.marker_style(first).unwrap().color, NORMAL_COLOR);
        assert_eq!(backend.marker_style(second).unwrap().color, HIGHLIGHT_COLOR);

        let surface = adapter.surface().await.unwrap();
        let moves = backend.camera_moves(surface);
        assert_eq!(moves.len(), 1, "exactly one camera move per pass");
        assert_eq!((moves[0].lat, moves[0].lng), (-5.0, 30.0));
        assert_eq!(moves[0].zoom, DETAIL_ZOOM);
        assert!(moves[0].animated);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        let locations = two_locations();
        adapter.mount(&locations, Some(LocationId(2))).await.unwrap();

        let after_mount = backend.counters();
        adapter.reconcile(&locations, Some(LocationId(2))).await;
        let after_repeat = backend.counters();

        assert_eq!(after_repeat.add_marker, after_mount.add_marker);
        assert_eq!(after_repeat.remove_marker, after_mount.remove_marker);
        assert_eq!(after_repeat.set_marker_style, after_mount.set_marker_style);
        assert_eq!(after_repeat.move_camera, after_mount.move_camera);
    }

    #[tokio::test]
    async fn test_removed_location_leaves_others_untouched() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        adapter.mount(&two_locations(), None).await.unwrap();
        let kept = adapter.marker_handle(LocationId(2)).await.unwrap();

        let remaining = vec![Location::new(2, "Y", -5.0, 30.0)];
        adapter.reconcile(&remaining, None).await;

        assert_eq!(adapter.marker_locations().await, vec![LocationId(2)]);
        assert_eq!(
            adapter.marker_handle(LocationId(2)).await,
            Some(kept),
            "retained marker is not recreated"
        );
        let surface = adapter.surface().await.unwrap();
        assert!(backend.camera_moves(surface).is_empty(), "no camera churn");
    }

    #[tokio::test]
    async fn test_per_marker_failure_does_not_abort_pass() {
        let backend = Arc::new(SimulatedBackend::new());
        backend.fail_markers_at(10.0, 20.0);
        let adapter = adapter(&backend);

        adapter.mount(&two_locations(), None).await.unwrap();
        assert_eq!(
            adapter.marker_locations().await,
            vec![LocationId(2)],
            "one bad location must not blank the map"
        );
        assert!(adapter.is_mounted().await);
    }

    #[tokio::test]
    async fn test_teardown_is_final_and_idempotent() {
        let backend = Arc::new(SimulatedBackend::new());
        let adapter = adapter(&backend);
        adapter.mount(&two_locations(), None).await.unwrap();
        let surface = adapter.surface().await.unwrap();

        adapter.teardown().await;
        assert!(backend.is_surface_destroyed(surface));
        assert!(adapter.is_torn_down().await);

        let after = backend.counters();
        adapter.teardown().await;
        adapter.reconcile(&two_locations(), Some(LocationId(1))).await;
        assert_eq!(backend.counters(), after, "post-teardown calls are no-ops");
    }

    #[tokio::test]
    async fn test_teardown_before_mount_completion_discards_surface() {
        let backend = Arc::new(SimulatedBackend::new());
        backend.set_latency(std::time::Duration::from_millis(50));
        let adapter = Arc::new(adapter(&backend));

        let mounting = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.mount(&two_locations(), None).await })
        };
        // Let the mount reach the backend await, then cancel it.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        adapter.teardown().await;

        mounting.await.unwrap().unwrap();
        assert!(backend.live_surfaces().is_empty(), "stale mount destroyed its surface");
        assert!(!adapter.is_mounted().await);
    }
}
