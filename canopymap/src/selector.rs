//! Provider selector.
//!
//! Holds the application-facing state machine over the two provider
//! adapters: which provider is active, the current location list and
//! highlight, and the per-provider credentials. Switching providers tears
//! the old adapter down completely before the new one mounts, so at most one
//! adapter owns native resources at any time.
//!
//! Mounts run on a spawned task; the selector hands back a [`MountHandle`]
//! so callers can await completion when they care about the result.
//! Switching again while a mount is still in flight is safe: the old
//! adapter's cancellation token turns the stale mount into a self-cleaning
//! no-op.
//!
//! The desired state lives behind a shared lock stamped with an epoch
//! counter. A mount task reads it at every step rather than capturing a
//! snapshot, and after mounting it re-reconciles until the epoch is stable,
//! so location or highlight changes that arrive while the mount is in
//! flight land on the map instead of being dropped.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use canopymap::backend::SimulatedBackend;
//! use canopymap::location::demo_locations;
//! use canopymap::provider::ProviderKind;
//! use canopymap::selector::{MapSelector, SelectorConfig};
//!
//! let backend = Arc::new(SimulatedBackend::new());
//! let mut selector = MapSelector::new(backend, SelectorConfig::default());
//! selector.set_locations(demo_locations()).await;
//! if let Some(mount) = selector.switch_provider(ProviderKind::Satellite).await {
//!     mount.completed().await?;
//! }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::MapBackend;
use crate::credential::Credential;
use crate::location::{Location, LocationId};
use crate::provider::{HybridAdapter, MountConfig, ProviderError, ProviderKind, SatelliteAdapter};

/// Selector-level configuration: the shared surface geometry plus one
/// optional credential per provider.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Identifier of the host container surfaces render into.
    pub container: String,
    /// CSS height of the surfaces.
    pub height: String,
    /// Credential for the satellite provider.
    pub satellite_credential: Option<Credential>,
    /// Credential for the hybrid provider.
    pub hybrid_credential: Option<Credential>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: "map-root".to_string(),
            height: "500px".to_string(),
            satellite_credential: None,
            hybrid_credential: None,
        }
    }
}

impl SelectorConfig {
    fn credential_for(&self, kind: ProviderKind) -> Option<Credential> {
        match kind {
            ProviderKind::Satellite => self.satellite_credential.clone(),
            ProviderKind::Hybrid => self.hybrid_credential.clone(),
        }
    }

    fn mount_config(&self, kind: ProviderKind) -> MountConfig {
        MountConfig {
            container: self.container.clone(),
            height: self.height.clone(),
            credential: self.credential_for(kind),
        }
    }
}

/// The caller-owned desired state, stamped with an epoch that increases on
/// every mutation so in-flight mount tasks can detect changes they raced.
#[derive(Debug, Default)]
struct DesiredState {
    locations: Vec<Location>,
    highlight: Option<LocationId>,
    epoch: u64,
}

impl DesiredState {
    fn snapshot(&self) -> (u64, Vec<Location>, Option<LocationId>) {
        (self.epoch, self.locations.clone(), self.highlight)
    }
}

/// Handle to a mount task spawned by the selector.
pub struct MountHandle {
    generation: u64,
    handle: JoinHandle<Result<(), ProviderError>>,
}

impl MountHandle {
    /// Monotonic instance counter of the adapter being mounted. Later
    /// switches produce strictly greater generations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the mount task to finish and return its result.
    pub async fn completed(self) -> Result<(), ProviderError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ProviderError::InitializationFailure(format!(
                "mount task failed: {e}"
            ))),
        }
    }
}

enum ActiveAdapter<B: MapBackend> {
    Satellite(Arc<SatelliteAdapter<B>>),
    Hybrid(Arc<HybridAdapter<B>>),
}

impl<B: MapBackend> Clone for ActiveAdapter<B> {
    fn clone(&self) -> Self {
        match self {
            ActiveAdapter::Satellite(adapter) => ActiveAdapter::Satellite(Arc::clone(adapter)),
            ActiveAdapter::Hybrid(adapter) => ActiveAdapter::Hybrid(Arc::clone(adapter)),
        }
    }
}

impl<B: MapBackend> ActiveAdapter<B> {
    fn kind(&self) -> ProviderKind {
        match self {
            ActiveAdapter::Satellite(_) => ProviderKind::Satellite,
            ActiveAdapter::Hybrid(_) => ProviderKind::Hybrid,
        }
    }

    async fn mount(
        &self,
        locations: &[Location],
        highlight: Option<LocationId>,
    ) -> Result<(), ProviderError> {
        match self {
            ActiveAdapter::Satellite(adapter) => adapter.mount(locations, highlight).await,
            ActiveAdapter::Hybrid(adapter) => adapter.mount(locations, highlight).await,
        }
    }

    async fn reconcile(&self, locations: &[Location], highlight: Option<LocationId>) {
        match self {
            ActiveAdapter::Satellite(adapter) => adapter.reconcile(locations, highlight).await,
            ActiveAdapter::Hybrid(adapter) => adapter.reconcile(locations, highlight).await,
        }
    }

    async fn teardown(&self) {
        match self {
            ActiveAdapter::Satellite(adapter) => adapter.teardown().await,
            ActiveAdapter::Hybrid(adapter) => adapter.teardown().await,
        }
    }
}

/// The provider selector state machine.
///
/// Owns the desired state (locations, highlight, credentials) and at most
/// one active adapter instance. Every mutation that affects the map
/// forwards a reconciliation pass to the active adapter.
pub struct MapSelector<B: MapBackend> {
    backend: Arc<B>,
    config: SelectorConfig,
    desired: Arc<Mutex<DesiredState>>,
    active: Option<(u64, ActiveAdapter<B>)>,
    generation: u64,
}

impl<B: MapBackend> MapSelector<B> {
    /// Create a selector with no active provider.
    pub fn new(backend: Arc<B>, config: SelectorConfig) -> Self {
        Self {
            backend,
            config,
            desired: Arc::new(Mutex::new(DesiredState::default())),
            active: None,
            generation: 0,
        }
    }

    /// The currently selected provider, if any.
    pub fn provider(&self) -> Option<ProviderKind> {
        self.active.as_ref().map(|(_, adapter)| adapter.kind())
    }

    /// Current highlight selection.
    pub fn highlight(&self) -> Option<LocationId> {
        self.desired.lock().highlight
    }

    /// Current location list.
    pub fn locations(&self) -> Vec<Location> {
        self.desired.lock().locations.clone()
    }

    /// Whether a credential is configured for a provider. Never exposes the
    /// value.
    pub fn has_credential(&self, kind: ProviderKind) -> bool {
        self.config.credential_for(kind).is_some()
    }

    /// Replace the location list and reconcile the active map.
    pub async fn set_locations(&mut self, locations: Vec<Location>) {
        {
            let mut desired = self.desired.lock();
            desired.locations = locations;
            desired.epoch += 1;
        }
        self.render().await;
    }

    /// Change the highlight selection and reconcile the active map.
    pub async fn set_highlight(&mut self, highlight: Option<LocationId>) {
        {
            let mut desired = self.desired.lock();
            desired.highlight = highlight;
            desired.epoch += 1;
        }
        self.render().await;
    }

    /// Forward one reconciliation pass to the active adapter. A no-op when
    /// no provider is active; if the provider's mount is still in flight,
    /// the mount task picks this state change up once the surface exists.
    pub async fn render(&self) {
        if let Some((_, adapter)) = &self.active {
            let (_, locations, highlight) = self.desired.lock().snapshot();
            adapter.reconcile(&locations, highlight).await;
        }
    }

    /// Select a provider, tearing down the previous one first.
    ///
    /// Re-selecting the active provider is a no-op and returns `None`.
    /// Otherwise the old adapter (if any) is fully torn down, a fresh
    /// instance is constructed, and its mount is spawned; the returned
    /// [`MountHandle`] resolves when the mount finishes.
    pub async fn switch_provider(&mut self, kind: ProviderKind) -> Option<MountHandle> {
        if self.provider() == Some(kind) {
            debug!(provider = %kind, "provider already active");
            return None;
        }
        if let Some((generation, old)) = self.active.take() {
            info!(provider = %old.kind(), generation, "tearing down previous provider");
            old.teardown().await;
        }
        Some(self.mount_fresh(kind))
    }

    /// Store a credential for a provider.
    ///
    /// If that provider is active its current instance is torn down and a
    /// fresh mount is spawned with the new credential, which is how a mount
    /// blocked on [`ProviderError::CapabilityUnavailable`] is retried.
    pub async fn set_credential(
        &mut self,
        kind: ProviderKind,
        credential: Credential,
    ) -> Option<MountHandle> {
        match kind {
            ProviderKind::Satellite => self.config.satellite_credential = Some(credential),
            ProviderKind::Hybrid => self.config.hybrid_credential = Some(credential),
        }
        if self.provider() != Some(kind) {
            return None;
        }
        if let Some((generation, old)) = self.active.take() {
            debug!(provider = %kind, generation, "remounting with new credential");
            old.teardown().await;
        }
        Some(self.mount_fresh(kind))
    }

    /// Tear down the active provider, leaving the selector empty.
    pub async fn shutdown(&mut self) {
        if let Some((generation, adapter)) = self.active.take() {
            info!(provider = %adapter.kind(), generation, "shutting down selector");
            adapter.teardown().await;
        }
    }

    fn mount_fresh(&mut self, kind: ProviderKind) -> MountHandle {
        self.generation += 1;
        let generation = self.generation;
        let mount_config = self.config.mount_config(kind);

        let adapter = match kind {
            ProviderKind::Satellite => ActiveAdapter::Satellite(Arc::new(SatelliteAdapter::new(
                Arc::clone(&self.backend),
                mount_config,
            ))),
            ProviderKind::Hybrid => ActiveAdapter::Hybrid(Arc::new(HybridAdapter::new(
                Arc::clone(&self.backend),
                mount_config,
            ))),
        };

        let task = adapter.clone();
        let desired = Arc::clone(&self.desired);
        let handle = tokio::spawn(async move {
            let (_, locations, highlight) = desired.lock().snapshot();
            task.mount(&locations, highlight).await?;

            // State changes that arrived while the mount was in flight hit a
            // reconcile no-op (no surface yet). Re-reconcile until the epoch
            // is stable so none of them are dropped.
            loop {
                let (epoch, locations, highlight) = desired.lock().snapshot();
                task.reconcile(&locations, highlight).await;
                if desired.lock().epoch == epoch {
                    break;
                }
            }
            Ok(())
        });

        info!(provider = %kind, generation, "mounting provider");
        self.active = Some((generation, adapter));
        MountHandle { generation, handle }
    }
}

impl<B: MapBackend> Drop for MapSelector<B> {
    fn drop(&mut self) {
        if self.active.is_some() {
            warn!("selector dropped with an active provider; call shutdown() first");
        }
    }
}
