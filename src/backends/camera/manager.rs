// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend lifecycle manager
//!
//! The manager provides:
//! - Ownership of the active backend behind a lock
//! - Backend replacement at runtime
//! - Logging around every host call

use super::types::*;
use super::{BackendOptions, MediaBackend, MediaStream, get_backend_for_type};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Internal manager state
struct ManagerState {
    /// The active backend instance
    backend: Box<dyn MediaBackend>,
    /// Backend type
    backend_type: CameraBackendType,
}

/// Camera backend manager
///
/// Thread-safe and can be shared across threads.
#[derive(Clone)]
pub struct CameraBackendManager {
    state: Arc<Mutex<ManagerState>>,
    options: BackendOptions,
}

impl CameraBackendManager {
    /// Create a new backend manager
    pub fn new(backend_type: CameraBackendType, options: BackendOptions) -> Self {
        info!(backend = %backend_type, "Creating camera backend manager");

        let backend = get_backend_for_type(backend_type, &options);
        Self::from_parts(backend, backend_type, options)
    }

    /// Wrap an already constructed backend
    pub fn with_backend(backend: Box<dyn MediaBackend>) -> Self {
        let backend_type = backend.backend_type();
        info!(backend = %backend_type, "Wrapping camera backend");
        Self::from_parts(backend, backend_type, BackendOptions::default())
    }

    fn from_parts(
        backend: Box<dyn MediaBackend>,
        backend_type: CameraBackendType,
        options: BackendOptions,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManagerState {
                backend,
                backend_type,
            })),
            options,
        }
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the backend type
    pub fn backend_type(&self) -> CameraBackendType {
        self.state().backend_type
    }

    /// Probe host capabilities
    pub fn capabilities(&self) -> HostCapabilities {
        let caps = self.state().backend.capabilities();
        debug!(?caps, "Probed host capabilities");
        caps
    }

    /// Enumerate all input devices
    pub fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>> {
        let devices = self.state().backend.enumerate_devices()?;
        debug!(count = devices.len(), "Enumerated devices");
        Ok(devices)
    }

    /// Open a stream
    pub fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn MediaStream>> {
        info!(%constraints, "Requesting camera stream");

        let result = self.state().backend.open_stream(constraints);
        match &result {
            Ok(stream) => info!(stream = stream.id(), device = stream.device_id(), "Stream opened"),
            Err(e) => warn!(error = %e, "Stream request rejected"),
        }
        result
    }

    /// Subscribe to device hotplug notifications
    pub fn watch_device_changes(&self) -> Option<DeviceChangeReceiver> {
        self.state().backend.watch_device_changes()
    }

    /// Change backend type
    ///
    /// Streams opened on the old backend stay valid until they are stopped.
    pub fn change_backend(&self, new_backend_type: CameraBackendType) {
        info!(old = %self.backend_type(), new = %new_backend_type, "Changing backend");

        let new_backend = get_backend_for_type(new_backend_type, &self.options);
        let mut state = self.state();
        state.backend = new_backend;
        state.backend_type = new_backend_type;
    }
}

impl std::fmt::Debug for CameraBackendManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("CameraBackendManager")
            .field("backend_type", &state.backend_type)
            .field("capabilities", &state.backend.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_backend() {
        let manager = CameraBackendManager::new(CameraBackendType::Virtual, BackendOptions::default());
        assert_eq!(manager.backend_type(), CameraBackendType::Virtual);

        let devices = manager.enumerate_devices().unwrap();
        assert_eq!(devices.len(), 2);

        manager.change_backend(CameraBackendType::Virtual);
        assert_eq!(manager.backend_type(), CameraBackendType::Virtual);
    }
}
