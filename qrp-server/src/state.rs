use std::sync::Arc;

use once_cell::sync::OnceCell;
use qrp_blob::StoreError;

use crate::error::ApiError;
use crate::services::images::ImageService;
use crate::services::projects::ProjectsTable;
use crate::services::roles::RoleRegistry;

/// Process-wide application state shared by all requests.
///
/// The image service lives in a set-once cell: it stays empty when the store
/// open fails at startup, and image endpoints report the uninitialized store
/// per request while everything else keeps serving.
pub struct AppState {
    images: OnceCell<Arc<ImageService>>,
    pub projects: ProjectsTable,
    pub roles: RoleRegistry,
    pub auth_token: Option<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(auth_token: Option<String>) -> Self {
        Self {
            images: OnceCell::new(),
            projects: ProjectsTable::default(),
            roles: RoleRegistry::default(),
            auth_token,
        }
    }

    /// Install the opened image service. Only called during startup, before
    /// requests are served.
    pub fn set_images(&self, service: ImageService) {
        if self.images.set(Arc::new(service)).is_err() {
            tracing::warn!("image service was already initialized");
        }
    }

    pub fn images(&self) -> Result<Arc<ImageService>, ApiError> {
        self.images
            .get()
            .cloned()
            .ok_or_else(|| ApiError::from(StoreError::NotInitialized))
    }
}
