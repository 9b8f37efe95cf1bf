//! QRP backend: question image storage plus project and role endpoints.
//!
//! `build` assembles the full router from an [`config::AppConfig`]: it
//! attempts the store open, seeds the role registry, and wires the HTTP
//! routes. A failed store open is logged and leaves image endpoints
//! reporting the uninitialized store while the rest of the app serves.

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::Router;
use qrp_blob::{GridStore, StoreConfig, StoreResult};

use crate::config::AppConfig;
use crate::services::images::ImageService;
use crate::state::AppState;

async fn open_image_service(config: &AppConfig) -> StoreResult<ImageService> {
    let (target, name) = config.store_target()?;
    let store = GridStore::open(target, name, StoreConfig::default()).await?;
    Ok(ImageService::new(store))
}

pub async fn build(config: AppConfig) -> Router {
    let state = Arc::new(AppState::new(config.auth_token.clone()));

    match open_image_service(&config).await {
        Ok(service) => state.set_images(service),
        Err(e) => {
            tracing::error!(error = %e, "failed to open object store; image routes disabled");
        }
    }

    state.roles.reseed().await;

    routes::router(state)
}
