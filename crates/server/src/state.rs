//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::file::{ImageService, LocalImageStorage};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Theme engine for template rendering.
    theme: ThemeEngine,

    /// Image service for property photo uploads.
    images: ImageService,

    /// Public site URL.
    site_url: String,
}

impl AppState {
    /// Create new application state: connect, migrate, wire services.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        let storage = Arc::new(LocalImageStorage::new(
            config.uploads_dir.clone(),
            config.files_url.clone(),
        ));
        let images = ImageService::new(storage);

        let theme = ThemeEngine::new(&config.templates_dir)
            .context("failed to initialize theme engine")?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db,
                theme,
                images,
                site_url: config.site_url.clone(),
            }),
        })
    }

    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    pub fn images(&self) -> &ImageService {
        &self.inner.images
    }

    pub fn site_url(&self) -> &str {
        &self.inner.site_url
    }
}
