#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the epi-map dashboard.
//!
//! Serves the REST API over the normalized observation dataset and,
//! optionally, the frontend's static files. The dataset and boundary
//! file are loaded once at startup and shared read-only between
//! workers; the only thing written at runtime is the preferences file.

mod handlers;
pub mod views;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use epi_map_dataset::{
    ConfigError, Dataset, EpiMapConfig, LoadNotice, LoadSource, load_boundaries_or_empty,
    load_configured,
};
use epi_map_observation_models::AccumulationPolicy;
use geojson::FeatureCollection;

/// Shared application state.
pub struct AppState {
    /// Normalized rows.
    pub dataset: Dataset,
    /// Where the rows came from.
    pub load_source: LoadSource,
    /// Records dropped during normalization.
    pub dropped: usize,
    /// Set when the dataset load was degraded.
    pub notice: Option<LoadNotice>,
    /// State boundaries for the choropleth.
    pub boundaries: FeatureCollection,
    /// Set when no usable boundaries were loaded.
    pub boundaries_notice: Option<LoadNotice>,
    /// How repeated (state, year, disease) rows are combined.
    pub policy: AccumulationPolicy,
    /// Directory holding `preferences.json`.
    pub preferences_dir: PathBuf,
}

impl AppState {
    /// Loads the dataset and boundaries described by `config`.
    ///
    /// # Errors
    ///
    /// * If the configured aliases name an unknown field
    pub fn load(config: &EpiMapConfig) -> Result<Self, ConfigError> {
        let loaded = load_configured(config)?;
        let (boundaries, boundaries_notice) =
            load_boundaries_or_empty(config.data.boundaries.as_deref());

        Ok(Self {
            dataset: loaded.dataset,
            load_source: loaded.source,
            dropped: loaded.dropped,
            notice: loaded.notice,
            boundaries,
            boundaries_notice,
            policy: config.aggregation.policy,
            preferences_dir: config.cache.dir.clone(),
        })
    }

    /// State over an already loaded dataset, with no boundaries.
    #[must_use]
    pub fn from_dataset(dataset: Dataset, preferences_dir: PathBuf) -> Self {
        let (boundaries, boundaries_notice) = load_boundaries_or_empty(None);
        Self {
            dataset,
            load_source: LoadSource::Csv,
            dropped: 0,
            notice: None,
            boundaries,
            boundaries_notice,
            policy: AccumulationPolicy::default(),
            preferences_dir,
        }
    }
}

/// Registers the `/api` routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/meta", web::get().to(handlers::meta))
            .route("/summary", web::get().to(handlers::summary))
            .route("/trend", web::get().to(handlers::trend))
            .route("/distribution", web::get().to(handlers::distribution))
            .route("/histogram", web::get().to(handlers::histogram))
            .route("/scatter", web::get().to(handlers::scatter))
            .route("/choropleth", web::get().to(handlers::choropleth))
            .route("/state", web::get().to(handlers::state_view))
            .route("/preferences", web::get().to(handlers::get_preferences))
            .route("/preferences", web::put().to(handlers::put_preferences)),
    );
}

/// Starts the epi-map API server.
///
/// Loads the dataset and boundaries, then serves until shut down. The
/// caller provides the async runtime and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration is invalid,
/// or if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: EpiMapConfig) -> std::io::Result<()> {
    log::info!("Loading dataset from {}...", config.data.dataset.display());
    let state = AppState::load(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    if let Some(notice) = &state.notice {
        log::warn!("{}", notice.message);
    }
    if let Some(notice) = &state.boundaries_notice {
        log::warn!("{}", notice.message);
    }

    let state = web::Data::new(state);
    let static_dir = config.server.static_dir.clone();
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes);

        // Serve frontend static files (production)
        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
