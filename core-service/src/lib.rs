//! Core service façade and bootstrap helpers.
//!
//! This crate wires the upstream client, the play history store and the
//! analytics into the operations a host calls: report assembly through
//! [`WrappedService`] and the ingestion jobs in [`jobs`]. Desktop and server
//! hosts enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) and call [`WrappedCore::bootstrap`].

pub mod error;
pub mod jobs;
pub mod period;
pub mod service;

pub use error::{CoreError, ErrorKind, Result};
pub use jobs::{
    discover_export_files, discover_export_files_with_prefix, ArtworkBackfillJob, BackfillReport,
    ExportImportJob, ImportReport, RecentIngestJob, RecentIngestReport, EXPORT_FILE_PREFIX,
};
pub use period::PeriodWindow;
pub use service::{
    PeriodReport, TermReport, UserRef, WrappedService, DEFAULT_PERIOD_LIMIT, DEFAULT_RECENT_LIMIT,
    DEFAULT_TOP_LIMIT,
};

use std::sync::Arc;

use bridge_traits::time::Clock;
use core_history::PlayEventRepository;
use core_runtime::WrappedConfig;
use provider_spotify::SpotifyApi;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct WrappedCore {
    config: Arc<WrappedConfig>,
    api: Arc<dyn SpotifyApi>,
    store: Arc<dyn PlayEventRepository>,
    clock: Arc<dyn Clock>,
}

impl WrappedCore {
    /// Assemble the façade from explicit collaborators.
    pub fn from_parts(
        config: WrappedConfig,
        api: Arc<dyn SpotifyApi>,
        store: Arc<dyn PlayEventRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            api,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &WrappedConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn PlayEventRepository> {
        Arc::clone(&self.store)
    }

    pub fn service(&self) -> WrappedService {
        WrappedService::new(
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
        )
    }

    pub fn recent_ingest_job(&self) -> RecentIngestJob {
        RecentIngestJob::new(
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            self.config.recent_ingest_limit,
        )
    }

    pub fn export_import_job(&self) -> ExportImportJob {
        ExportImportJob::new(Arc::clone(&self.store), self.config.import_batch_size)
    }

    pub fn artwork_backfill_job(&self) -> ArtworkBackfillJob {
        ArtworkBackfillJob::new(
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            self.config.artwork_batch_limit,
        )
    }
}

#[cfg(feature = "desktop-shims")]
impl WrappedCore {
    /// Build the desktop stack: reqwest HTTP client, token manager,
    /// connector and a file-backed SQLite store.
    ///
    /// ```no_run
    /// # async fn example() -> core_service::Result<()> {
    /// use core_runtime::WrappedConfig;
    /// use core_service::WrappedCore;
    ///
    /// let core = WrappedCore::bootstrap(WrappedConfig::from_env()?).await?;
    /// let report = core.recent_ingest_job().run().await?;
    /// println!("inserted {}", report.inserted);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] when credentials or the database path are missing.
    pub async fn bootstrap(config: WrappedConfig) -> Result<Self> {
        use bridge_desktop::ReqwestHttpClient;
        use bridge_traits::http::HttpClient;
        use bridge_traits::time::SystemClock;
        use core_auth::{OAuthConfig, RefreshTokenGrant, TokenManager};
        use core_history::{create_pool, DatabaseConfig, SqlitePlayEventRepository};
        use provider_spotify::SpotifyConnector;

        config.validate()?;
        let database_path = config.require_database_path()?.to_path_buf();

        let http_client: Arc<dyn HttpClient> = Arc::new(
            ReqwestHttpClient::with_timeout(config.request_timeout)
                .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
        );
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let grant = RefreshTokenGrant::new(OAuthConfig::from_config(&config), Arc::clone(&http_client));
        let tokens = Arc::new(TokenManager::new(
            grant,
            config.refresh_token.clone(),
            Arc::clone(&clock),
        )?);
        let api: Arc<dyn SpotifyApi> =
            Arc::new(SpotifyConnector::from_config(&config, http_client, tokens));

        let pool = create_pool(DatabaseConfig::new(database_path)).await?;
        let store: Arc<dyn PlayEventRepository> = Arc::new(SqlitePlayEventRepository::new(pool));

        tracing::info!(api_base = %config.api_base, "Wrapped core ready");
        Ok(Self::from_parts(config, api, store, clock))
    }
}
