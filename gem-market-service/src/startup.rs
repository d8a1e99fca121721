use crate::config::GemMarketConfig;
use crate::routes::build_router;
use crate::services::{
    AdminSessions, LocalStorage, LogOtpNotifier, MongoDb, OtpNotifier, Repositories, Storage,
};
use service_core::error::AppError;
use service_core::middleware::{create_ip_rate_limiter, IpRateLimiter};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Clone)]
pub struct AppState {
    pub config: GemMarketConfig,
    pub repos: Repositories,
    /// `None` when running on in-memory repositories.
    pub db: Option<MongoDb>,
    pub storage: Arc<dyn Storage>,
    pub otp_notifier: Arc<dyn OtpNotifier>,
    pub sessions: AdminSessions,
    /// Guards OTP verify/resend and bid placement.
    pub sensitive_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        config: GemMarketConfig,
        repos: Repositories,
        db: Option<MongoDb>,
        storage: Arc<dyn Storage>,
        otp_notifier: Arc<dyn OtpNotifier>,
    ) -> Self {
        let sessions = AdminSessions::new(&config.admin);
        let sensitive_rate_limiter = create_ip_rate_limiter(config.rate_limit.per_minute, 60);
        Self {
            config,
            repos,
            db,
            storage,
            otp_notifier,
            sessions,
            sensitive_rate_limiter,
        }
    }
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: GemMarketConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.storage.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.local_path,
                        e
                    );
                    e
                })?,
        );

        let state = AppState::new(
            config.clone(),
            Repositories::mongo(&db),
            Some(db),
            storage,
            Arc::new(LogOtpNotifier),
        );

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
