//! Service infrastructure for all microservices

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::{error, info, warn};

use crate::error::{CanaryError, Result};

/// Health status for liveness checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub service_id: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub started_at: DateTime<Utc>,
}

/// Readiness status for readiness checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessStatus {
    pub ready: bool,
    pub dependencies: Vec<DependencyStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub latency_ms: Option<u64>,
}

/// Lifecycle hooks driven by [`MicroserviceRuntime`]. Liveness and readiness
/// are served over HTTP by each service from the status types above.
#[async_trait]
pub trait CanaryService: Send + Sync + 'static {
    /// Service identifier (e.g., "web-app")
    fn service_id(&self) -> &'static str;

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// Serve until the task is aborted. Returning early stops the runtime.
    async fn start(&self) -> Result<()>;

    /// Called once, after serving stops for any reason.
    async fn shutdown(&self) -> Result<()>;
}

/// Standard microservice runtime bootstrap
pub struct MicroserviceRuntime;

impl MicroserviceRuntime {
    /// Run until Ctrl+C or SIGTERM.
    pub async fn run<S: CanaryService>(service: Arc<S>) -> Result<()> {
        Self::run_until(service, Self::wait_for_shutdown()).await
    }

    /// Run until `shutdown_signal` resolves or `start` returns.
    ///
    /// An error from `start` (a failed bind, say) is returned after
    /// `shutdown` has run, so the process exits non-zero.
    pub async fn run_until<S, F>(service: Arc<S>, shutdown_signal: F) -> Result<()>
    where
        S: CanaryService,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        info!(
            service_id = service.service_id(),
            version = service.version(),
            "Starting microservice"
        );

        let server = service.clone();
        let mut server_task = tokio::spawn(async move { server.start().await });

        let served = tokio::select! {
            joined = &mut server_task => Some(joined),
            _ = shutdown_signal => None,
        };

        let result = match served {
            None => {
                info!("Shutdown signal received, gracefully stopping...");
                Ok(())
            }
            Some(Ok(Ok(()))) => {
                info!("Service stopped serving");
                Ok(())
            }
            Some(Ok(Err(e))) => {
                error!(error = %e, code = e.error_code(), "Service error");
                Err(e)
            }
            Some(Err(e)) => Err(CanaryError::Internal(format!("service task failed: {}", e))),
        };

        if let Err(e) = service.shutdown().await {
            warn!("Error during shutdown: {}", e);
        }

        // Dropping the server task drops in-flight requests and their pending delays.
        server_task.abort();

        info!(
            uptime_seconds = start_time.elapsed().as_secs(),
            "Microservice stopped"
        );

        result
    }

    async fn wait_for_shutdown() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
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
                    error!("Failed to listen for SIGTERM: {}", e);
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
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct MockService {
        fail_start: bool,
        serving: Arc<Notify>,
        shutdowns: AtomicUsize,
    }

    impl MockService {
        fn new(fail_start: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_start,
                serving: Arc::new(Notify::new()),
                shutdowns: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CanaryService for MockService {
        fn service_id(&self) -> &'static str {
            "mock-service"
        }

        async fn start(&self) -> Result<()> {
            if self.fail_start {
                return Err(CanaryError::Network("address in use".into()));
            }
            self.serving.notify_one();
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn shutdown(&self) -> Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_serving_service() {
        let service = MockService::new(false);
        let serving = service.serving.clone();

        let result = MicroserviceRuntime::run_until(service.clone(), async move {
            serving.notified().await;
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(service.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_failure_is_returned_after_shutdown() {
        let service = MockService::new(true);

        let result = MicroserviceRuntime::run_until(service.clone(), std::future::pending()).await;

        assert!(matches!(result, Err(CanaryError::Network(_))));
        assert_eq!(service.shutdowns.load(Ordering::SeqCst), 1);
    }
}
