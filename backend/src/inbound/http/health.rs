//! Liveness and readiness probes for orchestration and load balancers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use async_trait::async_trait;
use tracing::warn;

/// Backing dependency consulted by the readiness probe.
#[async_trait]
pub trait DependencyCheck: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Succeed when the dependency can serve requests.
    async fn check(&self) -> Result<(), String>;
}

/// Shared probe state.
///
/// Starts not ready but live. The server marks it ready after binding and
/// unhealthy when draining.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    dependencies: Vec<Arc<dyn DependencyCheck>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::with_dependencies(Vec::new())
    }
}

impl HealthState {
    /// Create a state with no dependency checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state whose readiness also requires every dependency.
    pub fn with_dependencies(dependencies: Vec<Arc<dyn DependencyCheck>>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            dependencies,
        }
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Whether start-up completed.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Whether the process should keep running.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn dependencies_ok(&self) -> bool {
        for dependency in &self.dependencies {
            if let Err(error) = dependency.check().await {
                warn!(dependency = dependency.name(), %error, "readiness check failed");
                return false;
            }
        }
        true
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe. 200 once start-up completed and every dependency
/// answers; 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server or a dependency is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let ok = state.is_ready() && state.dependencies_ok().await;
    HealthState::probe_response(ok)
}

/// Liveness probe. 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    struct Fixed(Result<(), String>);

    #[async_trait]
    impl DependencyCheck for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn check(&self) -> Result<(), String> {
            self.0.clone()
        }
    }

    async fn probe(state: HealthState, path: &str) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(ready)
                .service(live),
        )
        .await;
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(path).to_request()).await
    }

    #[actix_web::test]
    async fn not_ready_until_marked() {
        let res = probe(HealthState::new(), "/health/ready").await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-store")
        );
    }

    #[rstest]
    #[case(Ok(()), StatusCode::OK)]
    #[case(Err("connection refused".to_owned()), StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn readiness_consults_dependencies(
        #[case] outcome: Result<(), String>,
        #[case] expected: StatusCode,
    ) {
        let state = HealthState::with_dependencies(vec![Arc::new(Fixed(outcome))]);
        state.mark_ready();
        assert_eq!(probe(state, "/health/ready").await.status(), expected);
    }

    #[actix_web::test]
    async fn liveness_fails_once_draining() {
        let state = HealthState::new();
        state.mark_unhealthy();
        assert_eq!(
            probe(state, "/health/live").await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
