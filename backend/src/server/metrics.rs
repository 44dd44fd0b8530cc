//! Prometheus request metrics, exposed at `/metrics` when enabled.

use std::sync::Arc;

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;

const METRICS_NAMESPACE: &str = "mercado";
const METRICS_ENDPOINT: &str = "/metrics";

/// Build the Prometheus middleware and its scrape endpoint.
///
/// # Errors
/// Returns [`std::io::Error`] when the default metrics cannot be registered.
pub fn build_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new(METRICS_NAMESPACE)
        .endpoint(METRICS_ENDPOINT)
        .build()
        .map_err(|err| std::io::Error::other(format!("prometheus registration failed: {err}")))
}

/// Wraps the app in Prometheus middleware when configured and passes
/// requests through untouched otherwise, so both cases share one app type.
#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl MetricsLayer {
    #[must_use]
    pub(crate) fn from_option(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Disabled, |metrics| Self::Enabled(Arc::new(metrics)))
    }
}

type BoxedService = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxedService;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let layer = self.clone();
        Box::pin(async move {
            match layer {
                Self::Enabled(metrics) => {
                    let wrapped = Compat::new((*metrics).clone())
                        .new_transform(service)
                        .await?;
                    Ok(boxed::service(wrapped))
                }
                Self::Disabled => Ok(boxed::service(
                    service.map(ServiceResponse::<B>::map_into_boxed_body),
                )),
            }
        })
    }
}
