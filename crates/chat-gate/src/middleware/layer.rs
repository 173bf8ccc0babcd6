//! Tower layer running the authorization pipeline in front of a route group.
//!
//! The upstream authentication layer is expected to put a [`ClientIdentity`]
//! into the request extensions. On allow, the built [`RequestContext`] is
//! inserted as an extension for the handler.

use crate::domain::{
    ClientIdentity, ConversationId, Denial, MessageId, RequestMethod, ResourceRef, RouteSpec,
    SecurityConfig,
};
use crate::middleware::client_ip::client_ip_of;
use crate::service::AuthorizationPipeline;
use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::debug;

/// Gate layer
#[derive(Clone)]
pub struct GateLayer {
    pipeline: Arc<AuthorizationPipeline>,
    route: Arc<RouteSpec>,
    security: Arc<SecurityConfig>,
}

impl GateLayer {
    pub fn new(
        pipeline: Arc<AuthorizationPipeline>,
        route: RouteSpec,
        security: SecurityConfig,
    ) -> Self {
        Self {
            pipeline,
            route: Arc::new(route),
            security: Arc::new(security),
        }
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = GateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            inner,
            pipeline: Arc::clone(&self.pipeline),
            route: Arc::clone(&self.route),
            security: Arc::clone(&self.security),
        }
    }
}

/// Gate service
#[derive(Clone)]
pub struct GateService<S> {
    inner: S,
    pipeline: Arc<AuthorizationPipeline>,
    route: Arc<RouteSpec>,
    security: Arc<SecurityConfig>,
}

impl<S> Service<Request<Body>> for GateService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let pipeline = Arc::clone(&self.pipeline);
        let route = Arc::clone(&self.route);
        let security = Arc::clone(&self.security);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let method = match req.method().as_str().parse::<RequestMethod>() {
                Ok(method) => method,
                Err(e) => {
                    debug!(error = %e, "Rejecting unsupported method");
                    pipeline.audit_unsupported(
                        req.uri().path(),
                        req.extensions().get::<ClientIdentity>(),
                    );
                    return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
                }
            };

            let path = req.uri().path().to_string();
            let ctx = pipeline
                .context(method, client_ip_of(&req, &security))
                .identity(req.extensions().get::<ClientIdentity>().cloned())
                .target(parse_target(&path))
                .path(path)
                .build();

            let evaluation = pipeline.evaluate(&ctx, &route);
            if let Err(denial) = evaluation.decision.into_result() {
                return Ok(denial.into_response());
            }

            req.extensions_mut().insert(ctx);
            inner.call(req).await
        })
    }
}

/// Target resource from a path: the last `conversations/{uuid}` or
/// `messages/{uuid}` pair wins.
pub fn parse_target(path: &str) -> Option<ResourceRef> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .windows(2)
        .filter_map(|pair| match pair[0] {
            "conversations" => pair[1].parse::<ConversationId>().ok().map(ResourceRef::Conversation),
            "messages" => pair[1].parse::<MessageId>().ok().map(ResourceRef::Message),
            _ => None,
        })
        .last()
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::FORBIDDEN);
        let retry_after = self.retry_after();

        let mut response = (status, Json(self.to_body())).into_response();
        if let Some(retry) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&retry.as_secs().to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
