//! Authorization pipeline - runs the ordered guard list for every request.
//!
//! ```text
//! RequestContext ──► Audit ──► AccessWindow ──► RateLimit ──► Authentication ──► Role ──► handler
//!                   (always)                   (POST only)   (route-scoped)     (route-scoped)
//! ```
//!
//! The first denial short-circuits: later guards never run, so a request
//! rejected by the access window leaves no trace in the rate limiter.

use crate::adapters::{InMemoryRateLimitStore, NoopAuditSink, SystemClock, TracingAuditSink};
use crate::domain::{
    ClientIdentity, ConfigError, Denial, GateConfig, RequestContext, RequestContextBuilder,
    RequestMethod, RouteSpec, Verdict,
};
use crate::middleware::{
    AccessWindowGuard, AuthenticationGuard, GateMetrics, Guard, ParticipantAuthorizer,
    RateLimitGuard, Resource, RoleGuard,
};
use crate::ports::outbound::{AuditRecord, AuditSink, Clock, RateLimitStore};
use chrono::{DateTime, Local};
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Pipeline lifecycle of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Allowed,
    Denied,
}

/// Result of running the guard list.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub state: PipelineState,
    pub decision: Verdict,
    /// Guards that actually ran, in order
    pub guards_run: Vec<&'static str>,
}

impl Evaluation {
    pub fn is_allowed(&self) -> bool {
        self.state == PipelineState::Allowed
    }

    pub fn ran(&self, guard: &str) -> bool {
        self.guards_run.iter().any(|name| *name == guard)
    }

    fn deny(&mut self, denial: Denial) {
        self.state = PipelineState::Denied;
        self.decision = Verdict::Deny(denial);
    }
}

/// Ordered guard list plus its collaborators.
pub struct AuthorizationPipeline {
    guards: Vec<Box<dyn Guard>>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    metrics: Arc<GateMetrics>,
    authorizer: ParticipantAuthorizer,
    rate_limit_store: Option<Arc<dyn RateLimitStore>>,
}

impl AuthorizationPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Standard guard order from configuration, with an in-memory store,
    /// the tracing audit sink and the system clock. Auditing has no off
    /// switch here; inject a sink through [`Self::with_collaborators`].
    pub fn from_config(config: &GateConfig) -> Result<Self, ConfigError> {
        let store = Arc::new(InMemoryRateLimitStore::new(
            config.rate_limit.max_tracked_addresses,
        ));
        Self::with_collaborators(
            config,
            store,
            Arc::new(TracingAuditSink),
            Arc::new(SystemClock),
        )
    }

    /// Standard guard order with injected collaborators.
    pub fn with_collaborators(
        config: &GateConfig,
        store: Arc<dyn RateLimitStore>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self::builder()
            .audit(audit)
            .clock(clock)
            .guard(AccessWindowGuard::new(config.access_window.clone()))
            .rate_limit(RateLimitGuard::new(config.rate_limit.clone(), store))
            .guard(AuthenticationGuard::new())
            .guard(RoleGuard::new(&config.roles))
            .build())
    }

    /// Start a context stamped with this pipeline's clock.
    pub fn context(&self, method: RequestMethod, source: IpAddr) -> RequestContextBuilder {
        RequestContext::builder(method, source, self.clock.as_ref())
    }

    /// Audit the request, then run every applicable guard until one denies.
    pub fn evaluate(&self, ctx: &RequestContext, route: &RouteSpec) -> Evaluation {
        self.metrics.record_request();
        self.audit_request(ctx);

        let mut eval = Evaluation {
            state: PipelineState::Pending,
            decision: Verdict::Allow,
            guards_run: Vec::with_capacity(self.guards.len()),
        };

        for guard in &self.guards {
            if !guard.applies(ctx, route) {
                continue;
            }
            eval.guards_run.push(guard.name());

            match guard.check(ctx, route) {
                Ok(Verdict::Allow) => {}
                Ok(Verdict::Deny(denial)) => {
                    warn!(
                        guard = guard.name(),
                        reason = %denial.reason,
                        ip = %ctx.source(),
                        path = ctx.path(),
                        route = route.name,
                        "Request denied"
                    );
                    eval.deny(denial);
                    break;
                }
                Err(e) => {
                    error!(
                        guard = guard.name(),
                        error = %e,
                        ip = %ctx.source(),
                        path = ctx.path(),
                        "Guard failed, denying request"
                    );
                    eval.deny(Denial::guard_unavailable());
                    break;
                }
            }
        }

        match &eval.decision {
            Verdict::Deny(denial) => self.metrics.record_denied(denial.reason),
            Verdict::Allow => {
                eval.state = PipelineState::Allowed;
                self.metrics.record_allowed();
                debug!(
                    path = ctx.path(),
                    route = route.name,
                    guards = ?eval.guards_run,
                    "Request allowed"
                );
            }
        }

        eval
    }

    /// Run the pipeline and, only if it allows, the handler.
    pub async fn dispatch<F, Fut, T>(
        &self,
        ctx: RequestContext,
        route: &RouteSpec,
        handler: F,
    ) -> Result<T, Denial>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = T>,
    {
        self.evaluate(&ctx, route).decision.into_result()?;
        Ok(handler(ctx).await)
    }

    /// Object-level check for handlers, counted in the metrics.
    pub fn authorize_resource(&self, ctx: &RequestContext, resource: Resource<'_>) -> Verdict {
        let verdict = self.authorizer.authorize_context(ctx, resource);
        self.metrics.record_resource_check(verdict.reason());
        verdict
    }

    pub fn metrics(&self) -> Arc<GateMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Store behind the rate limit guard, for the sweep task.
    pub fn rate_limit_store(&self) -> Option<Arc<dyn RateLimitStore>> {
        self.rate_limit_store.clone()
    }

    /// Guard names in execution order.
    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|guard| guard.name()).collect()
    }

    /// Audit a request that never reaches the guards because its method has
    /// no [`RequestMethod`] counterpart. The caller answers it with 405.
    pub fn audit_unsupported(&self, path: &str, identity: Option<&ClientIdentity>) {
        self.metrics.record_request();
        let identity = identity.filter(|identity| identity.authenticated);
        self.write_audit(identity, path, self.clock.wall_time());
    }

    fn audit_request(&self, ctx: &RequestContext) {
        self.write_audit(ctx.authenticated_identity(), ctx.path(), ctx.wall_time());
    }

    fn write_audit(
        &self,
        identity: Option<&ClientIdentity>,
        path: &str,
        timestamp: DateTime<Local>,
    ) {
        let user = identity
            .map(|identity| identity.audit_label())
            .unwrap_or_else(|| AuditRecord::ANONYMOUS.to_string());

        self.audit.record(AuditRecord {
            timestamp,
            user,
            path: path.to_string(),
        });
        self.metrics.record_audit();
    }
}

impl std::fmt::Debug for AuthorizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationPipeline")
            .field("guards", &self.guard_names())
            .finish()
    }
}

/// Builder for [`AuthorizationPipeline`]. Guards run in the order added.
pub struct PipelineBuilder {
    guards: Vec<Box<dyn Guard>>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    metrics: Arc<GateMetrics>,
    rate_limit_store: Option<Arc<dyn RateLimitStore>>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            guards: Vec::new(),
            audit: Arc::new(NoopAuditSink),
            clock: Arc::new(SystemClock),
            metrics: Arc::new(GateMetrics::new()),
            rate_limit_store: None,
        }
    }
}

impl PipelineBuilder {
    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Add the rate limit guard and remember its store.
    pub fn rate_limit(mut self, guard: RateLimitGuard) -> Self {
        self.rate_limit_store = Some(guard.store());
        self.guard(guard)
    }

    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn build(self) -> AuthorizationPipeline {
        AuthorizationPipeline {
            guards: self.guards,
            audit: self.audit,
            clock: self.clock,
            metrics: self.metrics,
            authorizer: ParticipantAuthorizer::new(),
            rate_limit_store: self.rate_limit_store,
        }
    }
}
