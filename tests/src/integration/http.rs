//! # HTTP Integration Tests
//!
//! Drives the gate node router through `tower::ServiceExt::oneshot`, with the
//! caller identity in the `x-user-*` headers and the client address in
//! `X-Forwarded-For`.
//!
//! ## Flows Tested
//!
//! 1. Access window and anonymous callers on public and authenticated routes
//! 2. Conversation lifecycle with participant and ownership checks
//! 3. Write limiting per forwarded address, with `Retry-After`
//! 4. Privileged moderation routes

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, HeaderMap, Method, Request, StatusCode},
        Router,
    };
    use chat_gate::{
        AuthorizationPipeline, GateConfig, InMemoryRateLimitStore, MemoryAuditSink, MockClock,
        Role, UserId,
    };
    use gate_node::{build_router, AppState};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct TestNode {
        app: Router,
        clock: MockClock,
        audit: Arc<MemoryAuditSink>,
    }

    impl TestNode {
        fn at_hour(hour: u32) -> Self {
            let config = GateConfig::default();
            let clock = MockClock::at_hour(hour);
            let audit = Arc::new(MemoryAuditSink::new());
            let pipeline = AuthorizationPipeline::with_collaborators(
                &config,
                Arc::new(InMemoryRateLimitStore::default()),
                audit.clone(),
                Arc::new(clock.clone()),
            )
            .expect("default config is valid");
            let app = build_router(AppState::new(Arc::new(pipeline)), &config.security);
            Self { app, clock, audit }
        }

        async fn send(&self, req: Request<Body>) -> Reply {
            let response = self.app.clone().oneshot(req).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            Reply {
                status,
                headers,
                body,
            }
        }
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Value,
    }

    impl Reply {
        fn error(&self) -> &str {
            self.body["error"].as_str().unwrap_or_default()
        }
    }

    /// Caller identity and forwarded address.
    #[derive(Clone, Copy)]
    struct Caller {
        id: UserId,
        role: Role,
        addr: &'static str,
    }

    impl Caller {
        fn new(role: Role, addr: &'static str) -> Self {
            Self {
                id: UserId::new(),
                role,
                addr,
            }
        }
    }

    fn request(
        method: Method,
        uri: &str,
        caller: Option<Caller>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder
                .header("x-user-id", caller.id.to_string())
                .header("x-user-role", caller.role.as_str())
                .header("x-forwarded-for", caller.addr);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn get(uri: &str, caller: Caller) -> Request<Body> {
        request(Method::GET, uri, Some(caller), None)
    }

    fn post(uri: &str, caller: Caller, body: Value) -> Request<Body> {
        request(Method::POST, uri, Some(caller), Some(body))
    }

    fn id_of(reply: &Reply) -> String {
        reply.body["id"].as_str().unwrap().to_string()
    }

    // =============================================================================
    // ACCESS WINDOW AND AUTHENTICATION
    // =============================================================================

    #[tokio::test]
    async fn test_health_follows_access_window() {
        let node = TestNode::at_hour(22);
        let open = node
            .send(request(Method::GET, "/health", None, None))
            .await;
        assert_eq!(open.status, StatusCode::OK);
        assert_eq!(open.body["status"], "ok");

        node.clock.set_hour(10);
        let closed = node
            .send(request(Method::GET, "/health", None, None))
            .await;
        assert_eq!(closed.status, StatusCode::FORBIDDEN);
        assert_eq!(closed.error(), "access_window_closed");
        assert_eq!(node.audit.len(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_caller_rejected_on_conversations() {
        let node = TestNode::at_hour(23);
        let reply = node
            .send(request(Method::GET, "/conversations", None, None))
            .await;

        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.error(), "unauthenticated");
        assert_eq!(node.audit.records()[0].user, "Anonymous");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_audited_and_rejected() {
        let node = TestNode::at_hour(23);
        let caller = Caller::new(Role::Regular, "198.51.100.99");
        let reply = node
            .send(request(Method::TRACE, "/health", Some(caller), None))
            .await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);

        let records = node.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user, caller.id.to_string());
        assert_eq!(records[0].path, "/health");
    }

    // =============================================================================
    // CONVERSATION LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_participant_and_owner_checks() {
        let node = TestNode::at_hour(23);
        let alice = Caller::new(Role::Regular, "198.51.100.1");
        let bob = Caller::new(Role::Regular, "198.51.100.2");
        let carol = Caller::new(Role::Admin, "198.51.100.3");

        let created = node
            .send(post("/conversations", alice, json!({"participants": [bob.id]})))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["participants"].as_array().unwrap().len(), 2);
        let conversation = id_of(&created);

        let sent = node
            .send(post(
                &format!("/conversations/{conversation}/messages"),
                bob,
                json!({"body": "hi alice"}),
            ))
            .await;
        assert_eq!(sent.status, StatusCode::CREATED);
        let message = id_of(&sent);

        // Admin role does not open someone else's conversation
        let peek = node
            .send(get(&format!("/conversations/{conversation}"), carol))
            .await;
        assert_eq!(peek.status, StatusCode::FORBIDDEN);
        assert_eq!(peek.error(), "not_participant");

        let hijack = node
            .send(request(
                Method::PUT,
                &format!("/messages/{message}"),
                Some(alice),
                Some(json!({"body": "edited by alice"})),
            ))
            .await;
        assert_eq!(hijack.status, StatusCode::FORBIDDEN);
        assert_eq!(hijack.error(), "not_owner");

        let edit = node
            .send(request(
                Method::PATCH,
                &format!("/messages/{message}"),
                Some(bob),
                Some(json!({"body": "hi alice!"})),
            ))
            .await;
        assert_eq!(edit.status, StatusCode::OK);
        assert_eq!(edit.body["body"], "hi alice!");

        let listed = node
            .send(get(&format!("/conversations/{conversation}/messages"), alice))
            .await;
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.body.as_array().unwrap().len(), 1);

        let deleted = node
            .send(request(
                Method::DELETE,
                &format!("/messages/{message}"),
                Some(bob),
                None,
            ))
            .await;
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);

        let gone = node.send(get(&format!("/messages/{message}"), bob)).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_conversation_list_is_scoped_to_caller() {
        let node = TestNode::at_hour(2);
        let alice = Caller::new(Role::Regular, "198.51.100.10");
        let bob = Caller::new(Role::Regular, "198.51.100.11");

        node.send(post("/conversations", alice, json!({}))).await;
        node.send(post("/conversations", alice, json!({"participants": [bob.id]})))
            .await;

        let mine = node.send(get("/conversations", alice)).await;
        let theirs = node.send(get("/conversations", bob)).await;
        assert_eq!(mine.body.as_array().unwrap().len(), 2);
        assert_eq!(theirs.body.as_array().unwrap().len(), 1);
    }

    // =============================================================================
    // WRITE LIMITING
    // =============================================================================

    #[tokio::test]
    async fn test_sixth_write_from_address_is_limited() {
        let node = TestNode::at_hour(22);
        let alice = Caller::new(Role::Regular, "203.0.113.5");

        for _ in 0..5 {
            let reply = node.send(post("/conversations", alice, json!({}))).await;
            assert_eq!(reply.status, StatusCode::CREATED);
        }

        let limited = node.send(post("/conversations", alice, json!({}))).await;
        assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.error(), "rate_limited");
        assert_eq!(limited.body["limit"], 5);
        assert_eq!(limited.body["window_secs"], 60);
        assert_eq!(limited.headers[header::RETRY_AFTER], "60");

        // Reads still pass, and the budget is per address
        let read = node.send(get("/conversations", alice)).await;
        assert_eq!(read.status, StatusCode::OK);
        let moved = Caller {
            addr: "203.0.113.6",
            ..alice
        };
        let other = node.send(post("/conversations", moved, json!({}))).await;
        assert_eq!(other.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_budget_returns_after_window() {
        let node = TestNode::at_hour(22);
        let alice = Caller::new(Role::Regular, "203.0.113.9");

        for _ in 0..5 {
            node.send(post("/conversations", alice, json!({}))).await;
        }
        let limited = node.send(post("/conversations", alice, json!({}))).await;
        assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

        node.clock.advance(std::time::Duration::from_secs(61));
        let reply = node.send(post("/conversations", alice, json!({}))).await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    // =============================================================================
    // MODERATION
    // =============================================================================

    #[tokio::test]
    async fn test_moderation_metrics_require_privileged_role() {
        let node = TestNode::at_hour(22);
        let regular = Caller::new(Role::Regular, "192.0.2.1");
        let moderator = Caller::new(Role::Moderator, "192.0.2.2");

        let denied = node.send(get("/moderation/metrics", regular)).await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.error(), "insufficient_role");

        let allowed = node.send(get("/moderation/metrics", moderator)).await;
        assert_eq!(allowed.status, StatusCode::OK);
        assert_eq!(allowed.body["requests"]["total"], 2);
        assert_eq!(allowed.body["denials"]["insufficient_role"], 1);
    }

    #[tokio::test]
    async fn test_prometheus_export() {
        let node = TestNode::at_hour(22);
        let admin = Caller::new(Role::Admin, "192.0.2.3");

        let response = node
            .app
            .clone()
            .oneshot(get("/moderation/metrics/prometheus", admin))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("chat_gate_requests_total"));
    }
}
