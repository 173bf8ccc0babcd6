//! # Pipeline Integration Tests
//!
//! Drives the full [`AuthorizationPipeline`] with a controllable clock, the
//! in-memory limiter store and a recording audit sink.
//!
//! ## Properties Covered
//!
//! 1. **Ordering**: audit first, then access window, limiter, authentication, role
//! 2. **Short-circuit**: a denial stops later guards and leaves the limiter untouched
//! 3. **Write budget**: per address, sliding, atomic under concurrency
//! 4. **Object checks**: participants read and post, only senders mutate

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use chat_gate::{
        AuthorizationPipeline, ClientIdentity, Clock, Conversation, ConversationId, DenyReason,
        GateConfig, InMemoryRateLimitStore, MemoryAuditSink, Message, MessageId, MockClock,
        RateLimitStore, RequestContext, RequestMethod, Resource, Role, RouteSpec, UserId,
    };
    use proptest::prelude::*;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        pipeline: Arc<AuthorizationPipeline>,
        clock: MockClock,
        audit: Arc<MemoryAuditSink>,
        store: Arc<InMemoryRateLimitStore>,
    }

    impl Harness {
        fn at_hour(hour: u32) -> Self {
            Self::with_config(hour, &GateConfig::default())
        }

        fn with_config(hour: u32, config: &GateConfig) -> Self {
            let clock = MockClock::at_hour(hour);
            let audit = Arc::new(MemoryAuditSink::new());
            let store = Arc::new(InMemoryRateLimitStore::default());
            let pipeline = AuthorizationPipeline::with_collaborators(
                config,
                store.clone(),
                audit.clone(),
                Arc::new(clock.clone()),
            )
            .expect("default config is valid");
            Self {
                pipeline: Arc::new(pipeline),
                clock,
                audit,
                store,
            }
        }

        fn request(
            &self,
            method: RequestMethod,
            ip: IpAddr,
            identity: Option<ClientIdentity>,
        ) -> RequestContext {
            self.pipeline
                .context(method, ip)
                .identity(identity)
                .path("/conversations")
                .build()
        }
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    fn user(role: Role) -> ClientIdentity {
        ClientIdentity::authenticated(UserId::new(), role)
    }

    fn conversations() -> RouteSpec {
        RouteSpec::authenticated("conversations")
    }

    // =============================================================================
    // ORDERING AND SHORT-CIRCUIT
    // =============================================================================

    #[test]
    fn test_daytime_write_denied_before_limiter() {
        let h = Harness::at_hour(10);
        let ctx = h.request(RequestMethod::Post, ip(1), None);

        let eval = h.pipeline.evaluate(&ctx, &conversations());

        assert_eq!(eval.decision.reason(), Some(DenyReason::AccessWindowClosed));
        assert_eq!(eval.guards_run, vec!["access_window"]);
        assert_eq!(h.store.recorded(ip(1)), 0);
        assert_eq!(h.store.tracked(), 0);
        assert_eq!(h.audit.len(), 1);
    }

    #[test]
    fn test_every_request_is_audited_once() {
        let h = Harness::at_hour(22);
        let alice = user(Role::Regular).with_email("alice@example.com");

        h.pipeline.evaluate(
            &h.request(RequestMethod::Get, ip(1), Some(alice.clone())),
            &conversations(),
        );
        h.pipeline
            .evaluate(&h.request(RequestMethod::Get, ip(1), None), &conversations());
        h.clock.set_hour(12);
        h.pipeline.evaluate(
            &h.request(RequestMethod::Post, ip(1), Some(alice)),
            &conversations(),
        );

        let users: Vec<String> = h.audit.records().into_iter().map(|r| r.user).collect();
        assert_eq!(
            users,
            vec!["alice@example.com", "Anonymous", "alice@example.com"]
        );
    }

    #[test]
    fn test_full_guard_order_on_privileged_write() {
        let h = Harness::at_hour(23);
        let ctx = h.request(RequestMethod::Post, ip(2), Some(user(Role::Moderator)));

        let eval = h.pipeline.evaluate(&ctx, &RouteSpec::privileged("moderation"));

        assert!(eval.is_allowed());
        assert_eq!(
            eval.guards_run,
            vec!["access_window", "rate_limit", "authentication", "role"]
        );
    }

    #[test]
    fn test_limiter_counts_writes_later_denied_by_role() {
        let h = Harness::at_hour(23);
        let ctx = h.request(RequestMethod::Post, ip(3), Some(user(Role::Regular)));

        let eval = h.pipeline.evaluate(&ctx, &RouteSpec::privileged("moderation"));

        assert_eq!(eval.decision.reason(), Some(DenyReason::InsufficientRole));
        assert_eq!(h.store.recorded(ip(3)), 1);
    }

    #[test]
    fn test_role_matrix_on_privileged_route() {
        let h = Harness::at_hour(1);
        let route = RouteSpec::privileged("moderation");
        let verdict = |identity: Option<ClientIdentity>| {
            h.pipeline
                .evaluate(&h.request(RequestMethod::Get, ip(4), identity), &route)
                .decision
                .reason()
        };

        assert_eq!(verdict(None), Some(DenyReason::Unauthenticated));
        assert_eq!(
            verdict(Some(user(Role::Regular))),
            Some(DenyReason::InsufficientRole)
        );
        assert_eq!(verdict(Some(user(Role::Moderator))), None);
        assert_eq!(verdict(Some(user(Role::Admin))), None);
    }

    #[test]
    fn test_window_boundaries() {
        let h = Harness::at_hour(20);
        let route = RouteSpec::public("health");
        let check = |hour: u32| {
            h.clock.set_hour(hour);
            h.pipeline
                .evaluate(&h.request(RequestMethod::Get, ip(5), None), &route)
                .is_allowed()
        };

        assert!(!check(20));
        assert!(check(21));
        assert!(check(0));
        assert!(check(5));
        assert!(!check(6));
        assert!(!check(12));
    }

    // =============================================================================
    // WRITE BUDGET
    // =============================================================================

    #[test]
    fn test_sixth_write_is_limited_with_retry_hint() {
        let h = Harness::at_hour(22);
        let alice = user(Role::Regular);

        for n in 0..5 {
            let ctx = h.request(RequestMethod::Post, ip(6), Some(alice.clone()));
            assert!(
                h.pipeline.evaluate(&ctx, &conversations()).is_allowed(),
                "write {n} should pass"
            );
        }

        let ctx = h.request(RequestMethod::Post, ip(6), Some(alice.clone()));
        let eval = h.pipeline.evaluate(&ctx, &conversations());
        let denial = eval.decision.into_result().unwrap_err();
        assert_eq!(denial.reason, DenyReason::RateLimited);
        assert_eq!(denial.status_code(), 429);
        assert_eq!(denial.retry_after(), Some(Duration::from_secs(60)));

        // Reads and other addresses are unaffected
        let read = h.request(RequestMethod::Get, ip(6), Some(alice.clone()));
        assert!(h.pipeline.evaluate(&read, &conversations()).is_allowed());
        let other = h.request(RequestMethod::Post, ip(7), Some(alice));
        assert!(h.pipeline.evaluate(&other, &conversations()).is_allowed());
    }

    #[test]
    fn test_window_slides_with_clock() {
        let h = Harness::at_hour(22);
        let post = || {
            h.pipeline
                .evaluate(
                    &h.request(RequestMethod::Post, ip(8), Some(user(Role::Regular))),
                    &conversations(),
                )
                .is_allowed()
        };

        for _ in 0..5 {
            assert!(post());
            h.clock.advance(Duration::from_secs(10));
        }
        // Oldest hit was 50s ago
        assert!(!post());

        h.clock.advance(Duration::from_secs(11));
        assert!(post());
        assert!(!post());
    }

    #[test]
    fn test_concurrent_writes_admit_exactly_limit() {
        let harness = Harness::at_hour(22);
        let target = conversations();
        let (h, route) = (&harness, &target);

        let allowed: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(move || {
                        (0..4)
                            .filter(|_| {
                                let ctx = h.request(
                                    RequestMethod::Post,
                                    ip(9),
                                    Some(user(Role::Regular)),
                                );
                                h.pipeline.evaluate(&ctx, route).is_allowed()
                            })
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).sum()
        });

        assert_eq!(allowed, 5);
        assert_eq!(h.store.recorded(ip(9)), 5);
        assert_eq!(
            h.pipeline.metrics().denials_for(DenyReason::RateLimited),
            59
        );
    }

    #[test]
    fn test_idle_addresses_are_swept() {
        let h = Harness::at_hour(22);
        for last in 10..15 {
            let ctx = h.request(RequestMethod::Post, ip(last), Some(user(Role::Regular)));
            h.pipeline.evaluate(&ctx, &conversations());
        }
        assert_eq!(h.store.tracked(), 5);

        let ttl = GateConfig::default().rate_limit.idle_ttl;
        h.clock.advance(ttl + Duration::from_secs(1));

        assert_eq!(h.store.sweep(h.clock.now(), ttl), 5);
        assert_eq!(h.store.tracked(), 0);
    }

    #[test]
    fn test_disabled_limiter_admits_bursts() {
        let mut config = GateConfig::default();
        config.rate_limit.enabled = false;
        let h = Harness::with_config(22, &config);

        for _ in 0..20 {
            let ctx = h.request(RequestMethod::Post, ip(16), Some(user(Role::Regular)));
            assert!(h.pipeline.evaluate(&ctx, &conversations()).is_allowed());
        }
        assert_eq!(h.store.tracked(), 0);
    }

    // =============================================================================
    // OBJECT-LEVEL CHECKS
    // =============================================================================

    #[test]
    fn test_participant_and_owner_flow() {
        let h = Harness::at_hour(22);
        let alice = user(Role::Regular);
        let bob = user(Role::Regular);
        let carol = user(Role::Admin);

        let conversation = Conversation::new(ConversationId::new(), [alice.id, bob.id]).unwrap();
        let message = Message::new(MessageId::new(), &conversation, alice.id).unwrap();
        let on_message = Resource::Message {
            message: &message,
            conversation: &conversation,
        };

        let check = |who: &ClientIdentity, method: RequestMethod, resource: Resource<'_>| {
            let ctx = h.request(method, ip(20), Some(who.clone()));
            h.pipeline.authorize_resource(&ctx, resource).reason()
        };

        // Participants read and post
        assert_eq!(check(&bob, RequestMethod::Get, on_message), None);
        assert_eq!(
            check(&bob, RequestMethod::Post, Resource::Conversation(&conversation)),
            None
        );

        // Only the sender mutates
        assert_eq!(
            check(&bob, RequestMethod::Patch, on_message),
            Some(DenyReason::NotOwner)
        );
        assert_eq!(check(&alice, RequestMethod::Delete, on_message), None);

        // Role does not grant object access
        assert_eq!(
            check(&carol, RequestMethod::Get, on_message),
            Some(DenyReason::NotParticipant)
        );

        let metrics = h.pipeline.metrics();
        assert_eq!(metrics.denials_for(DenyReason::NotOwner), 1);
        assert_eq!(metrics.denials_for(DenyReason::NotParticipant), 1);
    }

    #[test]
    fn test_object_check_requires_authentication() {
        let h = Harness::at_hour(22);
        let owner = UserId::new();
        let conversation = Conversation::new(ConversationId::new(), [owner]).unwrap();

        let ctx = h.request(RequestMethod::Get, ip(21), None);
        let verdict = h
            .pipeline
            .authorize_resource(&ctx, Resource::Conversation(&conversation));

        assert_eq!(verdict.reason(), Some(DenyReason::Unauthenticated));
    }

    #[tokio::test]
    async fn test_dispatch_skips_handler_on_denial() {
        let h = Harness::at_hour(9);
        let ctx = h.request(RequestMethod::Get, ip(22), Some(user(Role::Admin)));

        let result = h
            .pipeline
            .dispatch(ctx, &conversations(), |_ctx| async { "handled" })
            .await;

        assert_eq!(result.unwrap_err().reason, DenyReason::AccessWindowClosed);
        assert_eq!(h.audit.len(), 1);
    }

    // =============================================================================
    // PROPERTIES
    // =============================================================================

    proptest! {
        #[test]
        fn prop_window_decides_public_reads(hour in 0u32..24) {
            let h = Harness::at_hour(hour);
            let ctx = h.request(RequestMethod::Get, ip(30), None);
            let allowed = h.pipeline.evaluate(&ctx, &RouteSpec::public("health")).is_allowed();
            prop_assert_eq!(allowed, hour >= 21 || hour < 6);
            prop_assert_eq!(h.audit.len(), 1);
        }

        #[test]
        fn prop_writes_never_exceed_budget(attempts in 1usize..30) {
            let h = Harness::at_hour(23);
            let allowed = (0..attempts)
                .filter(|_| {
                    let ctx = h.request(RequestMethod::Post, ip(31), Some(user(Role::Regular)));
                    h.pipeline.evaluate(&ctx, &conversations()).is_allowed()
                })
                .count();
            prop_assert_eq!(allowed, attempts.min(5));
        }
    }
}
