#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use crate::domain::cache::Liveness;
    use crate::domain::error::RegistrarError;
    use crate::domain::service::{PassReport, Reconciler, RegisterOutcome, SweepReport};
    use crate::domain::test_support::{Call, MockConnector, ScriptedSource, service};

    fn setup() -> (Arc<MockConnector>, Reconciler) {
        let connector = Arc::new(MockConnector::default());
        let reconciler = Reconciler::new(connector.clone());
        (connector, reconciler)
    }

    fn is_register(call: &Call) -> bool {
        matches!(call, Call::Register(_))
    }

    fn is_deregister(call: &Call) -> bool {
        matches!(call, Call::Deregister(_))
    }

    #[tokio::test]
    async fn test_register_same_id_twice_hits_catalog_once() {
        let (connector, mut reconciler) = setup();
        let web = service("web-1:agent1-80", "web", "agent1", 80);

        let first = reconciler.register(&web).await.unwrap();
        let second = reconciler.register(&web).await.unwrap();

        assert_eq!(first, RegisterOutcome::Registered);
        assert_eq!(second, RegisterOutcome::AlreadyTracked);
        let agent = connector.agent("agent1");
        assert_eq!(agent.count(is_register), 1);
        assert_eq!(agent.registrations().len(), 1);
        assert_eq!(reconciler.cache().len(), 1);
        assert_eq!(connector.connects(), vec!["agent1"]);
    }

    #[tokio::test]
    async fn test_register_caches_payload_and_agent() {
        let (connector, mut reconciler) = setup();
        let mut web = service("web-1:agent1-80", "web", "agent1", 80);
        web.tags = vec!["blue".to_owned()];

        reconciler.register(&web).await.unwrap();

        let entry = reconciler.cache().get("web-1:agent1-80").unwrap();
        assert_eq!(entry.agent, "agent1");
        assert_eq!(entry.registration.tags, vec!["blue".to_owned()]);
        assert_eq!(entry.liveness(), Liveness::Marked);
        assert_eq!(connector.agent("agent1").registrations()[0], entry.registration);
    }

    #[tokio::test]
    async fn test_register_failure_leaves_no_trace_and_retries_next_pass() {
        let (connector, mut reconciler) = setup();
        let agent = connector.agent("agent1");
        agent.fail_register("web-1");
        let web = service("web-1", "web", "agent1", 80);

        let err = reconciler.register(&web).await.unwrap_err();
        assert!(matches!(err, RegistrarError::Register { ref service_id, .. } if service_id == "web-1"));
        assert!(!err.is_fatal());
        assert!(reconciler.cache().is_empty());
        assert!(agent.kv_keys().is_empty());

        let report = reconciler.reconcile_once(std::slice::from_ref(&web)).await.unwrap();
        assert_eq!(report.register_failed, 1);
        assert_eq!(agent.count(is_register), 2);
        assert!(reconciler.cache().is_empty());
    }

    #[tokio::test]
    async fn test_backend_write_failure_aborts_before_caching() {
        let (connector, mut reconciler) = setup();
        let agent = connector.agent("agent1");
        agent.fail_kv_create();

        let err = reconciler
            .register(&service("web-1", "web", "agent1", 80))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrarError::UpstreamWrite { .. }));
        assert_eq!(agent.count(is_register), 1);
        assert!(!reconciler.cache().contains("web-1"));
    }

    #[tokio::test]
    async fn test_existing_backend_record_is_not_an_error() {
        let (connector, mut reconciler) = setup();
        let agent = connector.agent("agent1");
        agent.put_kv("upstreams/web/agent1:80", r#"{"weight":3}"#);

        let outcome = reconciler
            .register(&service("web-2", "web", "agent1", 80))
            .await
            .unwrap();

        assert_eq!(outcome, RegisterOutcome::Registered);
        assert!(reconciler.cache().contains("web-2"));
        assert_eq!(
            agent.kv_value("upstreams/web/agent1:80").as_deref(),
            Some(r#"{"weight":3}"#)
        );
    }

    #[tokio::test]
    async fn test_empty_agent_is_a_recoverable_failure() {
        let (connector, mut reconciler) = setup();

        let report = reconciler
            .reconcile_once(&[service("web-1", "web", "", 80)])
            .await
            .unwrap();

        assert_eq!(report.register_failed, 1);
        assert!(connector.connects().is_empty());
        assert!(reconciler.cache().is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let (connector, mut reconciler) = setup();
        connector.fail_connect("agent2");

        let err = reconciler
            .reconcile_once(&[
                service("web-1", "web", "agent1", 80),
                service("api-1", "api", "agent2", 81),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrarError::Connect { ref address, .. } if address == "agent2"));
        assert!(err.is_fatal());
        assert!(reconciler.cache().contains("web-1"));
    }

    #[tokio::test]
    async fn test_re_presented_services_survive_sweep() {
        let (connector, mut reconciler) = setup();
        let desired = vec![
            service("web-1", "web", "agent1", 80),
            service("web-2", "web", "agent1", 81),
        ];

        for _ in 0..3 {
            reconciler.reconcile_once(&desired).await.unwrap();
        }

        let agent = connector.agent("agent1");
        assert_eq!(agent.count(is_register), 2);
        assert_eq!(agent.count(is_deregister), 0);
        assert_eq!(reconciler.cache().tracked_ids(), vec!["web-1", "web-2"]);
    }

    #[tokio::test]
    async fn test_sweep_resets_marks_so_liveness_must_be_renewed() {
        let (connector, mut reconciler) = setup();
        reconciler
            .register(&service("web-1", "web", "agent1", 80))
            .await
            .unwrap();

        let first = reconciler.deregister().await.unwrap();
        assert_eq!(
            first,
            SweepReport {
                retained: 1,
                deregistered: 0,
                failed: 0
            }
        );
        assert!(reconciler.cache().is_stale("web-1"));

        let second = reconciler.deregister().await.unwrap();
        assert_eq!(second.deregistered, 1);
        assert!(reconciler.cache().is_empty());
        assert_eq!(
            connector.agent("agent1").calls(),
            vec![
                Call::Register("web-1".to_owned()),
                Call::KvCreate("upstreams/web/agent1:80".to_owned()),
                Call::Deregister("web-1".to_owned()),
                Call::KvDelete("upstreams/web/agent1:80".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_deregister_failure_keeps_entry_and_retries() {
        let (connector, mut reconciler) = setup();
        let agent = connector.agent("agent1");
        let web = service("web-1", "web", "agent1", 80);
        reconciler.reconcile_once(std::slice::from_ref(&web)).await.unwrap();

        agent.fail_deregister("web-1");
        let report = reconciler.reconcile_once(&[]).await.unwrap();
        assert_eq!(report.deregister_failed, 1);
        assert!(reconciler.cache().contains("web-1"));
        assert!(reconciler.cache().is_stale("web-1"));
        assert_eq!(agent.kv_keys(), vec!["upstreams/web/agent1:80"]);

        agent.heal_deregister("web-1");
        let report = reconciler.reconcile_once(&[]).await.unwrap();
        assert_eq!(report.deregistered, 1);
        assert!(reconciler.cache().is_empty());
        assert_eq!(agent.count(is_deregister), 2);
        assert!(agent.kv_keys().is_empty());
    }

    #[tokio::test]
    async fn test_backend_delete_failure_still_drops_entry() {
        let (connector, mut reconciler) = setup();
        let agent = connector.agent("agent1");
        reconciler
            .reconcile_once(&[service("web-1", "web", "agent1", 80)])
            .await
            .unwrap();

        agent.fail_kv_delete();
        let report = reconciler.reconcile_once(&[]).await.unwrap();

        assert_eq!(report.deregistered, 1);
        assert!(reconciler.cache().is_empty());
        assert_eq!(agent.kv_keys(), vec!["upstreams/web/agent1:80"]);
    }

    #[tokio::test]
    async fn test_backend_key_on_removal_uses_agent_parsed_from_id() {
        let (connector, mut reconciler) = setup();
        let agent = connector.agent("agentA");
        reconciler
            .reconcile_once(&[service("web-1:agentA-3", "web", "agentA", 31000)])
            .await
            .unwrap();

        reconciler.reconcile_once(&[]).await.unwrap();

        assert_eq!(agent.count(is_deregister), 1);
        assert!(
            agent
                .calls()
                .contains(&Call::KvDelete("upstreams/web/agentA:31000".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_two_cycle_scenario() {
        let (connector, mut reconciler) = setup();
        let a = service("A", "alpha", "agent1", 80);
        let b = service("B", "beta", "agent1", 81);

        let cycle1 = reconciler.reconcile_once(&[a.clone(), b]).await.unwrap();
        assert_eq!(
            cycle1,
            PassReport {
                registered: 2,
                retained: 2,
                ..PassReport::default()
            }
        );

        let agent = connector.agent("agent1");
        assert_eq!(agent.count(is_register), 2);
        assert_eq!(
            agent.kv_keys(),
            vec!["upstreams/alpha/agent1:80", "upstreams/beta/agent1:81"]
        );
        assert_eq!(reconciler.cache().len(), 2);

        let cycle2 = reconciler.reconcile_once(&[a]).await.unwrap();
        assert_eq!(
            cycle2,
            PassReport {
                already_tracked: 1,
                retained: 1,
                deregistered: 1,
                ..PassReport::default()
            }
        );
        assert_eq!(agent.count(is_register), 2);
        assert!(agent.calls().contains(&Call::Deregister("B".to_owned())));
        assert_eq!(agent.kv_keys(), vec!["upstreams/alpha/agent1:80"]);
        assert_eq!(reconciler.cache().tracked_ids(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_loop_stops_immediately_when_already_cancelled() {
        let (_connector, mut reconciler) = setup();
        let source = ScriptedSource::new(vec![Ok(vec![service("web-1", "web", "agent1", 80)])]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        reconciler
            .run_until_cancelled(&source, Duration::from_millis(1), cancel)
            .await
            .unwrap();

        assert_eq!(source.calls(), 0);
        assert!(reconciler.cache().is_empty());
    }

    #[tokio::test]
    async fn test_loop_skips_passes_when_source_fails() {
        let (connector, mut reconciler) = setup();
        let a = service("A", "alpha", "agent1", 80);
        let b = service("B", "beta", "agent1", 81);
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Ok(vec![a.clone(), b]),
            Err("orchestrator unreachable".to_owned()),
            Ok(vec![a.clone()]),
            Ok(vec![a]),
        ])
        .cancel_after(4, cancel.clone());

        reconciler
            .run_until_cancelled(&source, Duration::from_millis(1), cancel)
            .await
            .unwrap();

        // A sweep after the failed read would have dropped A as well and
        // registered it again on the next pass.
        let agent = connector.agent("agent1");
        assert_eq!(source.calls(), 4);
        assert_eq!(agent.count(is_register), 2);
        assert_eq!(agent.count(is_deregister), 1);
        assert_eq!(reconciler.cache().tracked_ids(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_loop_ends_on_fatal_error() {
        let (connector, mut reconciler) = setup();
        connector.fail_connect("agent1");
        let source = ScriptedSource::new(vec![Ok(vec![service("web-1", "web", "agent1", 80)])]);

        let err = reconciler
            .run_until_cancelled(&source, Duration::from_millis(1), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(source.calls(), 1);
    }
}
