//! End-to-end readiness waits against local collaborators.
//!
//! These tests drive the poller with real probes instead of a live cluster:
//!
//! 1. An HTTP endpoint that only starts listening after a delay
//! 2. A kubectl-compatible binary whose reported status flips to ready
//! 3. A helm-compatible binary that fails before succeeding
//! 4. Cancellation of a poll that would otherwise run for a minute
//! 5. Independent polls running concurrently
//!
//! ## Running
//!
//! ```bash
//! cargo test -p fleetcheck-e2e --test local_readiness
//! ```

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use fleetcheck_poll::{accept_any, poll_until, PollSpec, Poller, TracingObserver, WaitError};
use fleetcheck_probes::predicate::{contains, found_containing, status_is};
use fleetcheck_probes::{
    CommandOutput, CommandProbe, CommandSpec, EndpointProbe, HelmInvocation, ResourceQuery,
    SuiteConfig,
};
use tokio::net::TcpListener;
use tokio::sync::watch;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Write an executable script that prints its run count-dependent output.
fn stateful_binary(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    let counter = dir.join(format!("{name}.count"));
    let script = format!(
        "#!/bin/sh\nn=$(cat {c} 2>/dev/null || echo 0)\nn=$((n+1))\necho $n > {c}\n{body}\n",
        c = counter.display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

fn suite() -> SuiteConfig {
    SuiteConfig::from_lookup(|key| match key {
        "CLUSTER_NAME" => Some("local".to_string()),
        "TIMEOUT_SCALE" => Some("2".to_string()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn e2e_endpoint_comes_up_late() {
    init_tracing();

    // Reserve a port, release it, and start serving there after a delay.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let app = Router::new().route(
            "/",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    r#"{"kind": "Status", "message": "Unauthorized", "code": 401}"#,
                )
            }),
        );
        let listener = TcpListener::bind(addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    let probe =
        EndpointProbe::new(format!("http://{addr}/"), true, Duration::from_secs(1)).unwrap();
    let spec = suite().poll_spec(PollSpec::new(
        Duration::from_secs(10),
        Duration::from_millis(50),
    ));

    let report = Poller::new(spec)
        .observe(TracingObserver::new("downstream api"))
        .run(probe, status_is(401))
        .await
        .unwrap();

    assert!(report.attempts >= 2, "server was up before the first attempt");
    let response = report.into_result("downstream api").unwrap();
    assert!(response.body.contains("Unauthorized"));

    server.abort();
}

#[tokio::test]
async fn e2e_resource_becomes_ready() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let kubectl = stateful_binary(
        dir.path(),
        "kubectl",
        "if [ $n -ge 3 ]; then echo True; else echo False; fi",
    );

    let query = ResourceQuery::new(
        "clusters.provisioning.cattle.io",
        r#"{.status.conditions[?(@.type=="Ready")].status}"#,
    )
    .named("k3d-imported")
    .in_namespace("fleet-default")
    .binary(kubectl);

    let spec = PollSpec::new(Duration::from_secs(10), Duration::from_millis(20));
    let value = poll_until(query, found_containing("True"), &spec, None)
        .await
        .unwrap()
        .into_result("downstream cluster ready")
        .unwrap();

    assert_eq!(value.as_deref(), Some("True"));
}

#[tokio::test]
async fn e2e_helm_retried_until_success() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let helm = stateful_binary(
        dir.path(),
        "helm",
        "if [ $n -lt 3 ]; then echo 'Error: Kubernetes cluster unreachable' >&2; exit 1; fi\n\
         echo \"Release \\\"cert-manager\\\" has been upgraded.\"",
    );

    let spec = PollSpec::new(Duration::from_secs(10), Duration::from_millis(20));
    let report = poll_until(
        HelmInvocation::with_binary(
            helm,
            [
                "upgrade",
                "--install",
                "cert-manager",
                "jetstack/cert-manager",
                "--namespace",
                "cert-manager",
                "--create-namespace",
            ],
        ),
        accept_any(),
        &spec,
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.attempts, 3);
    let output = report.into_result("cert-manager install").unwrap();
    assert!(output.stdout.contains("has been upgraded"));
}

#[tokio::test]
async fn e2e_cancel_stops_long_poll() {
    init_tracing();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = cancel_tx.send(true);
    });

    let probe = CommandProbe::new(CommandSpec::new("sh").args(["-c", "echo pending"]));
    let spec = PollSpec::new(Duration::from_secs(60), Duration::from_millis(50));

    let start = Instant::now();
    let report = poll_until(
        probe,
        contains::<CommandOutput>("restarted"),
        &spec,
        Some(cancel_rx),
    )
    .await
    .unwrap();

    assert!(report.outcome.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(5));

    let err = report.into_result("rollout restart").unwrap_err();
    assert!(matches!(err, WaitError::Cancelled { .. }));
}

#[tokio::test]
async fn e2e_timeout_reports_last_observation() {
    init_tracing();
    let probe = CommandProbe::new(CommandSpec::new("sh").args([
        "-c",
        "echo 'Waiting for deployment \"fleet-controller\" rollout to finish'",
    ]));
    let spec = PollSpec::new(Duration::from_millis(200), Duration::from_millis(50));

    let err = poll_until(
        probe,
        contains::<CommandOutput>("successfully rolled out"),
        &spec,
        None,
    )
    .await
    .unwrap()
    .into_result("fleet-controller rollout")
    .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("timed out waiting for fleet-controller rollout"));
    assert!(message.contains("rollout to finish"));
}

#[tokio::test]
async fn e2e_independent_polls_run_concurrently() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let slow = stateful_binary(dir.path(), "slow", "[ $n -ge 5 ] && echo ready");
    let fast = stateful_binary(dir.path(), "fast", "echo ready");

    let spec = PollSpec::new(Duration::from_secs(10), Duration::from_millis(20));
    let (slow_report, fast_report) = tokio::join!(
        poll_until(
            CommandProbe::new(CommandSpec::new(slow)),
            contains::<CommandOutput>("ready"),
            &spec,
            None,
        ),
        poll_until(
            CommandProbe::new(CommandSpec::new(fast)),
            contains::<CommandOutput>("ready"),
            &spec,
            None,
        ),
    );

    let slow_report = slow_report.unwrap();
    let fast_report = fast_report.unwrap();
    assert!(slow_report.outcome.is_satisfied());
    assert!(fast_report.outcome.is_satisfied());
    assert_eq!(slow_report.attempts, 5);
    assert_eq!(fast_report.attempts, 1);
}
