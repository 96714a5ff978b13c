//! Session flow: diagnostics, checkpoints and the JSONL log.

use std::time::Duration;

use canvasrig_harness::layout::MenuButton;
use canvasrig_harness::{
    ConsoleLevel, HarnessConfig, HarnessError, NoiseClassifier, OverlayScript, ScriptedHost,
    Session, SessionLog, SurfaceRect,
};
use pretty_assertions::assert_eq;

fn ready_host() -> ScriptedHost {
    ScriptedHost::new()
        .with_surface(SurfaceRect::from_size(1280.0, 720.0))
        .with_overlay(OverlayScript::HiddenAfter(Duration::from_millis(300)))
}

fn config() -> HarnessConfig {
    HarnessConfig::default().with_run_id("test-run")
}

#[tokio::test]
async fn checkpoints_only_see_new_messages() {
    let mut s = Session::new(ready_host(), config());
    s.start_diagnostics().await.unwrap();
    s.await_ready().await.unwrap();

    s.host_mut().emit_error("favicon.ico 404");
    s.host_mut().emit_page_error("x is not defined");
    let err = s.checkpoint("boot").unwrap_err();
    assert_eq!(err.residue(), Some(&["[pageerror] x is not defined".to_string()][..]));

    s.click(MenuButton::Start.position()).await.unwrap();
    s.host_mut().emit_error("WebGL warning: lazy init");
    let report = s.checkpoint("main-menu").unwrap();
    assert_eq!(report.observed, 1);

    // The whole buffer still holds the earlier failure.
    assert!(matches!(
        s.assert_healthy("overall"),
        Err(HarnessError::UnexpectedDiagnostics { .. })
    ));
    assert_eq!(s.diagnostics().len(), 3);
}

#[tokio::test]
async fn non_error_levels_are_ignored() {
    let mut s = Session::new(ready_host(), config());
    s.start_diagnostics().await.unwrap();
    s.host_mut().emit_console(ConsoleLevel::Warning, "deprecated API");
    s.host_mut().emit_console(ConsoleLevel::Log, "Godot Engine v4.3");
    assert!(s.diagnostics().is_empty());
    assert!(s.assert_healthy("quiet").is_ok());
}

#[tokio::test]
async fn messages_before_subscription_are_not_replayed() {
    let mut s = Session::new(ready_host(), config());
    s.host_mut().emit_error("too early");
    s.start_diagnostics().await.unwrap();
    assert!(s.checkpoint("start").is_ok());
}

#[tokio::test]
async fn checkpoint_without_diagnostics_is_vacuous() {
    let mut s = Session::new(ready_host(), config());
    let report = s.checkpoint("none").unwrap();
    assert_eq!(report.observed, 0);
    assert!(s.diagnostics().is_empty());
}

#[tokio::test]
async fn custom_classifier_and_extra_noise() {
    let cfg = config().with_extra_noise("Mixed Content");
    let mut s = Session::new(ready_host(), cfg);
    s.start_diagnostics().await.unwrap();
    s.host_mut().emit_error("Mixed Content: insecure audio");
    assert!(s.checkpoint("extra").is_ok());

    let mut strict = Session::new(ready_host(), config()).with_classifier(NoiseClassifier::empty());
    strict.start_diagnostics().await.unwrap();
    strict.host_mut().emit_error("favicon.ico 404");
    assert!(strict.checkpoint("strict").is_err());
}

#[tokio::test]
async fn settle_uses_configured_pause() {
    let mut s = Session::new(
        ready_host(),
        config().with_transition_settle(Duration::from_millis(1500)),
    );
    s.settle_default().await;
    s.settle(Duration::from_millis(10)).await;
    assert_eq!(
        s.host().sleeps(),
        &[Duration::from_millis(1500), Duration::from_millis(10)]
    );
}

#[tokio::test]
async fn session_log_records_flow() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    let cfg = config().with_session_log(&path).with_readiness(
        canvasrig_harness::ReadinessOptions::default().with_grace_period(Duration::ZERO),
    );

    let mut s = Session::new(ready_host(), cfg);
    s.start_diagnostics().await.unwrap();
    s.await_ready().await.unwrap();
    s.tap_named("menu.start").await.unwrap();
    s.host_mut().emit_error("boom");
    assert!(s.checkpoint("after-tap").is_err());
    drop(s);

    let text = std::fs::read_to_string(&path).unwrap();
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["ready", "gesture", "checkpoint"]);
    assert!(events.iter().all(|e| e["run_id"] == "test-run"));
    assert_eq!(events[0]["overlay"], "hidden");
    assert_eq!(events[0]["t_ms"], 300);
    assert_eq!(events[1]["kind"], "tap");
    assert_eq!(events[2]["residue"][0], "boom");
}

#[tokio::test]
async fn explicit_log_sink() {
    let mut s = Session::new(ready_host(), config()).with_log(SessionLog::disabled("quiet"));
    s.start_diagnostics().await.unwrap();
    assert!(s.checkpoint("x").is_ok());
}
