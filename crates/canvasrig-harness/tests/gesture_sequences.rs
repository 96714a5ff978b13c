//! Exact input sequences produced by clicks, taps and swipes.

use std::time::Duration;

use canvasrig_harness::input::PointerInput;
use canvasrig_harness::layout::{MenuButton, Tribe};
use canvasrig_harness::{
    AspectPolicy, HarnessConfig, HarnessError, InputEvent, NormalizedPosition, Point, PointerPhase,
    ScriptedHost, Session, SurfaceRect, SwipeOptions,
};
use pretty_assertions::assert_eq;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn session(rect: SurfaceRect) -> Session<ScriptedHost> {
    Session::new(ScriptedHost::new().with_surface(rect), HarnessConfig::default())
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[tokio::test]
async fn click_lands_on_menu_button() {
    let mut s = session(SurfaceRect::new(0.0, 40.0, 1280.0, 720.0));
    let at = s.click(MenuButton::Start.position()).await.unwrap();
    assert_eq!(at, Point::new(640.0, 40.0 + 720.0 * 0.618));
    assert_eq!(s.host().events(), vec![InputEvent::click(at)]);
}

#[tokio::test]
async fn tap_uses_touch_channel() {
    let mut s = session(SurfaceRect::from_size(1280.0, 720.0));
    let at = s.tap(Tribe::Judah.position()).await.unwrap();
    assert_eq!(s.host().events(), vec![InputEvent::tap(at)]);
}

#[tokio::test]
async fn named_lookup_and_unknown_names() {
    let mut s = session(SurfaceRect::from_size(1280.0, 720.0));
    let at = s.tap_named("tribe.benjamin").await.unwrap();
    assert_eq!(
        at,
        SurfaceRect::from_size(1280.0, 720.0).project(Tribe::Benjamin.position())
    );

    let err = s.click_named("tribe.ephraim").await.unwrap_err();
    assert!(matches!(err, HarnessError::Layout(_)));
    assert_eq!(s.host().events().len(), 1);
}

#[tokio::test]
async fn swipe_has_exact_move_count_and_endpoints() {
    let mut s = session(SurfaceRect::from_size(1280.0, 720.0));
    let from = NormalizedPosition::new(0.1, 0.5);
    let to = NormalizedPosition::new(0.9, 0.5);
    let path = s
        .swipe_with(from, to, SwipeOptions::default().with_steps(10))
        .await
        .unwrap();

    let moves = s.host().pointer_moves();
    assert_eq!(moves.len(), 10);
    let step = Point::new((path.to.x - path.from.x) / 10.0, (path.to.y - path.from.y) / 10.0);
    assert!(close(moves[0], Point::new(path.from.x + step.x, path.from.y + step.y)));
    assert_eq!(moves[9], path.to);
    for pair in moves.windows(2) {
        assert!(pair[1].x > pair[0].x);
    }
}

#[tokio::test]
async fn swipe_sequence_and_timing() {
    let mut s = session(SurfaceRect::from_size(1280.0, 720.0));
    let start = s.host().clock().now();
    let path = s
        .swipe_with(
            NormalizedPosition::new(0.2, 0.2),
            NormalizedPosition::new(0.2, 0.8),
            SwipeOptions::default().with_steps(4).with_duration(ms(200)),
        )
        .await
        .unwrap();

    let events = s.host().events();
    assert_eq!(events.len(), 1 + 1 + 4 + 1);
    assert_eq!(events[0], InputEvent::tap(path.from));
    assert_eq!(events[1], InputEvent::down(path.from));
    assert!(events[2..6].iter().all(InputEvent::is_pointer_move));
    assert_eq!(events[6], InputEvent::up(path.to));
    assert!(matches!(
        events[6],
        InputEvent::Pointer(PointerInput {
            phase: PointerPhase::Up,
            ..
        })
    ));

    // Touch settle, then `duration / steps` after every move.
    assert_eq!(
        s.host().sleeps(),
        &[ms(50), ms(50), ms(50), ms(50), ms(50)]
    );
    let step_pauses: Duration = s.host().sleeps()[1..].iter().sum();
    assert_eq!(step_pauses, ms(200));
    assert_eq!(s.host().clock().now() - start, ms(250));

    // Pointer-down happens after the settle, pointer-up after the last pause.
    let stamps: Vec<Duration> = s.host().dispatched().iter().map(|r| r.at).collect();
    assert_eq!(stamps, vec![ms(0), ms(50), ms(50), ms(100), ms(150), ms(200), ms(250)]);
}

#[tokio::test]
async fn zero_steps_still_reaches_target() {
    let mut s = session(SurfaceRect::from_size(1280.0, 720.0));
    let path = s
        .swipe_with(
            NormalizedPosition::ORIGIN,
            NormalizedPosition::new(1.0, 1.0),
            SwipeOptions::default().with_steps(0),
        )
        .await
        .unwrap();
    assert_eq!(s.host().pointer_moves(), vec![path.to]);
    assert_eq!(path.to, Point::new(1280.0, 720.0));
}

#[tokio::test]
async fn gestures_without_surface_fail_before_dispatch() {
    let mut s = Session::new(ScriptedHost::new(), HarnessConfig::default());
    let err = s.click(NormalizedPosition::CENTER).await.unwrap_err();
    assert_eq!(
        err,
        HarnessError::SurfaceNotFound {
            selector: "canvas".into()
        }
    );
    let err = s
        .swipe(NormalizedPosition::ORIGIN, NormalizedPosition::CENTER)
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::SurfaceNotFound { .. }));
    assert!(s.host().dispatched().is_empty());
}

#[tokio::test]
async fn translation_tracks_resizes() {
    let mut s = session(SurfaceRect::from_size(1280.0, 720.0));
    let first = s.to_absolute(NormalizedPosition::CENTER).await.unwrap();
    s.host_mut()
        .set_surface(Some(SurfaceRect::new(320.0, 180.0, 640.0, 360.0)));
    let second = s.to_absolute(NormalizedPosition::CENTER).await.unwrap();
    assert_eq!(first, Point::new(640.0, 360.0));
    assert_eq!(second, Point::new(640.0, 360.0));
    assert_eq!(
        s.to_absolute(NormalizedPosition::ORIGIN).await.unwrap(),
        Point::new(320.0, 180.0)
    );
}

#[tokio::test]
async fn aspect_policy_from_config() {
    let square = SurfaceRect::from_size(800.0, 800.0);
    let mut strict = session(square);
    assert!(matches!(
        strict.click(NormalizedPosition::CENTER).await,
        Err(HarnessError::AspectMismatch { .. })
    ));

    let mut lenient = Session::new(
        ScriptedHost::new().with_surface(square),
        HarnessConfig::default().with_aspect_policy(AspectPolicy::Warn),
    );
    assert_eq!(
        lenient.click(NormalizedPosition::CENTER).await.unwrap(),
        Point::new(400.0, 400.0)
    );
}
