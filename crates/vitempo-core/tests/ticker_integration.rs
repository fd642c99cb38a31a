//! Tick source lifecycle against virtual time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use vitempo_core::{
    Catalog, Event, Phase, Session, SessionRunner, Settings, Silent, TaskList, TechniqueId,
    TimerStatus,
};

fn runner_for(id: TechniqueId, settings: Settings) -> (SessionRunner, mpsc::UnboundedReceiver<Event>) {
    let technique = Catalog::builtin().get(id).unwrap().clone();
    let session = Session::new(technique, settings, TaskList::new(), Arc::new(Silent));
    let (tx, rx) = mpsc::unbounded_channel();
    (SessionRunner::new(session, tx), rx)
}

#[tokio::test(start_paused = true)]
async fn auto_start_keeps_single_ticker_across_phases() {
    let (mut runner, mut rx) = runner_for(
        TechniqueId::Pomodoro,
        Settings {
            work_duration: 2_000,
            short_break_duration: 1_000,
            auto_start_breaks: true,
            auto_start_work: true,
            ..Settings::default()
        },
    );
    runner.start().await;
    time::sleep(Duration::from_millis(3500)).await;

    let snap = runner.snapshot().await;
    assert_eq!(snap.phase, Phase::Work);
    assert_eq!(snap.status, TimerStatus::Running);
    assert_eq!(snap.completed_work_cycles, 1);
    assert!(runner.is_ticking());

    // One tick per second: work (2) + break (1) = 3 ticks, then 0.5 s in.
    assert_eq!(snap.seconds, 2);

    let mut started = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, Event::PhaseStarted { .. }) {
            started += 1;
        }
    }
    assert_eq!(started, 2);
}

#[tokio::test(start_paused = true)]
async fn stop_releases_and_restart_reacquires() {
    let (mut runner, _rx) = runner_for(TechniqueId::Pomodoro, Settings::default());
    runner.start().await;
    time::sleep(Duration::from_millis(2500)).await;
    runner.stop().await;
    assert!(!runner.is_ticking());

    time::sleep(Duration::from_secs(5)).await;
    let snap = runner.snapshot().await;
    assert_eq!(snap.status, TimerStatus::Idle);
    assert_eq!(snap.seconds, 0);

    runner.start().await;
    assert!(runner.is_ticking());
    time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(runner.snapshot().await.seconds, 1499);
}

#[tokio::test(start_paused = true)]
async fn flow_work_counts_up_under_the_ticker() {
    let (mut runner, _rx) = runner_for(
        TechniqueId::Flowtime,
        Catalog::builtin()
            .get(TechniqueId::Flowtime)
            .unwrap()
            .default_settings
            .clone(),
    );
    runner.start().await;
    time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(runner.snapshot().await.seconds, 10);

    runner.skip().await;
    let snap = runner.snapshot().await;
    assert_eq!(snap.phase, Phase::ShortBreak);
    assert_eq!(snap.seconds, 2);
    assert_eq!(snap.status, TimerStatus::Idle);
    assert!(!runner.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn dropping_runner_stops_ticks() {
    let (mut runner, mut rx) = runner_for(
        TechniqueId::Pomodoro,
        Settings {
            work_duration: 2_000,
            ..Settings::default()
        },
    );
    runner.start().await;
    drop(runner);
    time::sleep(Duration::from_secs(5)).await;

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.kind());
    }
    assert_eq!(kinds, vec!["timer_started"]);
}

#[tokio::test(start_paused = true)]
async fn rejected_settings_keep_ticker_state() {
    let (mut runner, _rx) = runner_for(TechniqueId::Pomodoro, Settings::default());
    runner.start().await;
    let result = runner
        .update_settings(Settings {
            short_break_duration: 0,
            ..Settings::default()
        })
        .await;
    assert!(result.is_err());
    assert!(runner.is_ticking());

    runner.update_settings(Settings::default()).await.unwrap();
    assert!(!runner.is_ticking());
    assert_eq!(runner.snapshot().await.status, TimerStatus::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restart_right_after_expiry_always_gets_a_ticker() {
    let (runner, _rx) = runner_for(
        TechniqueId::Pomodoro,
        Settings {
            work_duration: 1_000,
            short_break_duration: 1_000,
            long_break_duration: 1_000,
            ..Settings::default()
        },
    );
    let mut runner = runner.with_tick_interval(Duration::from_millis(1));
    let session = runner.session();

    for round in 0..500 {
        runner.start().await;
        assert!(runner.is_ticking(), "round {round}: running without a ticker");

        // Each phase lasts one tick; restart the moment it goes idle.
        let expired = time::timeout(Duration::from_secs(5), async {
            while session.lock().await.status() == TimerStatus::Running {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(expired.is_ok(), "round {round}: phase never expired");
    }
}
