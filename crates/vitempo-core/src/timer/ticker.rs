//! Tick source.
//!
//! A [`SessionRunner`] owns the shared session and at most one spawned ticker
//! task. After every action the ticker is brought in line with the timer
//! status: it exists exactly while the status is `Running`.
//!
//! A ticker clears its `live` flag under the session lock at the moment it
//! decides to stop, and actions read the flag under the same lock. A ticker
//! that is still winding down therefore never counts as running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::{TimerSnapshot, TimerStatus};
use crate::error::ValidationError;
use crate::events::Event;
use crate::session::Session;
use crate::settings::Settings;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

struct Ticker {
    handle: JoinHandle<()>,
    live: Arc<AtomicBool>,
}

impl Ticker {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}

pub struct SessionRunner {
    session: Arc<Mutex<Session>>,
    events: mpsc::UnboundedSender<Event>,
    ticker: Option<Ticker>,
    tick_interval: Duration,
}

impl SessionRunner {
    /// Every event, from actions and ticks alike, is sent on `events`.
    pub fn new(session: Session, events: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            events,
            ticker: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn session(&self) -> Arc<Mutex<Session>> {
        self.session.clone()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(Ticker::is_live)
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Run `action` against the session, forward its events and resync the
    /// ticker.
    pub async fn dispatch<F>(&mut self, action: F) -> Vec<Event>
    where
        F: FnOnce(&mut Session) -> Vec<Event>,
    {
        let (events, status, ticking) = {
            let mut session = self.session.lock().await;
            let events = action(&mut *session);
            (events, session.status(), self.is_ticking())
        };
        self.forward(&events);
        self.sync_ticker(status, ticking);
        events
    }

    pub async fn start(&mut self) -> Vec<Event> {
        self.dispatch(Session::start).await
    }

    pub async fn pause(&mut self) -> Vec<Event> {
        self.dispatch(Session::pause).await
    }

    pub async fn resume(&mut self) -> Vec<Event> {
        self.dispatch(Session::resume).await
    }

    pub async fn toggle(&mut self) -> Vec<Event> {
        self.dispatch(Session::toggle).await
    }

    pub async fn stop(&mut self) -> Vec<Event> {
        self.dispatch(Session::stop).await
    }

    pub async fn reset(&mut self) -> Vec<Event> {
        self.dispatch(Session::reset).await
    }

    pub async fn skip(&mut self) -> Vec<Event> {
        self.dispatch(Session::skip).await
    }

    pub async fn update_settings(&mut self, settings: Settings) -> Result<Vec<Event>, ValidationError> {
        let (result, status, ticking) = {
            let mut session = self.session.lock().await;
            let result = session.update_settings(settings);
            (result, session.status(), self.is_ticking())
        };
        if let Ok(events) = &result {
            self.forward(events);
        }
        self.sync_ticker(status, ticking);
        result
    }

    fn forward(&self, events: &[Event]) {
        for event in events {
            // A closed receiver only means nobody is listening any more.
            let _ = self.events.send(event.clone());
        }
    }

    /// `ticking` must be read under the same lock as `status`.
    fn sync_ticker(&mut self, status: TimerStatus, ticking: bool) {
        if status == TimerStatus::Running {
            if !ticking {
                self.acquire();
            }
        } else {
            self.release();
        }
    }

    fn acquire(&mut self) {
        if let Some(old) = self.ticker.take() {
            old.handle.abort();
        }

        let session = self.session.clone();
        let events = self.events.clone();
        let period = self.tick_interval;
        let live = Arc::new(AtomicBool::new(true));
        let task_live = live.clone();
        debug!(?period, "ticker acquired");

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;

                let (produced, status) = {
                    let mut guard = session.lock().await;
                    if guard.status() != TimerStatus::Running {
                        task_live.store(false, Ordering::Release);
                        break;
                    }
                    let produced = guard.tick();
                    let status = guard.status();
                    if status != TimerStatus::Running {
                        task_live.store(false, Ordering::Release);
                    }
                    (produced, status)
                };

                for event in produced {
                    trace!(kind = event.kind(), "tick event");
                    let _ = events.send(event);
                }

                if status != TimerStatus::Running {
                    debug!("ticker finished: timer no longer running");
                    break;
                }
            }
        });
        self.ticker = Some(Ticker { handle, live });
    }

    fn release(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.handle.abort();
            debug!("ticker released");
        }
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Silent;
    use crate::task::TaskList;
    use crate::technique::{Catalog, TechniqueId};
    use crate::timer::Phase;

    fn runner(settings: Settings) -> (SessionRunner, mpsc::UnboundedReceiver<Event>) {
        let technique = Catalog::builtin().get(TechniqueId::Pomodoro).unwrap().clone();
        let session = Session::new(technique, settings, TaskList::new(), Arc::new(Silent));
        let (tx, rx) = mpsc::unbounded_channel();
        (SessionRunner::new(session, tx), rx)
    }

    fn short() -> Settings {
        Settings {
            work_duration: 3_000,
            short_break_duration: 2_000,
            ..Settings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_comes_after_one_interval() {
        let (mut runner, _rx) = runner(short());
        runner.start().await;
        assert!(runner.is_ticking());

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runner.snapshot().await.seconds, 3);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(runner.snapshot().await.seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_releases_ticker() {
        let (mut runner, _rx) = runner(short());
        runner.start().await;
        time::sleep(Duration::from_millis(1500)).await;
        runner.pause().await;
        assert!(!runner.is_ticking());

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runner.snapshot().await.seconds, 2);

        runner.resume().await;
        assert!(runner.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_stops_on_idle_transition() {
        let (mut runner, mut rx) = runner(short());
        runner.start().await;
        time::sleep(Duration::from_millis(3500)).await;

        let snap = runner.snapshot().await;
        assert_eq!(snap.phase, Phase::ShortBreak);
        assert_eq!(snap.status, TimerStatus::Idle);
        assert!(!runner.is_ticking());

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind());
        }
        assert_eq!(
            kinds,
            vec!["timer_started", "phase_complete", "work_cycle_completed", "phase_started"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ticking_matches_running_after_every_action() {
        let (mut runner, _rx) = runner(short());
        let actions: [fn(&mut Session) -> Vec<Event>; 9] = [
            Session::start,
            Session::pause,
            Session::start,
            Session::skip,
            Session::toggle,
            Session::stop,
            Session::start,
            Session::reset,
            Session::reset,
        ];
        for action in actions {
            runner.dispatch(action).await;
            let running = runner.snapshot().await.status == TimerStatus::Running;
            assert_eq!(runner.is_ticking(), running);
        }
    }
}
