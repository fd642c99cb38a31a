//! One active timer bound to a technique, its settings and the task list.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::Notifier;
use crate::settings::Settings;
use crate::task::{Task, TaskList, TaskProgress};
use crate::technique::TechniqueDefinition;
use crate::timer::{engine_for, Phase, PhaseTimer, TimerSnapshot, TimerStatus};

pub struct Session {
    engine: Box<dyn PhaseTimer>,
    tasks: TaskList,
    progress: TaskProgress,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("technique", &self.engine.technique().id)
            .field("status", &self.engine.status())
            .field("phase", &self.engine.phase())
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        technique: TechniqueDefinition,
        settings: Settings,
        tasks: TaskList,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let engine = engine_for(technique, settings, notifier.clone());
        let progress = TaskProgress::new(engine.completed_work_cycles());
        Self {
            engine,
            tasks,
            progress,
            notifier,
        }
    }

    pub fn technique(&self) -> &TechniqueDefinition {
        self.engine.technique()
    }

    pub fn settings(&self) -> &Settings {
        self.engine.settings()
    }

    pub fn status(&self) -> TimerStatus {
        self.engine.status()
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn engine(&self) -> &dyn PhaseTimer {
        self.engine.as_ref()
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    pub fn start(&mut self) -> Vec<Event> {
        let events = self.engine.start();
        self.reconcile(events)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let events = self.engine.pause();
        self.reconcile(events)
    }

    pub fn resume(&mut self) -> Vec<Event> {
        let events = self.engine.resume();
        self.reconcile(events)
    }

    /// Pause when running, resume when paused, start otherwise.
    pub fn toggle(&mut self) -> Vec<Event> {
        match self.engine.status() {
            TimerStatus::Running => self.pause(),
            TimerStatus::Paused => self.resume(),
            TimerStatus::Idle | TimerStatus::Completed => self.start(),
        }
    }

    pub fn stop(&mut self) -> Vec<Event> {
        let events = self.engine.stop();
        self.reconcile(events)
    }

    pub fn reset(&mut self) -> Vec<Event> {
        let events = self.engine.reset();
        self.reconcile(events)
    }

    pub fn skip(&mut self) -> Vec<Event> {
        let events = self.engine.skip();
        self.reconcile(events)
    }

    pub fn tick(&mut self) -> Vec<Event> {
        let events = self.engine.tick();
        self.reconcile(events)
    }

    /// Replace the engine with one for `technique`. Timer state is discarded;
    /// the task list is kept.
    pub fn switch_technique(&mut self, technique: TechniqueDefinition, settings: Settings) -> Vec<Event> {
        info!(from = %self.engine.technique().id, to = %technique.id, "switching technique");
        self.engine = engine_for(technique, settings, self.notifier.clone());
        self.progress = TaskProgress::new(self.engine.completed_work_cycles());
        vec![Event::TimerReset { at: Utc::now() }]
    }

    /// Validate and apply new settings; the timer is reset.
    pub fn update_settings(&mut self, settings: Settings) -> Result<Vec<Event>, ValidationError> {
        settings.validate(self.engine.technique())?;
        let events = self.engine.update_settings(settings);
        Ok(self.reconcile(events))
    }

    pub fn replace_tasks(&mut self, tasks: TaskList) {
        self.tasks = tasks;
    }

    pub fn add_task(&mut self, title: &str, estimated_cycles: u32) -> Result<Task, ValidationError> {
        self.tasks.add(title, estimated_cycles).cloned()
    }

    pub fn edit_task(
        &mut self,
        id: &str,
        title: &str,
        estimated_cycles: u32,
    ) -> Result<Task, ValidationError> {
        self.tasks.edit(id, title, estimated_cycles).cloned()
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, ValidationError> {
        self.tasks.delete(id)
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<Task, ValidationError> {
        self.tasks.toggle_complete(id).cloned()
    }

    pub fn move_task(&mut self, dragged: &str, target: &str) -> Result<bool, ValidationError> {
        self.tasks.move_task(dragged, target)
    }

    pub fn assign_current(&mut self, id: &str) -> Result<bool, ValidationError> {
        self.tasks.assign_current(id)
    }

    /// Credit newly completed work cycles to the current task.
    fn reconcile(&mut self, mut events: Vec<Event>) -> Vec<Event> {
        let total = self.engine.completed_work_cycles();
        let enabled = self.engine.settings().auto_check_tasks_on_completion;
        if let Some(task) = self.progress.observe(total, enabled, &mut self.tasks) {
            events.push(Event::TaskProgressed {
                is_complete: task.is_complete(),
                task_id: task.id,
                title: task.title,
                completed_cycles: task.completed_cycles,
                estimated_cycles: task.estimated_cycles,
                at: Utc::now(),
            });
        }
        events
    }
}
