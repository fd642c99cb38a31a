//! Task list and its coupling to completed work cycles.
//!
//! The list is ordered; order is user-controlled through `move_task`. One
//! task may be marked current. Work-cycle progress goes to the *effective*
//! current task: the marked one while it is still incomplete, otherwise the
//! first incomplete task in list order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;

const TITLE_REQUIRED: &str = "Task title is required";
const ESTIMATE_TOO_LOW: &str = "Estimated cycles must be at least 1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub estimated_cycles: u32,
    #[serde(default)]
    pub completed_cycles: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_complete(&self) -> bool {
        self.completed_cycles >= self.estimated_cycles
    }
}

fn checked_input(title: &str, estimated_cycles: u32) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Required(TITLE_REQUIRED.into()));
    }
    if estimated_cycles < 1 {
        return Err(ValidationError::Required(ESTIMATE_TOO_LOW.into()));
    }
    Ok(title.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    current_task_id: Option<String>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The stored pointer, which may name a completed task.
    pub fn current_task_id(&self) -> Option<&str> {
        self.current_task_id.as_deref()
    }

    fn index_of(&self, id: &str) -> Result<usize, ValidationError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::TaskNotFound(id.to_string()))
    }

    /// Append a new task.
    pub fn add(&mut self, title: &str, estimated_cycles: u32) -> Result<&Task, ValidationError> {
        let title = checked_input(title, estimated_cycles)?;
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            estimated_cycles,
            completed_cycles: 0,
            created_at: Utc::now(),
        };
        debug!(id = %task.id, "task added");
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Replace title and estimate; completed cycles are kept.
    pub fn edit(
        &mut self,
        id: &str,
        title: &str,
        estimated_cycles: u32,
    ) -> Result<&Task, ValidationError> {
        let title = checked_input(title, estimated_cycles)?;
        let index = self.index_of(id)?;
        let task = &mut self.tasks[index];
        task.title = title;
        task.estimated_cycles = estimated_cycles;
        Ok(task)
    }

    pub fn delete(&mut self, id: &str) -> Result<Task, ValidationError> {
        let index = self.index_of(id)?;
        if self.current_task_id.as_deref() == Some(id) {
            self.current_task_id = None;
        }
        Ok(self.tasks.remove(index))
    }

    pub fn effective_current(&self) -> Option<&Task> {
        self.effective_index().map(|i| &self.tasks[i])
    }

    fn effective_index(&self) -> Option<usize> {
        self.current_task_id
            .as_deref()
            .and_then(|id| self.tasks.iter().position(|t| t.id == id && !t.is_complete()))
            .or_else(|| self.tasks.iter().position(|t| !t.is_complete()))
    }

    /// Mark `id` as current. Completed tasks are refused; returns whether the
    /// pointer changed.
    pub fn assign_current(&mut self, id: &str) -> Result<bool, ValidationError> {
        let index = self.index_of(id)?;
        if self.tasks[index].is_complete() {
            return Ok(false);
        }
        if self.current_task_id.as_deref() == Some(id) {
            return Ok(false);
        }
        self.current_task_id = Some(id.to_string());
        Ok(true)
    }

    /// Move `dragged` into the slot currently held by `target`.
    pub fn move_task(&mut self, dragged: &str, target: &str) -> Result<bool, ValidationError> {
        let to = self.index_of(target)?;
        self.move_to(dragged, to)
    }

    /// Move `id` to `index`, clamped to the end of the list.
    pub fn move_to(&mut self, id: &str, index: usize) -> Result<bool, ValidationError> {
        let from = self.index_of(id)?;
        let to = index.min(self.tasks.len() - 1);
        if from == to {
            return Ok(false);
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        Ok(true)
    }

    /// Flip between fully done and not started.
    pub fn toggle_complete(&mut self, id: &str) -> Result<&Task, ValidationError> {
        let index = self.index_of(id)?;
        let task = &mut self.tasks[index];
        task.completed_cycles = if task.is_complete() {
            0
        } else {
            task.estimated_cycles
        };
        Ok(task)
    }

    /// Credit `delta` cycles to the effective current task, capped at its
    /// estimate. Returns the task after the update.
    pub fn record_cycles(&mut self, delta: u32) -> Option<Task> {
        if delta == 0 {
            return None;
        }
        let index = self.effective_index()?;
        let task = &mut self.tasks[index];
        task.completed_cycles = task
            .completed_cycles
            .saturating_add(delta)
            .min(task.estimated_cycles);
        debug!(id = %task.id, completed = task.completed_cycles, "task progressed");
        Some(task.clone())
    }
}

/// Turns the engine's cumulative work-cycle counter into per-task progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskProgress {
    last_observed: u32,
}

impl TaskProgress {
    pub fn new(baseline: u32) -> Self {
        Self {
            last_observed: baseline,
        }
    }

    pub fn last_observed(&self) -> u32 {
        self.last_observed
    }

    /// Observe the counter. A counter that went down (engine reset) only
    /// rebases. Progress is credited only when `enabled`.
    pub fn observe(&mut self, total: u32, enabled: bool, tasks: &mut TaskList) -> Option<Task> {
        let delta = total.saturating_sub(self.last_observed);
        self.last_observed = total;
        if !enabled {
            return None;
        }
        tasks.record_cycles(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(items: &[(&str, u32)]) -> TaskList {
        let mut list = TaskList::new();
        for (title, est) in items {
            list.add(title, *est).unwrap();
        }
        list
    }

    fn ids(list: &TaskList) -> Vec<String> {
        list.tasks().iter().map(|t| t.id.clone()).collect()
    }

    fn titles(list: &TaskList) -> Vec<&str> {
        list.tasks().iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn add_trims_and_validates() {
        let mut list = TaskList::new();
        let task = list.add("  write report  ", 3).unwrap().clone();
        assert_eq!(task.title, "write report");
        assert_eq!(task.completed_cycles, 0);

        let err = list.add("   ", 1).unwrap_err();
        assert_eq!(err.to_string(), "Task title is required");
        let err = list.add("x", 0).unwrap_err();
        assert_eq!(err.to_string(), "Estimated cycles must be at least 1");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn edit_keeps_progress() {
        let mut list = list_of(&[("a", 3)]);
        let id = ids(&list)[0].clone();
        list.record_cycles(2);
        let task = list.edit(&id, "renamed", 5).unwrap();
        assert_eq!(task.title, "renamed");
        assert_eq!(task.completed_cycles, 2);
        assert!(list.edit("missing", "x", 1).is_err());
    }

    #[test]
    fn delete_clears_current_pointer() {
        let mut list = list_of(&[("a", 1), ("b", 1)]);
        let id = ids(&list)[1].clone();
        list.assign_current(&id).unwrap();
        list.delete(&id).unwrap();
        assert_eq!(list.current_task_id(), None);
        assert_eq!(titles(&list), vec!["a"]);
    }

    #[test]
    fn effective_current_skips_completed() {
        let mut list = list_of(&[("a", 1), ("b", 2), ("c", 2)]);
        let [a, b, c]: [String; 3] = ids(&list).try_into().unwrap();

        assert_eq!(list.effective_current().unwrap().id, a);
        list.assign_current(&c).unwrap();
        assert_eq!(list.effective_current().unwrap().id, c);

        list.toggle_complete(&c).unwrap();
        // Pointer still names c, but it is complete.
        assert_eq!(list.current_task_id(), Some(c.as_str()));
        assert_eq!(list.effective_current().unwrap().id, a);

        list.toggle_complete(&a).unwrap();
        assert_eq!(list.effective_current().unwrap().id, b);
    }

    #[test]
    fn assign_current_refuses_completed() {
        let mut list = list_of(&[("a", 1)]);
        let id = ids(&list)[0].clone();
        list.toggle_complete(&id).unwrap();
        assert_eq!(list.assign_current(&id), Ok(false));
        assert_eq!(list.current_task_id(), None);
        assert!(list.assign_current("nope").is_err());
    }

    #[test]
    fn record_cycles_clamps_to_estimate() {
        let mut list = list_of(&[("a", 2), ("b", 2)]);
        let task = list.record_cycles(5).unwrap();
        assert_eq!(task.title, "a");
        assert_eq!(task.completed_cycles, 2);
        assert!(task.is_complete());

        let next = list.record_cycles(1).unwrap();
        assert_eq!(next.title, "b");
        assert_eq!(next.completed_cycles, 1);
    }

    #[test]
    fn record_cycles_without_open_tasks() {
        let mut list = list_of(&[("a", 1)]);
        list.record_cycles(1);
        assert!(list.record_cycles(1).is_none());
        assert!(TaskList::new().record_cycles(1).is_none());
    }

    #[test]
    fn toggle_is_binary() {
        let mut list = list_of(&[("a", 4)]);
        let id = ids(&list)[0].clone();
        list.record_cycles(2);
        assert_eq!(list.toggle_complete(&id).unwrap().completed_cycles, 4);
        assert_eq!(list.toggle_complete(&id).unwrap().completed_cycles, 0);
    }

    #[test]
    fn move_task_splices() {
        let mut list = list_of(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)]);
        let [a, _, c, d]: [String; 4] = ids(&list).try_into().unwrap();

        assert!(list.move_task(&a, &c).unwrap());
        assert_eq!(titles(&list), vec!["b", "c", "a", "d"]);

        assert!(list.move_task(&d, &ids(&list)[0]).unwrap());
        assert_eq!(titles(&list), vec!["d", "b", "c", "a"]);

        assert!(!list.move_task(&d, &d).unwrap());
        assert!(list.move_to(&d, 99).unwrap());
        assert_eq!(titles(&list), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn progress_rebases_on_reset() {
        let mut list = list_of(&[("a", 5)]);
        let mut progress = TaskProgress::default();

        assert_eq!(progress.observe(1, true, &mut list).unwrap().completed_cycles, 1);
        assert!(progress.observe(1, true, &mut list).is_none());
        // Engine reset drops the counter back to zero.
        assert!(progress.observe(0, true, &mut list).is_none());
        assert_eq!(progress.observe(1, true, &mut list).unwrap().completed_cycles, 2);
    }

    #[test]
    fn progress_credits_multi_cycle_jump() {
        let mut list = list_of(&[("a", 5), ("b", 2)]);
        let mut progress = TaskProgress::default();

        let task = progress.observe(3, true, &mut list).unwrap();
        assert_eq!(task.title, "a");
        assert_eq!(task.completed_cycles, 3);
        assert_eq!(progress.last_observed(), 3);

        // A jump past the estimate is capped; the overflow is not carried to "b".
        let task = progress.observe(10, true, &mut list).unwrap();
        assert_eq!(task.completed_cycles, 5);
        assert!(task.is_complete());
        assert_eq!(list.tasks()[1].completed_cycles, 0);
    }

    #[test]
    fn progress_disabled_still_advances() {
        let mut list = list_of(&[("a", 5)]);
        let mut progress = TaskProgress::default();
        assert!(progress.observe(2, false, &mut list).is_none());
        assert_eq!(progress.last_observed(), 2);
        assert_eq!(list.tasks()[0].completed_cycles, 0);
        assert_eq!(progress.observe(3, true, &mut list).unwrap().completed_cycles, 1);
    }

    #[test]
    fn task_list_json_shape() {
        let list = list_of(&[("a", 2)]);
        let json = serde_json::to_value(&list).unwrap();
        assert!(json["tasks"][0].get("estimatedCycles").is_some());
        assert!(json.get("currentTaskId").is_some());
        let back: TaskList = serde_json::from_value(json).unwrap();
        assert_eq!(back, list);
    }
}
