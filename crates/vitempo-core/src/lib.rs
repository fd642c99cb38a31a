//! # Vitempo Core Library
//!
//! Core logic for the Vitempo productivity timer. Every operation is
//! available through the `vitempo` CLI, which is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Timer engines**: phase state machines advanced one second at a time by
//!   `tick()`. [`TimerEngine`] runs fixed intervals, [`FlowEngine`] runs an
//!   open-ended work phase with a proportional break.
//! - **Tick source**: [`SessionRunner`] drives a [`Session`] from a tokio
//!   interval that exists only while the timer runs.
//! - **Tasks**: an ordered task list credited with completed work cycles.
//! - **Storage**: SQLite key/value store for settings and tasks, TOML for
//!   application configuration.
//!
//! ## Key Components
//!
//! - [`Session`]: technique + settings + engine + task list
//! - [`Catalog`]: the available techniques
//! - [`Settings`]: per-technique durations and policies
//! - [`Database`]: key/value persistence
//! - [`Config`]: application configuration

pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod settings;
pub mod storage;
pub mod task;
pub mod technique;
pub mod time_format;
pub mod timer;

pub use error::{ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::Event;
pub use notify::{Muted, NotificationKind, NotificationPrefs, Notifier, Silent, TerminalBell};
pub use session::Session;
pub use settings::{migrate, Settings};
pub use storage::{Config, Database, KeyValueStore};
pub use task::{Task, TaskList, TaskProgress};
pub use technique::{Catalog, TechniqueDefinition, TechniqueId};
pub use timer::{
    FlowEngine, Phase, PhaseTimer, SessionRunner, TimerEngine, TimerSnapshot, TimerStatus,
};
