//! Notification side channel.
//!
//! The engines call [`Notifier::notify`] at phase boundaries. Delivery is
//! best effort: an implementation that cannot reach its output just returns.
//! Muting is an explicit, shared preference object rather than global state,
//! so separate sessions (and tests) stay isolated.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Start,
    Break,
    Complete,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind);
}

/// User-controlled mute toggle shared by everything built from it.
#[derive(Debug, Clone, Default)]
pub struct NotificationPrefs {
    muted: Arc<AtomicBool>,
}

impl NotificationPrefs {
    pub fn new(muted: bool) -> Self {
        Self {
            muted: Arc::new(AtomicBool::new(muted)),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }
}

/// Drops notifications while the shared preference is muted.
pub struct Muted<N> {
    inner: N,
    prefs: NotificationPrefs,
}

impl<N: Notifier> Muted<N> {
    pub fn new(inner: N, prefs: NotificationPrefs) -> Self {
        Self { inner, prefs }
    }
}

impl<N: Notifier> Notifier for Muted<N> {
    fn notify(&self, kind: NotificationKind) {
        if self.prefs.is_muted() {
            return;
        }
        self.inner.notify(kind);
    }
}

/// No-op notifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, _kind: NotificationKind) {}
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn notify(&self, kind: NotificationKind) {
        // Break and completion ring twice so they are distinguishable by ear.
        let bell: &[u8] = match kind {
            NotificationKind::Start => b"\x07",
            NotificationKind::Break | NotificationKind::Complete => b"\x07\x07",
        };
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(bell).and_then(|_| stderr.flush());
        tracing::debug!(?kind, "notification");
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, kind: NotificationKind) {
        (**self).notify(kind);
    }
}
