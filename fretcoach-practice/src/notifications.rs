//! Notification log shown under the fretboard
//!
//! Ids come from a counter owned by the log instance. Auto-removed entries
//! expire after the configured lifetime; others stay until removed.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationKind {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    expires_at: Option<Instant>,
}

#[derive(Debug)]
pub struct NotificationLog {
    items: Vec<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl NotificationLog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            ttl,
        }
    }

    pub fn add(&mut self, message: impl Into<String>, kind: NotificationKind, auto_remove: bool) -> u64 {
        self.add_at(Instant::now(), message, kind, auto_remove)
    }

    pub fn add_at(
        &mut self,
        now: Instant,
        message: impl Into<String>,
        kind: NotificationKind,
        auto_remove: bool,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let expires_at = auto_remove.then(|| now + self.ttl);
        self.items.push(Notification {
            id,
            message: message.into(),
            kind,
            expires_at,
        });
        id
    }

    /// Returns false when the id is unknown or already gone
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop expired entries
    pub fn prune(&mut self, now: Instant) {
        self.items
            .retain(|n| n.expires_at.map(|at| at > now).unwrap_or(true));
    }

    /// Entries still visible at `now`, oldest first
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Notification> {
        self.items
            .iter()
            .filter(move |n| n.expires_at.map(|at| at > now).unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_per_log_and_increasing() {
        let mut first = NotificationLog::new(Duration::from_secs(3));
        let mut second = NotificationLog::new(Duration::from_secs(3));

        assert_eq!(first.add("a", NotificationKind::Info, true), 1);
        assert_eq!(first.add("b", NotificationKind::Info, true), 2);
        assert_eq!(second.add("c", NotificationKind::Info, true), 1);
    }

    #[test]
    fn test_auto_removed_entries_expire() {
        let mut log = NotificationLog::new(Duration::from_secs(3));
        let start = Instant::now();
        log.add_at(start, "Correct!", NotificationKind::Success, true);
        log.add_at(start, "Sensor offline", NotificationKind::Error, false);

        assert_eq!(log.active(start + Duration::from_secs(2)).count(), 2);

        let later = start + Duration::from_secs(3);
        let visible: Vec<_> = log.active(later).map(|n| n.message.as_str()).collect();
        assert_eq!(visible, vec!["Sensor offline"]);

        log.prune(later);
        assert_eq!(log.active(start).count(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut log = NotificationLog::new(Duration::from_secs(3));
        let id = log.add("x", NotificationKind::Warning, false);
        log.add("y", NotificationKind::Warning, false);

        assert!(log.remove(id));
        assert!(!log.remove(id));
        log.clear();
        assert_eq!(log.active(Instant::now()).count(), 0);
    }
}
