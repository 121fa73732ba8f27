//! Launch registry: tag allocation and in-flight launch records
//!
//! Every asynchronous launch is handed an opaque numeric tag and a record in
//! this registry. The record holds the exit callback (or its tombstone once
//! cancelled) together with a little metadata for logging. Records live from
//! launch until the exit watcher removes them; a child that never exits
//! leaves its record in the table forever, which is a known resource
//! boundary of this design rather than something the registry reclaims.
//!
//! The registry is an explicitly owned instance shared via `Arc`, so tests
//! and embedders can run several independent registries in one process.

use dashmap::DashMap;
use schema::LaunchExit;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Opaque handle identifying one in-flight async launch
///
/// Tags are allocated monotonically and are never `0`, so `0` stays
/// available to external consumers as a "no launch" marker. A tag is only
/// meaningful to the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaunchTag(u64);

impl LaunchTag {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value of the tag
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LaunchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked with the child's exit information
///
/// Whatever user data the caller wants delivered travels inside the
/// closure's captures. Records are shared across the runtime's threads, so
/// the captures must be `Send + Sync`.
pub type ExitCallback = Box<dyn FnOnce(LaunchExit) + Send + Sync + 'static>;

/// Whether a record's callback will fire on exit
pub enum Notice {
    /// Callback still registered and will be invoked at exit
    Armed(ExitCallback),
    /// Callback dropped by a cancel; the exit is absorbed silently
    Suppressed,
}

impl fmt::Debug for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Armed(_) => f.write_str("Armed"),
            Notice::Suppressed => f.write_str("Suppressed"),
        }
    }
}

/// Bookkeeping entry for one in-flight launch
#[derive(Debug)]
pub struct LaunchRecord {
    /// Callback state for this launch
    pub notice: Notice,
    /// Process ID of the launched child
    pub pid: u32,
    /// Command line, joined for display
    pub command: String,
    /// Timestamp when the launch was registered
    pub started_at: String,
}

/// Table of in-flight launches keyed by tag
#[derive(Debug, Default)]
pub struct LaunchRegistry {
    records: DashMap<u64, LaunchRecord>,
    next_tag: AtomicU64,
}

impl LaunchRegistry {
    /// Create an empty registry; the first allocated tag is `1`
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_tag: AtomicU64::new(1),
        }
    }

    #[cfg(test)]
    fn with_first_tag(first: u64) -> Self {
        Self {
            records: DashMap::new(),
            next_tag: AtomicU64::new(first),
        }
    }

    fn allocate_tag(&self) -> LaunchTag {
        loop {
            let raw = self.next_tag.fetch_add(1, Ordering::Relaxed);
            // 0 is reserved as the "no launch" marker; skip it on wrap
            if raw != 0 {
                return LaunchTag::from_raw(raw);
            }
        }
    }

    /// Insert a record for a freshly spawned child and return its tag
    ///
    /// # Panics
    ///
    /// Panics if the allocated tag is already present. A duplicate tag would
    /// silently corrupt another launch's bookkeeping, so this is treated as
    /// a programming error rather than a recoverable condition.
    pub fn register(&self, pid: u32, command: String, callback: ExitCallback) -> LaunchTag {
        let tag = self.allocate_tag();
        let record = LaunchRecord {
            notice: Notice::Armed(callback),
            pid,
            command,
            started_at: LaunchExit::current_timestamp(),
        };

        let previous = self.records.insert(tag.as_u64(), record);
        assert!(
            previous.is_none(),
            "launch tag {} allocated twice; registry bookkeeping corrupted",
            tag
        );

        debug!("Registered launch tag {} for pid {}", tag, pid);
        tag
    }

    /// Suppress the exit notification for `tag`
    ///
    /// The record stays in the table until the child exits; only its
    /// callback is dropped. Unknown tags (already exited, never issued) are
    /// ignored, as are repeat suppressions.
    pub fn suppress(&self, tag: LaunchTag) {
        match self.records.get_mut(&tag.as_u64()) {
            Some(mut record) => {
                if matches!(record.notice, Notice::Armed(_)) {
                    record.notice = Notice::Suppressed;
                    debug!("Suppressed exit notification for tag {}", tag);
                } else {
                    debug!("Tag {} already suppressed", tag);
                }
            }
            None => {
                debug!("Cancel for unknown tag {} ignored", tag);
            }
        }
    }

    /// Take the record for `tag` out of the table, if present
    ///
    /// The exit watcher calls this once per child exit. Invoking the
    /// returned record's callback happens entirely outside the registry, so
    /// no table lock is held during the callback.
    pub fn remove(&self, tag: LaunchTag) -> Option<LaunchRecord> {
        self.records.remove(&tag.as_u64()).map(|(_, record)| record)
    }

    /// Whether `tag` currently names a live record
    #[must_use]
    pub fn contains(&self, tag: LaunchTag) -> bool {
        self.records.contains_key(&tag.as_u64())
    }

    /// Number of in-flight launches
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no launches are in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tags of all in-flight launches, in no particular order
    #[must_use]
    pub fn live_tags(&self) -> Vec<LaunchTag> {
        self.records
            .iter()
            .map(|entry| LaunchTag::from_raw(*entry.key()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn noop() -> ExitCallback {
        Box::new(|_| {})
    }

    fn fake_exit(pid: u32) -> LaunchExit {
        LaunchExit {
            pid,
            exit_code: Some(0),
            signal: None,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_tags_unique_and_nonzero() {
        let registry = LaunchRegistry::new();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let tag = registry.register(1, "cmd".to_string(), noop());
            assert_ne!(tag.as_u64(), 0);
            assert!(seen.insert(tag), "tag {} issued twice", tag);
        }
        assert_eq!(registry.len(), 1000);
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        // The registry lives in an Arc that crosses task and thread
        // boundaries; records (and the callbacks inside them) go with it.
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LaunchRegistry>();
        assert_send_sync::<LaunchRecord>();
    }

    #[test]
    fn test_tags_unique_across_threads() {
        let registry = LaunchRegistry::new();
        let mut all = Vec::new();
        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for _ in 0..8 {
                handles.push(scope.spawn(|| {
                    (0..100)
                        .map(|_| registry.register(1, "cmd".to_string(), noop()))
                        .collect::<Vec<_>>()
                }));
            }
            for handle in handles {
                all.extend(handle.join().expect("register thread panicked"));
            }
        });
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), 800);
        assert!(!unique.contains(&LaunchTag::from_raw(0)));
    }

    #[test]
    fn test_allocator_skips_zero_on_wrap() {
        let registry = LaunchRegistry::with_first_tag(u64::MAX);
        let first = registry.register(1, "a".to_string(), noop());
        let second = registry.register(2, "b".to_string(), noop());
        assert_eq!(first.as_u64(), u64::MAX);
        assert_eq!(second.as_u64(), 1);
    }

    #[test]
    fn test_remove_returns_armed_record() {
        let registry = LaunchRegistry::new();
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let tag = registry.register(
            42,
            "/bin/true".to_string(),
            Box::new(move |exit| {
                assert_eq!(exit.pid, 42);
                flag.store(true, Ordering::SeqCst);
            }),
        );

        let record = registry.remove(tag).expect("record should exist");
        assert_eq!(record.pid, 42);
        assert_eq!(record.command, "/bin/true");
        match record.notice {
            Notice::Armed(callback) => callback(fake_exit(42)),
            Notice::Suppressed => panic!("record should still be armed"),
        }
        assert!(invoked.load(Ordering::SeqCst));
        assert!(!registry.contains(tag));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_suppress_tombstones_record() {
        let registry = LaunchRegistry::new();
        let tag = registry.register(7, "sleep".to_string(), noop());

        registry.suppress(tag);
        // Record stays live until the child exits
        assert!(registry.contains(tag));
        assert_eq!(registry.len(), 1);

        let record = registry.remove(tag).expect("record should exist");
        assert!(matches!(record.notice, Notice::Suppressed));
    }

    #[test]
    fn test_suppress_is_idempotent() {
        let registry = LaunchRegistry::new();
        let tag = registry.register(7, "sleep".to_string(), noop());
        registry.suppress(tag);
        registry.suppress(tag);
        let record = registry.remove(tag).expect("record should exist");
        assert!(matches!(record.notice, Notice::Suppressed));
    }

    #[test]
    fn test_suppress_unknown_tag_is_noop() {
        let registry = LaunchRegistry::new();
        registry.suppress(LaunchTag::from_raw(12345));
        assert!(registry.is_empty());

        // A tag that already completed behaves the same way
        let tag = registry.register(1, "true".to_string(), noop());
        registry.remove(tag);
        registry.suppress(tag);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_tag_returns_none() {
        let registry = LaunchRegistry::new();
        assert!(registry.remove(LaunchTag::from_raw(9)).is_none());
    }

    #[test]
    fn test_live_tags() {
        let registry = LaunchRegistry::new();
        let a = registry.register(1, "a".to_string(), noop());
        let b = registry.register(2, "b".to_string(), noop());
        let mut tags = registry.live_tags();
        tags.sort();
        assert_eq!(tags, vec![a, b]);
    }
}
