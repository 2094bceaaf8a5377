use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::warn;

use crate::model::task::{Task, TaskKind};

/// Last-known canonical tasks for one sub-kind, in server order. The only
/// structure allowed to hold server-confirmed data.
#[derive(Debug)]
pub struct EntityStore {
    kind: TaskKind,
    tasks: IndexMap<String, Task>,
    stale: bool,
    last_refresh: Option<DateTime<Utc>>,
}

impl EntityStore {
    /// Create an empty store for one sub-kind, marked stale until the first
    /// refresh lands.
    pub fn new(kind: TaskKind) -> Self {
        EntityStore {
            kind,
            tasks: IndexMap::new(),
            stale: true,
            last_refresh: None,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Swap in an authoritative snapshot, clearing staleness. Tasks of the
    /// wrong sub-kind are dropped with a warning — the fetch seam promised
    /// one kind per call.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        for task in tasks {
            if task.kind != self.kind {
                warn!(
                    id = %task.id,
                    expected = self.kind.as_str(),
                    got = task.kind.as_str(),
                    "dropping task of wrong kind from snapshot"
                );
                continue;
            }
            self.tasks.insert(task.id.clone(), task);
        }
        self.stale = false;
        self.last_refresh = Some(Utc::now());
    }

    /// Remove one entity (deletion events). Does not touch staleness.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        self.tasks.shift_remove(id)
    }

    /// Mark the snapshot out of date without discarding it
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in server order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// When the current snapshot was fetched, if ever
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }
}

/// One entity store per sub-kind
#[derive(Debug)]
pub struct StoreSet {
    scheduled: EntityStore,
    quick: EntityStore,
}

impl StoreSet {
    pub fn new() -> Self {
        StoreSet {
            scheduled: EntityStore::new(TaskKind::Scheduled),
            quick: EntityStore::new(TaskKind::QuickTodo),
        }
    }

    pub fn get(&self, kind: TaskKind) -> &EntityStore {
        match kind {
            TaskKind::Scheduled => &self.scheduled,
            TaskKind::QuickTodo => &self.quick,
        }
    }

    pub fn get_mut(&mut self, kind: TaskKind) -> &mut EntityStore {
        match kind {
            TaskKind::Scheduled => &mut self.scheduled,
            TaskKind::QuickTodo => &mut self.quick,
        }
    }

    /// Look an id up across both stores
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.scheduled.get(id).or_else(|| self.quick.get(id))
    }

    /// Remove an id from whichever store holds it. True if anything was
    /// actually removed.
    pub fn remove_everywhere(&mut self, id: &str) -> bool {
        let a = self.scheduled.remove(id).is_some();
        let b = self.quick.remove(id).is_some();
        a || b
    }
}

impl Default for StoreSet {
    fn default() -> Self {
        Self::new()
    }
}
