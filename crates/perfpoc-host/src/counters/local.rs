use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use perfpoc_core::error::{PerfError, Result};
use perfpoc_core::{CounterSample, MetricCategory, MetricKind};

use super::{CounterHandle, CounterSubsystem};
use crate::config::CountersSection;

struct CategoryEntry {
    def: MetricCategory,
    cells: Vec<Arc<AtomicI64>>,
}

impl CategoryEntry {
    fn new(def: MetricCategory) -> Self {
        let cells = def.descriptors.iter().map(|_| Arc::new(AtomicI64::new(0))).collect();
        Self { def, cells }
    }

    fn position(&self, counter: &str) -> Option<usize> {
        self.def.descriptors.iter().position(|d| d.name == counter)
    }
}

/// In-process counter subsystem.
///
/// Values live in memory only. With a state file, category definitions are
/// written on every create/delete and reloaded (with zeroed values) on open.
pub struct LocalCounters {
    categories: DashMap<String, Arc<CategoryEntry>>,
    state_file: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl LocalCounters {
    /// Purely in-memory subsystem.
    pub fn in_memory() -> Self {
        Self {
            categories: DashMap::new(),
            state_file: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Subsystem backed by `state_file`; a missing file means no categories yet.
    pub fn open(state_file: impl AsRef<Path>) -> Result<Self> {
        let path = state_file.as_ref().to_path_buf();
        let categories = DashMap::new();

        if path.exists() {
            let s = fs::read_to_string(&path)
                .map_err(|e| PerfError::Io(format!("read {} failed: {e}", path.display())))?;
            let defs: Vec<MetricCategory> = serde_json::from_str(&s)
                .map_err(|e| PerfError::Io(format!("parse {} failed: {e}", path.display())))?;
            for def in defs {
                def.validate()?;
                tracing::debug!(category = %def.name, counters = def.descriptors.len(), "loaded category definition");
                categories.insert(def.name.clone(), Arc::new(CategoryEntry::new(def)));
            }
        }

        Ok(Self {
            categories,
            state_file: Some(path),
            persist_lock: Mutex::new(()),
        })
    }

    pub fn from_config(cfg: &CountersSection) -> Result<Self> {
        match &cfg.state_file {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory()),
        }
    }

    fn entry(&self, category: &str) -> Option<Arc<CategoryEntry>> {
        self.categories.get(category).map(|e| Arc::clone(e.value()))
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.state_file else { return Ok(()) };
        let _guard = self
            .persist_lock
            .lock()
            .map_err(|_| PerfError::Internal("state file lock poisoned".into()))?;

        let mut defs: Vec<MetricCategory> = self.categories.iter().map(|e| e.value().def.clone()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));

        let body = serde_json::to_string_pretty(&defs)
            .map_err(|e| PerfError::Internal(format!("encode category definitions: {e}")))?;
        fs::write(path, body).map_err(|e| PerfError::Io(format!("write {} failed: {e}", path.display())))
    }
}

impl CounterSubsystem for LocalCounters {
    fn category_exists(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    fn counter_exists(&self, category: &str, counter: &str) -> bool {
        self.counter_kind(category, counter).is_some()
    }

    fn counter_kind(&self, category: &str, counter: &str) -> Option<MetricKind> {
        let entry = self.entry(category)?;
        entry.def.descriptor(counter).map(|d| d.kind)
    }

    fn create_category(&self, category: &MetricCategory) -> Result<()> {
        category.validate()?;
        match self.categories.entry(category.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(PerfError::CategoryExists(category.name.clone()));
            }
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(Arc::new(CategoryEntry::new(category.clone())));
            }
        }
        self.persist()
    }

    fn delete_category(&self, category: &str) -> Result<()> {
        if self.categories.remove(category).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn open_counter(&self, category: &str, counter: &str) -> Result<CounterHandle> {
        let entry = self
            .entry(category)
            .ok_or_else(|| PerfError::CategoryNotFound(category.to_string()))?;
        let idx = entry.position(counter).ok_or_else(|| PerfError::CounterNotFound {
            category: category.to_string(),
            counter: counter.to_string(),
        })?;
        let d = &entry.def.descriptors[idx];
        Ok(CounterHandle::new(d.name.as_str(), d.kind, Arc::clone(&entry.cells[idx])))
    }

    fn sample(&self, category: &str) -> Result<Vec<CounterSample>> {
        let entry = self
            .entry(category)
            .ok_or_else(|| PerfError::CategoryNotFound(category.to_string()))?;
        Ok(entry
            .def
            .descriptors
            .iter()
            .zip(&entry.cells)
            .map(|(d, cell)| CounterSample {
                name: d.name.clone(),
                kind: d.kind,
                raw: cell.load(Ordering::Acquire),
            })
            .collect())
    }
}
