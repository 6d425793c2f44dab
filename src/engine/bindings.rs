//! Key Path Binding Table - Observed property paths → dirty categories.
//!
//! One observation per key path, any number of bindings on it. When the
//! observed value changes, the union of the bound categories is marked
//! dirty, immediately if any binding asks for it.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::observe::Observation;
use crate::types::DirtyType;

/// One key path → dirty category association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPathBinding {
    pub key_path: String,
    pub dirty_type: DirtyType,
    /// Update synchronously on change instead of waiting for the next tick.
    pub update_immediately: bool,
}

impl KeyPathBinding {
    pub fn new(key_path: impl Into<String>, dirty_type: DirtyType) -> Self {
        Self {
            key_path: key_path.into(),
            dirty_type,
            update_immediately: false,
        }
    }

    pub fn immediate(mut self) -> Self {
        self.update_immediately = true;
        self
    }
}

/// Resolved effect of a key path change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingEffect {
    pub dirty_type: DirtyType,
    pub update_immediately: bool,
}

struct Entry {
    bindings: Vec<KeyPathBinding>,
    // Held for its Drop: releasing it stops the observation.
    _observation: Observation,
}

/// Bindings of one coordinator, keyed by key path.
#[derive(Default)]
pub struct KeyPathBindingTable {
    entries: RefCell<HashMap<String, Entry>>,
}

impl std::fmt::Debug for KeyPathBindingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPathBindingTable")
            .field("key_paths", &self.key_paths())
            .finish()
    }
}

impl KeyPathBindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `binding` to the table.
    ///
    /// The first binding for a key path calls `observe` to start watching it;
    /// an error from `observe` is returned and nothing is recorded. Binding a
    /// category that is already bound on the path replaces its immediacy.
    pub fn bind(
        &self,
        binding: KeyPathBinding,
        observe: impl FnOnce() -> Result<Observation>,
    ) -> Result<()> {
        {
            let mut entries = self.entries.borrow_mut();
            if let Some(entry) = entries.get_mut(&binding.key_path) {
                debug!(key_path = %binding.key_path, dirty_type = ?binding.dirty_type, "key path binding added");
                match entry
                    .bindings
                    .iter_mut()
                    .find(|b| b.dirty_type == binding.dirty_type)
                {
                    Some(existing) => existing.update_immediately = binding.update_immediately,
                    None => entry.bindings.push(binding),
                }
                return Ok(());
            }
        }

        // Observation setup may run user code; keep the table unborrowed.
        let observation = observe()?;
        debug!(key_path = %binding.key_path, dirty_type = ?binding.dirty_type, "key path observed");
        self.entries.borrow_mut().insert(
            binding.key_path.clone(),
            Entry {
                bindings: vec![binding],
                _observation: observation,
            },
        );
        Ok(())
    }

    /// Remove every binding on `key_path` and stop observing it.
    ///
    /// Returns the removed bindings (empty for an unmapped path).
    pub fn unbind(&self, key_path: &str) -> Vec<KeyPathBinding> {
        let removed = self.entries.borrow_mut().remove(key_path);
        match removed {
            Some(entry) => {
                debug!(key_path, count = entry.bindings.len(), "key path unmapped");
                // The observation drops here, after the borrow is released.
                entry.bindings
            }
            None => Vec::new(),
        }
    }

    /// What a change on `key_path` should do, if it is bound.
    pub fn resolve(&self, key_path: &str) -> Option<BindingEffect> {
        let entries = self.entries.borrow();
        let entry = entries.get(key_path)?;
        let effect = entry.bindings.iter().fold(
            BindingEffect {
                dirty_type: DirtyType::NONE,
                update_immediately: false,
            },
            |acc, b| BindingEffect {
                dirty_type: acc.dirty_type | b.dirty_type,
                update_immediately: acc.update_immediately || b.update_immediately,
            },
        );
        Some(effect)
    }

    pub fn bindings_for(&self, key_path: &str) -> Vec<KeyPathBinding> {
        self.entries
            .borrow()
            .get(key_path)
            .map(|entry| entry.bindings.clone())
            .unwrap_or_default()
    }

    /// Bound key paths, sorted.
    pub fn key_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewUpdateError;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_observation(started: &Rc<Cell<u32>>, stopped: &Rc<Cell<u32>>) -> Observation {
        started.set(started.get() + 1);
        let stopped = stopped.clone();
        Observation::new(move || stopped.set(stopped.get() + 1))
    }

    #[test]
    fn test_multiple_categories_share_one_observation() {
        let table = KeyPathBindingTable::new();
        let started = Rc::new(Cell::new(0));
        let stopped = Rc::new(Cell::new(0));

        table
            .bind(KeyPathBinding::new("title", DirtyType::DATA), || {
                Ok(counting_observation(&started, &stopped))
            })
            .unwrap();
        table
            .bind(KeyPathBinding::new("title", DirtyType::LAYOUT), || {
                Ok(counting_observation(&started, &stopped))
            })
            .unwrap();

        assert_eq!(started.get(), 1);
        assert_eq!(table.bindings_for("title").len(), 2);
        assert_eq!(
            table.resolve("title"),
            Some(BindingEffect {
                dirty_type: DirtyType::DATA | DirtyType::LAYOUT,
                update_immediately: false,
            })
        );
    }

    #[test]
    fn test_rebinding_same_category_updates_immediacy() {
        let table = KeyPathBindingTable::new();
        let noop = || -> Result<Observation> { Ok(Observation::new(|| {})) };

        table.bind(KeyPathBinding::new("frame", DirtyType::LAYOUT), noop).unwrap();
        table
            .bind(KeyPathBinding::new("frame", DirtyType::LAYOUT).immediate(), noop)
            .unwrap();

        assert_eq!(table.bindings_for("frame").len(), 1);
        assert!(table.resolve("frame").unwrap().update_immediately);
    }

    #[test]
    fn test_failed_observation_records_nothing() {
        let table = KeyPathBindingTable::new();

        let result = table.bind(KeyPathBinding::new("missing", DirtyType::DATA), || {
            Err(ViewUpdateError::UnknownKeyPath {
                key_path: "missing".to_string(),
            })
        });

        assert!(result.is_err());
        assert!(table.key_paths().is_empty());
        assert_eq!(table.resolve("missing"), None);
    }

    #[test]
    fn test_unbind_stops_observation() {
        let table = KeyPathBindingTable::new();
        let started = Rc::new(Cell::new(0));
        let stopped = Rc::new(Cell::new(0));

        table
            .bind(KeyPathBinding::new("color", DirtyType::STYLE), || {
                Ok(counting_observation(&started, &stopped))
            })
            .unwrap();

        let removed = table.unbind("color");
        assert_eq!(removed.len(), 1);
        assert_eq!(stopped.get(), 1);
        assert!(table.resolve("color").is_none());

        // Unmapping again is a no-op.
        assert!(table.unbind("color").is_empty());
        assert_eq!(stopped.get(), 1);
    }

    #[test]
    fn test_dropping_table_stops_everything() {
        let table = KeyPathBindingTable::new();
        let started = Rc::new(Cell::new(0));
        let stopped = Rc::new(Cell::new(0));

        for path in ["a", "b", "c"] {
            table
                .bind(KeyPathBinding::new(path, DirtyType::DATA), || {
                    Ok(counting_observation(&started, &stopped))
                })
                .unwrap();
        }
        assert_eq!(table.key_paths(), vec!["a", "b", "c"]);

        drop(table);
        assert_eq!(stopped.get(), 3);
    }
}
