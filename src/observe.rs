//! Property Observation - The change-notification primitive behind key paths.
//!
//! A delegate view exposes observable state through a [`PropertyTable`]:
//! each key path names either a [`Property`] (synchronous, notifies on every
//! changing `set()`) or any reactive read built from spark-signals (an
//! effect re-runs it and reports each re-run after the first).
//!
//! ```ignore
//! let title = Property::new(String::new());
//! let width = signal(80u16);
//!
//! let table = PropertyTable::new();
//! table.register_property("title", &title);
//! table.register_reactive("width", move || { width.get(); });
//!
//! let observation = table.observe("title", Rc::new(|| println!("changed")))?;
//! title.set("Hello".to_string()); // prints "changed"
//! drop(observation);              // stops observing
//! ```
//!
//! Observing is explicit: nothing is tracked until `observe()` is called,
//! and dropping the returned [`Observation`] stops it.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use spark_signals::effect;

use crate::error::{Result, ViewUpdateError};

/// Change callback handed to an observation.
pub type ChangeHandler = Rc<dyn Fn()>;

// =============================================================================
// Observation handle
// =============================================================================

/// Live observation. Dropping it stops the observation.
pub struct Observation {
    stop: Option<Box<dyn FnOnce()>>,
}

impl Observation {
    pub fn new(stop: impl FnOnce() + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Stop observing now.
    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl fmt::Debug for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("active", &self.stop.is_some())
            .finish()
    }
}

// =============================================================================
// Property - synchronous observable value
// =============================================================================

struct PropertyInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(u64, ChangeHandler)>>,
    next_id: Cell<u64>,
}

/// Shared observable value.
///
/// Clones share the same value and subscribers. `set()` notifies only when
/// the new value differs from the current one.
pub struct Property<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Read without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store `value`, notifying subscribers if it changed.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.notify();
        true
    }

    /// Mutate in place and notify unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Call `on_change` after every change until the observation drops.
    pub fn subscribe(&self, on_change: ChangeHandler) -> Observation {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push((id, on_change));

        let inner = Rc::downgrade(&self.inner);
        Observation::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
            }
        })
    }

    fn notify(&self) {
        // Snapshot so handlers can subscribe, unsubscribe or set again.
        let handlers: Vec<ChangeHandler> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }
}

// =============================================================================
// Property Table - key path → observable source
// =============================================================================

type Subscribe = Rc<dyn Fn(ChangeHandler) -> Observation>;

/// Named observable sources of one delegate view.
#[derive(Default)]
pub struct PropertyTable {
    sources: RefCell<HashMap<String, Subscribe>>,
}

impl fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTable")
            .field("key_paths", &self.key_paths())
            .finish()
    }
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `property` under `key_path`.
    pub fn register_property<T: Clone + PartialEq + 'static>(
        &self,
        key_path: impl Into<String>,
        property: &Property<T>,
    ) {
        let property = property.clone();
        self.insert(
            key_path.into(),
            Rc::new(move |on_change: ChangeHandler| property.subscribe(on_change)),
        );
    }

    /// Expose a reactive read under `key_path`.
    ///
    /// `read` should `get()` the signals (or deriveds) that make up the
    /// value. Each observation runs it inside its own effect; every re-run
    /// after the first is reported as a change.
    pub fn register_reactive(&self, key_path: impl Into<String>, read: impl Fn() + 'static) {
        let read = Rc::new(read);
        self.insert(
            key_path.into(),
            Rc::new(move |on_change: ChangeHandler| {
                let read = read.clone();
                let primed = Cell::new(false);
                let stop = effect(move || {
                    read();
                    if primed.replace(true) {
                        on_change();
                    }
                });
                Observation::new(stop)
            }),
        );
    }

    /// Registered key paths, sorted.
    pub fn key_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.sources.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Start observing `key_path`.
    ///
    /// Fails with [`ViewUpdateError::UnknownKeyPath`] if nothing is
    /// registered under it.
    pub fn observe(&self, key_path: &str, on_change: ChangeHandler) -> Result<Observation> {
        let subscribe = self
            .sources
            .borrow()
            .get(key_path)
            .cloned()
            .ok_or_else(|| ViewUpdateError::UnknownKeyPath {
                key_path: key_path.to_string(),
            })?;
        Ok(subscribe(on_change))
    }

    fn insert(&self, key_path: String, subscribe: Subscribe) {
        self.sources.borrow_mut().insert(key_path, subscribe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_signals::{flush_sync, signal};

    fn counter() -> (Rc<Cell<u32>>, ChangeHandler) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        (count, Rc::new(move || count_clone.set(count_clone.get() + 1)))
    }

    #[test]
    fn test_property_notifies_on_change_only() {
        let property = Property::new(1);
        let (count, handler) = counter();
        let _observation = property.subscribe(handler);

        assert!(property.set(2));
        assert!(!property.set(2));
        assert_eq!(count.get(), 1);
        assert_eq!(property.get(), 2);
    }

    #[test]
    fn test_property_update_always_notifies() {
        let property = Property::new(vec![1, 2]);
        let (count, handler) = counter();
        let _observation = property.subscribe(handler);

        property.update(|v| v.push(3));
        assert_eq!(count.get(), 1);
        assert_eq!(property.with(|v| v.len()), 3);
    }

    #[test]
    fn test_dropping_observation_unsubscribes() {
        let property = Property::new("a".to_string());
        let (count, handler) = counter();
        let observation = property.subscribe(handler);
        assert_eq!(property.subscriber_count(), 1);

        drop(observation);
        assert_eq!(property.subscriber_count(), 0);

        property.set("b".to_string());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_table_unknown_key_path() {
        let table = PropertyTable::new();
        let (_, handler) = counter();

        let err = table.observe("nope", handler).unwrap_err();
        assert_eq!(
            err,
            ViewUpdateError::UnknownKeyPath {
                key_path: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_table_observes_registered_property() {
        let table = PropertyTable::new();
        let alpha = Property::new(1.0f32);
        table.register_property("alpha", &alpha);
        assert_eq!(table.key_paths(), vec!["alpha"]);

        let (count, handler) = counter();
        let observation = table.observe("alpha", handler).unwrap();

        alpha.set(0.5);
        assert_eq!(count.get(), 1);

        observation.stop();
        alpha.set(0.25);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_table_reactive_skips_initial_run() {
        let table = PropertyTable::new();
        let width = signal(80u16);
        let width_read = width.clone();
        table.register_reactive("width", move || {
            width_read.get();
        });

        let (count, handler) = counter();
        let _observation = table.observe("width", handler).unwrap();
        flush_sync();
        assert_eq!(count.get(), 0, "registration is not a change");

        width.set(120);
        flush_sync();
        assert_eq!(count.get(), 1);
    }
}
