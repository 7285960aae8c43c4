//! Step Registry
//!
//! Explicit ownership table for the wizard's long-lived step instances.
//! Each step is created lazily on first lookup and registered under its
//! name together with a teardown callback. At shutdown the callbacks run
//! in reverse registration order, each exactly once.
//!
//! # Teardown contract
//!
//! - A teardown callback touches only the entry it was registered with.
//!   It never reaches into another entry, so any shutdown order is safe.
//! - A teardown callback never logs and never calls into rendering. Both
//!   subsystems may already be gone when it runs.
//! - Registering a name twice is a no-op.

use crate::error::{Result, WizardError};
use crate::step::WizardStep;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type Teardown = Box<dyn FnOnce()>;

struct Entry {
    name: String,
    instance: Option<Rc<dyn Any>>,
    teardown: Option<Teardown>,
}

/// Name-keyed singleton table with ordered teardown
#[derive(Default)]
pub struct StepRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the step registered under `name`, constructing it with
    /// `factory` on first access.
    ///
    /// Fails with `StepTypeMismatch` when `name` already holds a value of
    /// a different type (or only a bare teardown callback).
    pub fn get_or_create<S, F>(&mut self, name: &str, factory: F) -> Result<Rc<RefCell<S>>>
    where
        S: WizardStep + 'static,
        F: FnOnce() -> S,
    {
        if let Some(&i) = self.index.get(name) {
            let existing = self.entries[i]
                .instance
                .clone()
                .ok_or_else(|| WizardError::StepTypeMismatch(name.to_string()))?;
            return existing
                .downcast::<RefCell<S>>()
                .map_err(|_| WizardError::StepTypeMismatch(name.to_string()));
        }

        let step = Rc::new(RefCell::new(factory()));
        let for_teardown = Rc::clone(&step);
        let teardown: Teardown = Box::new(move || {
            // Skip rather than panic if something still holds a borrow
            if let Ok(mut step) = for_teardown.try_borrow_mut() {
                step.teardown();
            }
        });
        let instance: Rc<dyn Any> = step.clone();
        self.push(name, Some(instance), teardown);
        tracing::debug!("Registered step '{}' for teardown", name);
        Ok(step)
    }

    /// Register a bare teardown callback. Returns false (and drops `f`
    /// unrun) when `name` is already registered.
    pub fn register_destroy(&mut self, name: &str, f: impl FnOnce() + 'static) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        self.push(name, None, Box::new(f));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Run every teardown callback in reverse registration order and drop
    /// the instances. Safe to call more than once.
    pub fn destroy_all(&mut self) {
        self.index.clear();
        while let Some(mut entry) = self.entries.pop() {
            if let Some(teardown) = entry.teardown.take() {
                teardown();
            }
            drop(entry.instance.take());
        }
    }

    fn push(&mut self, name: &str, instance: Option<Rc<dyn Any>>, teardown: Teardown) {
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(Entry {
            name: name.to_string(),
            instance,
            teardown: Some(teardown),
        });
    }
}

impl Drop for StepRegistry {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
