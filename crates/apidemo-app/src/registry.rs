//! In-process registry of retained components
//!
//! Components (workers, services) are registered under a stable
//! [`SessionKey`] so a recreated observer can find the instance its
//! predecessor was using. The registry is owned by the host state and passed
//! explicitly to whoever needs it; there is no global lookup.

use std::collections::HashMap;

use apidemo_core::prelude::*;
use apidemo_core::SessionKey;

/// Maximum number of components a single registry holds
pub const MAX_COMPONENTS: usize = 16;

#[derive(Debug)]
pub struct Registry<T> {
    /// Components indexed by key
    components: HashMap<SessionKey, T>,

    /// Registration order, for stable iteration
    order: Vec<SessionKey>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a component under `key`.
    ///
    /// Fails if the key is taken or the registry is full; use
    /// [`replace`](Self::replace) to swap an existing component.
    pub fn insert(&mut self, key: SessionKey, component: T) -> Result<()> {
        if self.components.contains_key(&key) {
            return Err(Error::config(format!(
                "A component is already registered under '{}'",
                key
            )));
        }
        if self.components.len() >= MAX_COMPONENTS {
            return Err(Error::config(format!(
                "Maximum of {} registered components reached",
                MAX_COMPONENTS
            )));
        }

        debug!("Registered component '{}'", key);
        self.order.push(key.clone());
        self.components.insert(key, component);
        Ok(())
    }

    /// Register `component` under `key`, returning whatever it replaced.
    ///
    /// A new key counts against [`MAX_COMPONENTS`] like [`insert`](Self::insert).
    pub fn replace(&mut self, key: SessionKey, component: T) -> Result<Option<T>> {
        if !self.components.contains_key(&key) {
            if self.components.len() >= MAX_COMPONENTS {
                return Err(Error::config(format!(
                    "Maximum of {} registered components reached",
                    MAX_COMPONENTS
                )));
            }
            self.order.push(key.clone());
        }
        Ok(self.components.insert(key, component))
    }

    pub fn remove(&mut self, key: &SessionKey) -> Option<T> {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        let removed = self.components.remove(key);
        if removed.is_some() {
            debug!("Unregistered component '{}'", key);
        }
        removed
    }

    pub fn get(&self, key: &SessionKey) -> Option<&T> {
        self.components.get(key)
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.components.contains_key(key)
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &SessionKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Remove every component, in registration order
    pub fn drain(&mut self) -> Vec<(SessionKey, T)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|key| self.components.remove(&key).map(|c| (key, c)))
            .collect()
    }
}
