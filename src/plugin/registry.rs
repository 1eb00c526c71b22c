//! Explicit name → constructor lookup for playground plugins.
//!
//! Per spec §9's open question ("the Playground route... constructs one new
//! plugin per entry in `req.body.plugins` but always of the same concrete
//! class — the intent (a plugin registry lookup by name) is unclear"): this
//! reimplementation introduces the explicit registry the note recommends,
//! rather than always instantiating one hardcoded plugin type.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::PlaygroundPlugin;

type Constructor = Arc<dyn Fn() -> Box<dyn PlaygroundPlugin> + Send + Sync>;

/// Registration order is preserved in `order` so plugins execute "strictly
/// in configuration order" (spec §5) even when `config.plugins` is absent.
#[derive(Clone, Default)]
pub struct PlaygroundPluginRegistry {
    constructors: HashMap<String, Constructor>,
    order: Vec<String>,
}

impl PlaygroundPluginRegistry {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn PlaygroundPlugin> + Send + Sync + 'static,
    {
        let name = name.into();
        if !self.constructors.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.constructors.insert(name, Arc::new(ctor));
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn PlaygroundPlugin>> {
        self.constructors.get(name).map(|ctor| ctor())
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Instantiates plugins in `allowed` order when present, otherwise in
    /// registration order.
    pub fn create_all(&self, allowed: Option<&[String]>) -> Vec<Box<dyn PlaygroundPlugin>> {
        match allowed {
            Some(names) => names.iter().filter_map(|n| self.create(n)).collect(),
            None => self.order.iter().filter_map(|n| self.create(n)).collect(),
        }
    }
}
