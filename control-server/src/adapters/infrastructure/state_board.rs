use anyhow::anyhow;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ports::StateProvider;

/// Latest published sub-state per section.
///
/// Agent modules publish here (in-process or through the state endpoint);
/// each section is read back through a [`BoardSection`] provider.
#[derive(Debug, Default)]
pub struct StateBoard {
    sections: RwLock<HashMap<String, Value>>,
}

impl StateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state of `section`
    pub fn publish(&self, section: &str, state: Value) {
        self.sections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(section.to_string(), state);
    }

    /// Mark `section` unavailable. Returns whether it had been published.
    pub fn clear(&self, section: &str) -> bool {
        self.sections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(section)
            .is_some()
    }

    pub fn get(&self, section: &str) -> Option<Value> {
        self.sections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(section)
            .cloned()
    }

    /// Provider reading `section` from this board
    pub fn section_provider(self: &Arc<Self>, section: &str) -> Arc<dyn StateProvider> {
        Arc::new(BoardSection {
            board: self.clone(),
            section: section.to_string(),
        })
    }
}

pub struct BoardSection {
    board: Arc<StateBoard>,
    section: String,
}

impl StateProvider for BoardSection {
    fn section(&self) -> &str {
        &self.section
    }

    fn current_state(&self) -> anyhow::Result<Value> {
        self.board
            .get(&self.section)
            .ok_or_else(|| anyhow!("section '{}' has not been published", self.section))
    }
}
