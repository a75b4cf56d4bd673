use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("nothing selected for scope {scope}")]
    NoSelection { scope: String },
    #[error("generation {generation} of {scope} was superseded by {current}")]
    Stale {
        scope: String,
        generation: u64,
        current: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub scope: String,
    pub key: String,
    pub generation: u64,
}

/// Per-scope generation counters. A load is only accepted under the newest
/// generation of its scope, so a slow fetch for an old selection can never
/// overwrite state belonging to a newer one.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    scopes: HashMap<String, Selection>,
}

impl SelectionTracker {
    pub fn begin(&mut self, scope: &str, key: &str) -> Selection {
        let generation = self.scopes.get(scope).map_or(1, |s| s.generation + 1);
        let sel = Selection {
            scope: scope.to_string(),
            key: key.to_string(),
            generation,
        };
        self.scopes.insert(scope.to_string(), sel.clone());
        sel
    }

    pub fn current(&self, scope: &str) -> Option<&Selection> {
        self.scopes.get(scope)
    }

    pub fn check(&self, scope: &str, generation: u64) -> Result<&Selection, SelectionError> {
        let current = self
            .scopes
            .get(scope)
            .ok_or_else(|| SelectionError::NoSelection {
                scope: scope.to_string(),
            })?;
        if current.generation != generation {
            return Err(SelectionError::Stale {
                scope: scope.to_string(),
                generation,
                current: current.generation,
            });
        }
        Ok(current)
    }
}
