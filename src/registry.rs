/*!
 * In-memory script registry.
 *
 * Generated scripts are kept in a process-wide map keyed by a fresh UUID, so
 * callers can hand out an identifier and retrieve the script later without
 * touching the filesystem.
 */

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::script::Script;

/// Thread-safe registry of generated scripts
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    scripts: RwLock<HashMap<Uuid, Arc<Script>>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a script and return its freshly minted identifier
    pub fn register(&self, script: Script) -> Uuid {
        let id = Uuid::new_v4();
        self.scripts.write().insert(id, Arc::new(script));
        id
    }

    /// Look up a script by identifier
    pub fn get(&self, id: &Uuid) -> Option<Arc<Script>> {
        self.scripts.read().get(id).cloned()
    }

    /// Remove a script, returning it if it was present
    pub fn remove(&self, id: &Uuid) -> Option<Arc<Script>> {
        self.scripts.write().remove(id)
    }

    /// Identifiers of every registered script
    pub fn ids(&self) -> Vec<Uuid> {
        self.scripts.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.read().is_empty()
    }
}
