//! Independent allocation instances.
//!
//! Each instance is one `MechanismState`, addressed by a random id. A single
//! `AllocationMechanism` service can act on any of them.

use crate::error::AllocationResult;
use crate::mechanism::{MechanismConfig, MechanismState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: HashMap<InstanceId, MechanismState>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config` and start a fresh instance.
    pub fn create(&mut self, config: MechanismConfig) -> AllocationResult<InstanceId> {
        let state = MechanismState::new(config)?;
        Ok(self.insert(state))
    }

    /// Adopt an existing state, e.g. one restored from a snapshot.
    pub fn insert(&mut self, state: MechanismState) -> InstanceId {
        let id = InstanceId::new();
        self.instances.insert(id, state);
        tracing::debug!(instance = %id, "instance registered");
        id
    }

    pub fn get(&self, id: &InstanceId) -> Option<&MechanismState> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &InstanceId) -> Option<&mut MechanismState> {
        self.instances.get_mut(id)
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.instances.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
