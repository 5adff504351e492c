//! Authoritative structure state management utilities.

use std::collections::BTreeMap;

use glam::Vec3;
use wizard_defence_core::{StructureId, StructureKind};

/// Snapshot of a structure stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct StructureState {
    /// Identifier allocated by the world for the structure.
    pub(crate) id: StructureId,
    /// Kind of structure that was placed.
    pub(crate) kind: StructureKind,
    /// World-space location of the structure.
    pub(crate) position: Vec3,
    /// Remaining health.
    pub(crate) health: f32,
}

/// Result of damaging a structure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DamageOutcome {
    /// The structure absorbed the hit.
    Damaged,
    /// The hit destroyed the structure and it was removed.
    Destroyed(StructureKind),
}

/// Registry that stores structures and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct StructureRegistry {
    entries: BTreeMap<StructureId, StructureState>,
    next_structure_id: StructureId,
}

impl StructureRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_structure_id: StructureId::new(0),
        }
    }

    /// Stores a new structure and returns its identifier.
    pub(crate) fn insert(&mut self, kind: StructureKind, position: Vec3, health: f32) -> StructureId {
        let id = self.next_structure_id;
        self.next_structure_id = StructureId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            StructureState {
                id,
                kind,
                position,
                health,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: StructureId) -> Option<&StructureState> {
        self.entries.get(&id)
    }

    /// Iterates structures in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &StructureState> {
        self.entries.values()
    }

    /// Subtracts health, removing the structure once it reaches zero.
    pub(crate) fn damage(&mut self, id: StructureId, amount: f32) -> Option<DamageOutcome> {
        let state = self.entries.get_mut(&id)?;
        state.health = (state.health - amount.max(0.0)).max(0.0);
        if state.health > 0.0 {
            return Some(DamageOutcome::Damaged);
        }

        let kind = state.kind;
        let _ = self.entries.remove(&id);
        Some(DamageOutcome::Destroyed(kind))
    }
}
