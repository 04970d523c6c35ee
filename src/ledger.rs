use crate::types::{RoomName, SlotKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One newly occupied room-cell together with its occupant label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub kind: SlotKind,
    pub room: RoomName,
    pub day: u8,
    pub slot: usize,
    pub occupant: String,
}

type RoomTable = BTreeMap<RoomName, BTreeMap<u8, BTreeSet<usize>>>;

/// The canonical occupied-set: which (room, day, slot) cells are already
/// taken, per slot kind.
///
/// This is the only state threaded between hierarchical solves; the solvers
/// receive it by immutable view and the driver merges their allocations back
/// in between calls. BTree containers keep iteration deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageLedger {
    theory: RoomTable,
    lab: RoomTable,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: SlotKind) -> &RoomTable {
        match kind {
            SlotKind::Theory => &self.theory,
            SlotKind::Lab => &self.lab,
        }
    }

    fn table_mut(&mut self, kind: SlotKind) -> &mut RoomTable {
        match kind {
            SlotKind::Theory => &mut self.theory,
            SlotKind::Lab => &mut self.lab,
        }
    }

    pub fn occupied(&self, kind: SlotKind, room: &RoomName, day: u8, slot: usize) -> bool {
        self.table(kind)
            .get(room)
            .and_then(|days| days.get(&day))
            .map(|slots| slots.contains(&slot))
            .unwrap_or(false)
    }

    /// Mark one cell occupied; returns false if it already was
    pub fn insert(&mut self, kind: SlotKind, room: &RoomName, day: u8, slot: usize) -> bool {
        self.table_mut(kind)
            .entry(room.clone())
            .or_default()
            .entry(day)
            .or_default()
            .insert(slot)
    }

    /// Additive merge; duplicate inserts are no-ops
    pub fn merge(&mut self, allocations: &[Allocation]) {
        for alloc in allocations {
            self.insert(alloc.kind, &alloc.room, alloc.day, alloc.slot);
        }
    }

    /// Total occupied cells of one kind
    pub fn used_count(&self, kind: SlotKind) -> usize {
        self.table(kind)
            .values()
            .flat_map(|days| days.values())
            .map(|slots| slots.len())
            .sum()
    }

    /// Free cells left in one room, given the week's dimensions
    pub fn free_count(&self, kind: SlotKind, room: &RoomName, days: usize, slots: usize) -> usize {
        let used = self
            .table(kind)
            .get(room)
            .map(|d| d.values().map(|s| s.len()).sum())
            .unwrap_or(0);
        (days * slots).saturating_sub(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> RoomName {
        RoomName(name.to_string())
    }

    fn alloc(kind: SlotKind, r: &str, day: u8, slot: usize) -> Allocation {
        Allocation {
            kind,
            room: room(r),
            day,
            slot,
            occupant: "S1A1-CS101".to_string(),
        }
    }

    #[test]
    fn test_occupied_after_merge() {
        let mut ledger = UsageLedger::new();
        ledger.merge(&[alloc(SlotKind::Theory, "R1", 0, 2)]);

        assert!(ledger.occupied(SlotKind::Theory, &room("R1"), 0, 2));
        assert!(!ledger.occupied(SlotKind::Theory, &room("R1"), 0, 3));
        assert!(!ledger.occupied(SlotKind::Lab, &room("R1"), 0, 2));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut ledger = UsageLedger::new();
        let allocs = vec![
            alloc(SlotKind::Lab, "L1", 1, 0),
            alloc(SlotKind::Lab, "L1", 1, 0),
        ];
        ledger.merge(&allocs);
        ledger.merge(&allocs);
        assert_eq!(ledger.used_count(SlotKind::Lab), 1);
    }

    #[test]
    fn test_free_count() {
        let mut ledger = UsageLedger::new();
        ledger.merge(&[
            alloc(SlotKind::Theory, "R1", 0, 0),
            alloc(SlotKind::Theory, "R1", 3, 5),
        ]);
        assert_eq!(ledger.free_count(SlotKind::Theory, &room("R1"), 6, 7), 40);
        assert_eq!(ledger.free_count(SlotKind::Theory, &room("R2"), 6, 7), 42);
    }
}
