//! Store Property Tests
//!
//! Randomized operation sequences checked against the store invariants:
//! - Every index holds the same records after every operation
//! - A single-index store behaves like an ordered map
//! - Ranges match a filtered, sorted model

use std::cmp::Ordering;
use std::collections::BTreeMap;

use multistore::{IndexedRecord, MemStore};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Col {
    A,
    B,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Row {
    a: u8,
    b: u8,
    payload: u16,
}

impl IndexedRecord for Row {
    type Index = Col;

    fn compare(&self, index: Col, other: &Self) -> Ordering {
        match index {
            Col::A => self.a.cmp(&other.a),
            Col::B => self.b.cmp(&other.b),
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(u8, u8, u16),
    AddOrGet(u8, u8, u16),
    DeleteA(u8),
    DeleteB(u8),
    Touch(u8, u16),
    MoveB(u8, u8),
}

fn op() -> impl Strategy<Value = Op> {
    // Small key space so collisions are common
    let key = 0u8..16;
    prop_oneof![
        (key.clone(), key.clone(), any::<u16>()).prop_map(|(a, b, p)| Op::Add(a, b, p)),
        (key.clone(), key.clone(), any::<u16>()).prop_map(|(a, b, p)| Op::AddOrGet(a, b, p)),
        key.clone().prop_map(Op::DeleteA),
        key.clone().prop_map(Op::DeleteB),
        (key.clone(), any::<u16>()).prop_map(|(a, p)| Op::Touch(a, p)),
        (key.clone(), key).prop_map(|(a, b)| Op::MoveB(a, b)),
    ]
}

fn a(a: u8) -> Row {
    Row { a, ..Default::default() }
}

fn b(b: u8) -> Row {
    Row { b, ..Default::default() }
}

fn apply(store: &MemStore<Row>, op: &Op) {
    match *op {
        Op::Add(a, b, payload) => {
            store.add(Row { a, b, payload });
        }
        Op::AddOrGet(a, b, payload) => {
            store.add_or_get(Row { a, b, payload });
        }
        Op::DeleteA(key) => {
            store.delete(&a(key), Col::A);
        }
        Op::DeleteB(key) => {
            store.delete(&b(key), Col::B);
        }
        Op::Touch(key, payload) => {
            store.update_data(&a(key), Col::A, |mut row| {
                row.payload = payload;
                Some(row)
            });
        }
        Op::MoveB(key, to) => {
            store.update_with_indexes(&a(key), Col::A, |mut row| {
                row.b = to;
                Some(row)
            });
        }
    }
}

proptest! {
    #[test]
    fn prop_indexes_keep_same_membership(ops in prop::collection::vec(op(), 0..64)) {
        let store = MemStore::new([Col::A, Col::B]).unwrap();

        for op in &ops {
            apply(&store, op);
            prop_assert!(store.is_consistent());
            prop_assert_eq!(store.count(Col::A), Some(store.len()));
            prop_assert_eq!(store.count(Col::B), Some(store.len()));
        }

        // Every record is reachable through both indexes with the same value
        for row in store.range(&a(0), &a(u8::MAX), Col::A) {
            prop_assert_eq!(store.get(&b(row.b), Col::B), Some(row.clone()));
        }
    }

    #[test]
    fn prop_single_index_matches_ordered_map(
        entries in prop::collection::vec((0u8..32, any::<u16>()), 0..48),
        deletes in prop::collection::vec(0u8..32, 0..16),
        from in 0u8..32,
        to in 0u8..32,
    ) {
        let store = MemStore::new([Col::A]).unwrap();
        let mut model = BTreeMap::new();

        for (key, payload) in &entries {
            store.add(Row { a: *key, b: 0, payload: *payload });
            model.insert(*key, *payload);
        }
        for key in &deletes {
            let removed = store.delete(&a(*key), Col::A).map(|row| row.payload);
            prop_assert_eq!(removed, model.remove(key));
        }

        prop_assert_eq!(store.len(), model.len());
        prop_assert_eq!(store.min(Col::A).map(|r| r.a), model.keys().next().copied());
        prop_assert_eq!(store.max(Col::A).map(|r| r.a), model.keys().next_back().copied());

        let got: Vec<u8> = store.range(&a(from), &a(to), Col::A).iter().map(|r| r.a).collect();
        let expected: Vec<u8> = if from < to {
            model.range(from..to).map(|(k, _)| *k).collect()
        } else {
            Vec::new()
        };
        prop_assert_eq!(got, expected);
    }
}
