//! Property tests comparing `SliceTable` against a plain `Vec<u8>` reference
//! under randomized sequences of inserts and deletes, and checking the
//! structural invariants hold after every one.

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use slicetree::SliceTable;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, Vec<u8>),
    Delete(usize, usize),
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Op {
        let pos = usize::arbitrary(g) % 4096;
        if bool::arbitrary(g) {
            let len = usize::arbitrary(g) % 64;
            let data: Vec<u8> = (0..len).map(|_| u8::arbitrary(g)).collect();
            Op::Insert(pos, data)
        } else {
            let len = usize::arbitrary(g) % 64;
            Op::Delete(pos, len)
        }
    }
}

fn apply(table: &mut SliceTable, reference: &mut Vec<u8>, op: &Op) {
    match op {
        Op::Insert(pos, data) => {
            let pos = (*pos).min(reference.len());
            assert!(table.insert(pos, data));
            reference.splice(pos..pos, data.iter().copied());
        }
        Op::Delete(pos, len) => {
            let pos = (*pos).min(reference.len());
            let len = (*len).min(reference.len() - pos);
            assert!(table.delete(pos, len));
            reference.splice(pos..pos + len, std::iter::empty());
        }
    }
}

#[quickcheck]
fn matches_reference_vec(ops: Vec<Op>) -> bool {
    let mut table = SliceTable::new();
    let mut reference = Vec::new();
    for op in &ops {
        apply(&mut table, &mut reference, op);
        if !table.check_invariants() {
            return false;
        }
    }
    table.to_vec() == reference
}

#[quickcheck]
fn clone_is_independent(ops: Vec<Op>, extra: Vec<u8>) -> bool {
    let mut table = SliceTable::new();
    let mut reference = Vec::new();
    for op in &ops {
        apply(&mut table, &mut reference, op);
    }
    let mut clone = table.clone();
    let before_clone = table.to_vec();
    clone.insert(0, &extra);
    table.to_vec() == before_clone && clone.check_invariants() && table.check_invariants()
}

#[quickcheck]
fn dump_length_matches_size(ops: Vec<Op>) -> bool {
    let mut table = SliceTable::new();
    let mut reference = Vec::new();
    for op in &ops {
        apply(&mut table, &mut reference, op);
    }
    table.to_vec().len() == table.size()
}

#[quickcheck]
fn out_of_bounds_edits_are_rejected(len: usize) -> bool {
    let mut table = SliceTable::new();
    table.insert(0, b"fixed content");
    let size = table.size();
    !table.insert(size + 1 + (len % 1000), b"x") && !table.delete(size, 1)
}
