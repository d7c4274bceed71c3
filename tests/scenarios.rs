//! Concrete scenario tests exercising the boundary conditions of the size
//! discipline (small/large slot threshold, leaf/inner fan-out) and the
//! cursor, rather than randomized fuzzing (see `invariants.rs` for that).

use std::io::Write;

use slicetree::SliceTable;

#[test]
fn empty_table() {
    let table = SliceTable::new();
    assert_eq!(table.size(), 0);
    assert_eq!(table.to_vec(), Vec::<u8>::new());
    assert_eq!(table.depth(), 0);
    assert!(table.check_invariants());
}

#[test]
fn single_insert_at_start() {
    let mut table = SliceTable::new();
    assert!(table.insert(0, b"hello"));
    assert_eq!(table.to_vec(), b"hello");
    assert!(table.check_invariants());
}

#[test]
fn sequential_appends_stay_correct() {
    let mut table = SliceTable::new();
    let mut expected = Vec::new();
    for chunk in [&b"the "[..], b"quick ", b"brown ", b"fox"] {
        let pos = table.size();
        assert!(table.insert(pos, chunk));
        expected.extend_from_slice(chunk);
    }
    assert_eq!(table.to_vec(), expected);
    assert!(table.check_invariants());
}

#[test]
fn insert_in_the_middle_of_existing_content() {
    let mut table = SliceTable::new();
    table.insert(0, b"helloworld");
    assert!(table.insert(5, b" "));
    assert_eq!(table.to_vec(), b"hello world");
}

#[test]
fn out_of_bounds_insert_is_rejected() {
    let mut table = SliceTable::new();
    table.insert(0, b"abc");
    assert!(!table.insert(4, b"x"));
    assert_eq!(table.to_vec(), b"abc");
}

#[test]
fn out_of_bounds_delete_is_rejected() {
    let mut table = SliceTable::new();
    table.insert(0, b"abc");
    assert!(!table.delete(1, 10));
    assert_eq!(table.to_vec(), b"abc");
}

#[test]
fn delete_entire_content_returns_to_empty_state() {
    let mut table = SliceTable::new();
    table.insert(0, b"some content");
    assert!(table.delete(0, table.size()));
    assert_eq!(table.size(), 0);
    assert_eq!(table.to_vec(), Vec::<u8>::new());
    assert!(table.check_invariants());
}

#[test]
fn large_insert_forces_a_large_slot_and_survives_interior_edits() {
    let mut table = SliceTable::new();
    let big = vec![b'x'; 64 * 1024];
    assert!(table.insert(0, &big));
    assert!(table.insert(32 * 1024, b"MARK"));
    let dumped = table.to_vec();
    assert_eq!(dumped.len(), big.len() + 4);
    assert_eq!(&dumped[32 * 1024..32 * 1024 + 4], b"MARK");
    assert!(table.check_invariants());
}

#[test]
fn many_small_inserts_eventually_split_the_leaf() {
    let mut table = SliceTable::new();
    // Each insert lands at the end and is too large to coalesce with its
    // predecessor, so the leaf's slot count grows until it overflows and
    // the tree gains a level.
    for i in 0..64 {
        let chunk = vec![(b'a' + (i % 26) as u8); 5000];
        let pos = table.size();
        assert!(table.insert(pos, &chunk));
    }
    assert!(table.depth() >= 1, "expected the tree to grow past a single leaf");
    assert!(table.check_invariants());
}

#[test]
fn deleting_back_down_collapses_the_root_again() {
    let mut table = SliceTable::new();
    for i in 0..64 {
        let chunk = vec![(b'a' + (i % 26) as u8); 5000];
        let pos = table.size();
        table.insert(pos, &chunk);
    }
    assert!(table.depth() >= 1);
    let size = table.size();
    assert!(table.delete(0, size - 10));
    assert_eq!(table.size(), 10);
    assert!(table.check_invariants());
}

#[test]
fn clone_then_mutate_leaves_the_original_untouched() {
    let mut table = SliceTable::new();
    table.insert(0, b"original");
    let mut clone = table.clone();
    clone.insert(0, b"prefix ");
    assert_eq!(table.to_vec(), b"original");
    assert_eq!(clone.to_vec(), b"prefix original");
}

#[test]
fn new_from_file_small_matches_contents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"short file content").unwrap();
    file.flush().unwrap();
    let table = SliceTable::new_from_file(file.path()).expect("load should succeed");
    assert_eq!(table.to_vec(), b"short file content");
    assert!(table.check_invariants());
}

#[test]
fn new_from_file_large_matches_contents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let content = vec![b'q'; 256 * 1024];
    file.write_all(&content).unwrap();
    file.flush().unwrap();
    let table = SliceTable::new_from_file(file.path()).expect("load should succeed");
    assert_eq!(table.size(), content.len());
    assert_eq!(table.to_vec(), content);
    assert!(table.check_invariants());
}

#[test]
fn new_from_file_empty_matches_empty_table() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let table = SliceTable::new_from_file(file.path()).expect("load should succeed");
    assert_eq!(table.size(), 0);
    assert!(table.check_invariants());
}

#[test]
fn new_from_file_missing_path_returns_none() {
    assert!(SliceTable::new_from_file("/nonexistent/path/for/slicetree-tests").is_none());
}

#[test]
fn editing_a_large_file_backed_table_still_works() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let content = vec![b'z'; 128 * 1024];
    file.write_all(&content).unwrap();
    file.flush().unwrap();
    let mut table = SliceTable::new_from_file(file.path()).unwrap();
    assert!(table.insert(64 * 1024, b"INSERTED"));
    assert!(table.delete(0, 1000));
    assert_eq!(table.size(), content.len() - 1000 + 8);
    assert!(table.check_invariants());
}

#[test]
fn cursor_walks_bytes_forward_and_backward() {
    let mut table = SliceTable::new();
    table.insert(0, b"abcdef");
    let mut cursor = table.iter();
    let mut collected = Vec::new();
    loop {
        let b = cursor.byte();
        if b == slicetree::END_OF_TEXT {
            break;
        }
        collected.push(b as u8);
        if cursor.next_byte(1) == 0 {
            break;
        }
    }
    assert_eq!(collected, b"abcdef");

    cursor.prev_byte(1);
    assert_eq!(cursor.byte() as u8, b'f');
}

#[test]
fn cursor_decodes_multi_byte_utf8() {
    let mut table = SliceTable::new();
    let text = "a\u{00e9}\u{4e2d}\u{1f600}b";
    table.insert(0, text.as_bytes());
    let mut cursor = table.iter();
    let mut decoded = String::new();
    loop {
        let cp = cursor.codepoint();
        if cp == slicetree::END_OF_TEXT {
            break;
        }
        assert_ne!(cp, slicetree::INVALID_UTF8);
        decoded.push(char::from_u32(cp as u32).unwrap());
        if cursor.next_cp(1) == 0 {
            break;
        }
    }
    assert_eq!(decoded, text);
}

#[test]
fn cursor_seeks_and_counts_lines() {
    let mut table = SliceTable::new();
    table.insert(0, b"one\ntwo\nthree\n");
    let mut cursor = table.iter_at(0).unwrap();
    assert_eq!(cursor.next_line(1), 1);
    assert_eq!(cursor.position(), 4);
    assert_eq!(cursor.next_line(1), 1);
    assert_eq!(cursor.position(), 8);
}

#[test]
fn node_count_is_consistent_with_depth() {
    let mut table = SliceTable::new();
    assert_eq!(table.node_count(), 1);
    for i in 0..64 {
        let chunk = vec![(b'a' + (i % 26) as u8); 5000];
        let pos = table.size();
        table.insert(pos, &chunk);
    }
    assert!(table.node_count() > 1);
}
