use assert_matches::assert_matches;

use super::*;
use crate::test_utils::{numbers, root_from_path, rotate_xor};

fn build_tree(levels: usize, elements: Vec<Element>) -> FixedMerkleTree {
    FixedMerkleTree::with_default_options(levels, elements).expect("build tree")
}

// ── construction ─────────────────────────────────────────────────────

#[test]
fn test_empty_tree_root_is_top_zero() {
    let tree = build_tree(10, vec![]);
    assert!(tree.is_empty());
    assert_eq!(tree.capacity(), 1024);
    assert_eq!(tree.root(), tree.zeros()[10]);
    assert_eq!(tree.zeros().len(), 11);
}

#[test]
fn test_two_leaf_root() {
    let tree = build_tree(1, numbers([1, 2]));
    let expected = Blake3Hasher.hash(&Element::Number(1).digest(), &Element::Number(2).digest());
    assert_eq!(tree.root(), expected);
}

#[test]
fn test_missing_sibling_uses_zero() {
    let tree = build_tree(2, numbers([1, 2, 3]));
    let h = |l: &Digest, r: &Digest| Blake3Hasher.hash(l, r);
    let zeros = tree.zeros();
    let left = h(&Element::Number(1).digest(), &Element::Number(2).digest());
    let right = h(&Element::Number(3).digest(), &zeros[0]);
    assert_eq!(tree.root(), h(&left, &right));
}

#[test]
fn test_custom_zero_element_changes_empty_root() {
    let default = build_tree(4, vec![]);
    let custom = FixedMerkleTree::new(
        4,
        vec![],
        TreeOptions::default().with_zero_element("0x1234"),
    )
    .expect("build tree");
    assert_ne!(default.root(), custom.root());
    assert_eq!(custom.zeros()[0], Element::Number(0x1234).digest());
    assert_eq!(custom.zero_element(), &Element::from("0x1234"));
}

#[test]
fn test_constructor_rejects_overfull() {
    let result = FixedMerkleTree::with_default_options(2, numbers(1..=5));
    assert_matches!(result, Err(MerkleTreeError::TreeFull { capacity: 4 }));
    assert!(FixedMerkleTree::with_default_options(2, numbers(1..=4)).is_ok());
}

#[test]
fn test_constructor_rejects_bad_levels() {
    assert_matches!(
        FixedMerkleTree::with_default_options(0, vec![]),
        Err(MerkleTreeError::InvalidLevels { levels: 0, .. })
    );
    assert_matches!(
        FixedMerkleTree::with_default_options(33, vec![]),
        Err(MerkleTreeError::InvalidLevels { levels: 33, .. })
    );
}

#[test]
fn test_custom_hasher() {
    let options = TreeOptions::default().with_hasher(rotate_xor);
    let custom = FixedMerkleTree::new(3, numbers(1..=5), options).expect("build tree");
    let default = build_tree(3, numbers(1..=5));
    assert_ne!(custom.root(), default.root());
    assert_eq!(
        custom.layers()[1][0],
        rotate_xor(&Element::Number(1).digest(), &Element::Number(2).digest())
    );
}

// ── insert / bulk insert / update ────────────────────────────────────

#[test]
fn test_insert_matches_construction() {
    let mut incremental = build_tree(10, vec![]);
    for i in 1..=9u64 {
        incremental.insert(i).expect("insert");
    }
    let built = build_tree(10, numbers(1..=9));
    assert_eq!(incremental.root(), built.root());
    assert_eq!(incremental.layers(), built.layers());
    assert_eq!(incremental.elements(), built.elements());
}

#[test]
fn test_insert_until_full() {
    let mut tree = build_tree(3, vec![]);
    for i in 0..8u64 {
        tree.insert(i).expect("insert below capacity");
    }
    assert_eq!(tree.len(), tree.capacity());
    let root = tree.root();
    assert_matches!(tree.insert(8u64), Err(MerkleTreeError::TreeFull { capacity: 8 }));
    assert_eq!(tree.root(), root);
    assert_eq!(tree.len(), 8);
}

#[test]
fn test_bulk_insert_equals_sequential() {
    let mut bulk = build_tree(10, numbers(1..=3));
    let mut sequential = bulk.clone();

    bulk.bulk_insert(numbers(4..=20)).expect("bulk insert");
    for i in 4..=20u64 {
        sequential.insert(i).expect("insert");
    }

    assert_eq!(bulk.root(), sequential.root());
    assert_eq!(bulk.layers(), sequential.layers());
}

#[test]
fn test_bulk_insert_into_empty_tree() {
    let mut bulk = build_tree(5, vec![]);
    bulk.bulk_insert(numbers(0..17)).expect("bulk insert");
    assert_eq!(bulk.root(), build_tree(5, numbers(0..17)).root());
}

#[test]
fn test_bulk_insert_empty_is_noop() {
    let mut tree = build_tree(10, numbers(1..=4));
    let root = tree.root();
    tree.bulk_insert(Vec::<Element>::new()).expect("empty bulk insert");
    assert_eq!(tree.root(), root);
    assert_eq!(tree.len(), 4);
}

#[test]
fn test_bulk_insert_skips_empty_entries() {
    let mut with_blanks = build_tree(6, numbers(1..=2));
    with_blanks
        .bulk_insert(vec![
            Element::Number(3),
            Element::from(""),
            Element::Number(4),
            Element::Bytes(vec![]),
        ])
        .expect("bulk insert");
    assert_eq!(with_blanks.len(), 4);
    assert_eq!(with_blanks.root(), build_tree(6, numbers(1..=4)).root());
}

#[test]
fn test_bulk_insert_over_capacity_leaves_tree_untouched() {
    let mut tree = build_tree(3, numbers(1..=6));
    let root = tree.root();
    assert_matches!(
        tree.bulk_insert(numbers(7..=9)),
        Err(MerkleTreeError::TreeFull { capacity: 8 })
    );
    assert_eq!(tree.root(), root);
    assert_eq!(tree.len(), 6);

    tree.bulk_insert(numbers(7..=8)).expect("exactly fills");
    assert_eq!(tree.len(), 8);
}

#[test]
fn test_update_replaces_leaf() {
    let mut tree = build_tree(10, numbers(1..=8));
    tree.update(4, 42u64).expect("update");
    let mut expected = numbers(1..=8);
    expected[4] = Element::Number(42);
    assert_eq!(tree.elements(), expected);
    assert_eq!(tree.root(), build_tree(10, expected).root());
}

#[test]
fn test_update_at_len_appends() {
    let mut tree = build_tree(10, numbers(1..=8));
    tree.update(8, 9u64).expect("append through update");
    assert_eq!(tree.len(), 9);
    assert_eq!(tree.root(), build_tree(10, numbers(1..=9)).root());
}

#[test]
fn test_update_out_of_bounds() {
    let mut tree = build_tree(10, numbers(1..=8));
    let root = tree.root();
    assert_matches!(tree.update(9, 1u64), Err(MerkleTreeError::IndexOutOfBounds(9)));
    assert_matches!(
        tree.update(usize::MAX, 1u64),
        Err(MerkleTreeError::IndexOutOfBounds(usize::MAX))
    );
    assert_eq!(tree.root(), root);
    assert_eq!(
        MerkleTreeError::IndexOutOfBounds(9).to_string(),
        "index out of bounds: 9"
    );
}

#[test]
fn test_update_at_capacity_is_tree_full() {
    let mut tree = build_tree(2, numbers(1..=4));
    assert_matches!(tree.update(4, 5u64), Err(MerkleTreeError::TreeFull { capacity: 4 }));
    tree.update(3, 5u64).expect("last slot is updatable");
}

// ── lookup ───────────────────────────────────────────────────────────

#[test]
fn test_index_of() {
    let tree = build_tree(10, numbers([5, 7, 5, 9]));
    assert_eq!(tree.index_of(&Element::Number(5)), Some(0));
    assert_eq!(tree.index_of(&Element::Number(9)), Some(3));
    assert_eq!(tree.index_of(&Element::Number(6)), None);
    assert_eq!(tree.index_of(&Element::from("5")), None);
}

#[test]
fn test_index_of_by_comparator() {
    let tree = build_tree(10, vec![Element::from("0x0a"), Element::Number(11)]);
    assert_eq!(
        tree.index_of_by(&Element::Number(10), Element::same_digest),
        Some(0)
    );
    assert_eq!(
        tree.index_of_by(&Element::Number(10), |stored, target| {
            matches!((stored, target), (Element::Number(a), Element::Number(b)) if a > b)
        }),
        Some(1)
    );
}

// ── proofs ───────────────────────────────────────────────────────────

#[test]
fn test_every_path_rebuilds_root() {
    let tree = build_tree(5, numbers(100..121));
    for (index, element) in tree.elements().iter().enumerate() {
        let path = tree.path(index).expect("path");
        assert_eq!(path.path_elements.len(), 5);
        assert_eq!(path.leaf_index(), index);
        assert_eq!(path.path_root, tree.root());
        assert_eq!(root_from_path(tree.hasher(), element, &path), tree.root());
    }
}

#[test]
fn test_path_out_of_bounds() {
    let tree = build_tree(10, numbers(1..=8));
    assert_matches!(tree.path(8), Err(MerkleTreeError::IndexOutOfBounds(8)));
    assert_matches!(
        build_tree(10, vec![]).path(0),
        Err(MerkleTreeError::IndexOutOfBounds(0))
    );
}

#[test]
fn test_proof_by_element() {
    let tree = build_tree(10, numbers(1..=8));
    assert_eq!(tree.proof(&Element::Number(6)), tree.path(5));
    assert_matches!(
        tree.proof(&Element::Number(60)),
        Err(MerkleTreeError::ElementNotFound)
    );
}

// ── edges and slices ─────────────────────────────────────────────────

#[test]
fn test_tree_edge() {
    let tree = build_tree(10, numbers(1..=8));
    let edge = tree.get_tree_edge(&Element::Number(5)).expect("edge");
    assert_eq!(edge.edge_index, 4);
    assert_eq!(edge.edge_element, Element::Number(5));
    assert_eq!(edge.edge_elements_count, 8);
    assert_eq!(edge.edge_path, tree.path(4).expect("path"));
    assert!(edge.validate(10).is_ok());

    assert_matches!(
        tree.get_tree_edge(&Element::Number(50)),
        Err(MerkleTreeError::ElementNotFound)
    );
    assert_matches!(
        tree.get_tree_edge_at(8),
        Err(MerkleTreeError::IndexOutOfBounds(8))
    );
}

#[test]
fn test_tree_slices() {
    let tree = build_tree(10, numbers(1..=20));
    let slices = tree.get_tree_slices(4).expect("slices");
    // ceil(20 / 4) = 5, rounded up to 6.
    assert_eq!(slices.len(), 4);
    assert_eq!(slices[0].edge.edge_index, 0);
    assert_eq!(slices[1].edge.edge_index, 6);
    assert_eq!(slices[3].edge.edge_index, 18);
    assert_eq!(slices[3].elements, numbers(19..=20));

    let rejoined: Vec<Element> = slices.iter().flat_map(|s| s.elements.clone()).collect();
    assert_eq!(rejoined, tree.elements());

    assert_matches!(tree.get_tree_slices(0), Err(MerkleTreeError::InvalidData(_)));
    assert!(build_tree(4, vec![]).get_tree_slices(3).expect("slices").is_empty());
}

// ── serialization ────────────────────────────────────────────────────

#[test]
fn test_json_roundtrip_then_mutate() {
    let mut original = build_tree(10, numbers(1..=8));
    let json = original.to_json().expect("to json");
    assert_eq!(json, original.to_string());

    let mut restored = FixedMerkleTree::from_json(&json, Blake3Hasher).expect("from json");
    assert_eq!(restored.root(), original.root());
    assert_eq!(restored.layers(), original.layers());

    original.insert(10u64).expect("insert");
    restored.insert(10u64).expect("insert");
    assert_eq!(restored.root(), original.root());
}

#[test]
fn test_bincode_roundtrip() {
    let original = build_tree(8, vec![Element::Number(1), Element::from("abc"), Element::Bytes(vec![7; 40])]);
    let bytes = original.encode_to_vec().expect("encode");
    let restored = FixedMerkleTree::decode_from_slice(&bytes, Blake3Hasher).expect("decode");
    assert_eq!(restored.root(), original.root());
    assert_eq!(restored.elements(), original.elements());
}

#[test]
fn test_deserialize_detects_wrong_hasher() {
    let record = build_tree(4, numbers(1..=3)).serialize();
    // Function items have no `Debug`, so match without `assert_matches!`.
    let restored = FixedMerkleTree::deserialize(record, rotate_xor);
    assert!(matches!(restored, Err(MerkleTreeError::RootMismatch { .. })));
}

#[test]
fn test_deserialize_accepts_parsed_record() {
    let original = build_tree(6, numbers(1..=8));
    let record = SerializedTree::from_json(&original.to_json().expect("to json")).expect("parse");
    assert_eq!(record.levels, 6);
    assert_eq!(record.root, original.root());
    let restored = FixedMerkleTree::deserialize(record, Blake3Hasher).expect("restore");
    assert_eq!(restored.root(), original.root());
}

// ── defensive copies ─────────────────────────────────────────────────

#[test]
fn test_getters_return_copies() {
    let tree = build_tree(4, numbers(1..=5));
    let root = tree.root();

    let mut layers = tree.layers();
    let again = tree.layers();
    assert_eq!(layers, again);
    layers[0][0] = Digest::new([0xee; 32]);
    layers.push(vec![]);
    assert_ne!(layers, tree.layers());
    assert_eq!(again, tree.layers());

    let mut zeros = tree.zeros();
    zeros[0] = Digest::new([0xee; 32]);
    assert_ne!(zeros, tree.zeros());

    let mut elements = tree.elements();
    elements.clear();
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.root(), root);
}
