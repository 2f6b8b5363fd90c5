//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - Override ordering: nearest layer wins, else the class default
//! - Children index: recursive results are a superset of direct results,
//!   contain exactly the concrete descendants, never abstract nodes
//! - Single-use queue: a drained loader yields an empty batch

use proptest::prelude::*;
use serde_json::{json, Value};

use tower_defs::defs::{builtin_types, SoldierDef};
use tower_defs::{DefDatabase, DefLoader, LoaderConfig};

fn load(docs: Vec<Value>) -> (DefDatabase, usize) {
    let types = builtin_types();
    let mut loader = DefLoader::new(&types, LoaderConfig::default());
    loader.add_text("generated.json", Value::Array(docs).to_string());
    let mut db = DefDatabase::new();
    loader.load_into(&mut db).expect("batch should not abort");
    let errors = loader.error_count();
    (db, errors)
}

// ============================================================
// Override ordering
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_nearest_layer_wins(
        layers in prop::collection::vec(
            (prop::option::of(-50i32..50), prop::option::of(-50i32..50)),
            1..8,
        )
    ) {
        let last = layers.len() - 1;
        let docs: Vec<Value> = layers
            .iter()
            .enumerate()
            .map(|(i, (attack, defence))| {
                let mut doc = json!({"Name": format!("L{i}"), "Abstract": i != last});
                if i == 0 {
                    doc["Class"] = json!("SoldierDef");
                } else {
                    doc["Parent"] = json!(format!("L{}", i - 1));
                }
                if let Some(v) = attack {
                    doc["Attack"] = json!(v);
                }
                if let Some(v) = defence {
                    doc["Defence"] = json!(v);
                }
                doc
            })
            .collect();

        let (db, errors) = load(docs);
        prop_assert_eq!(errors, 0);
        prop_assert_eq!(db.len(), 1);

        let defaults = SoldierDef::default();
        let expect_attack = layers.iter().rev().find_map(|(a, _)| *a).unwrap_or(defaults.attack);
        let expect_defence = layers.iter().rev().find_map(|(_, d)| *d).unwrap_or(defaults.defence);

        let leaf = db.get(&format!("L{last}")).unwrap().data::<SoldierDef>().unwrap();
        prop_assert_eq!(leaf.attack, expect_attack);
        prop_assert_eq!(leaf.defence, expect_defence);
    }
}

// ============================================================
// Children index
// ============================================================

/// `(has_parent, is_abstract, parent_pick)` per node; parents always precede children.
fn forest_nodes() -> impl Strategy<Value = Vec<(bool, bool, usize)>> {
    prop::collection::vec((any::<bool>(), any::<bool>(), any::<usize>()), 1..24)
}

fn parents(nodes: &[(bool, bool, usize)]) -> Vec<Option<usize>> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, &(has_parent, _, pick))| (i > 0 && has_parent).then(|| pick % i))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_recursive_children_cover_concrete_descendants(nodes in forest_nodes()) {
        let parents = parents(&nodes);
        let docs: Vec<Value> = nodes
            .iter()
            .enumerate()
            .map(|(i, &(_, is_abstract, _))| match parents[i] {
                Some(p) => json!({"Name": format!("N{i}"), "Parent": format!("N{p}"), "Abstract": is_abstract}),
                None => json!({"Name": format!("N{i}"), "Class": "TileDef", "Abstract": is_abstract}),
            })
            .collect();

        let (db, errors) = load(docs);
        prop_assert_eq!(errors, 0);

        for i in 0..nodes.len() {
            let name = format!("N{i}");
            let direct: Vec<&str> = db.children_of(&name, false).iter().map(|d| d.name.as_str()).collect();
            let mut recursive: Vec<&str> = db.children_of(&name, true).iter().map(|d| d.name.as_str()).collect();

            for child in &direct {
                prop_assert!(recursive.contains(child), "{} missing from recursive children of {}", child, name);
            }
            for child in &recursive {
                prop_assert!(db.get(child).is_some());
                prop_assert!(db.get_abstract(child).is_none());
            }

            // Every concrete node whose ancestor chain passes through `i`.
            let mut expected: Vec<String> = (0..nodes.len())
                .filter(|&j| !nodes[j].1)
                .filter(|&j| {
                    let mut cur = parents[j];
                    while let Some(p) = cur {
                        if p == i {
                            return true;
                        }
                        cur = parents[p];
                    }
                    false
                })
                .map(|j| format!("N{j}"))
                .collect();
            expected.sort_unstable();
            recursive.sort_unstable();
            prop_assert_eq!(recursive, expected);
        }
    }

    #[test]
    fn prop_drained_loader_yields_empty_batch(count in 1usize..10) {
        let types = builtin_types();
        let mut loader = DefLoader::new(&types, LoaderConfig::default());
        for i in 0..count {
            loader.add_text(format!("t{i}.json"), json!({"Name": format!("T{i}"), "Class": "TileDef"}).to_string());
        }
        let db = DefDatabase::new();
        prop_assert_eq!(loader.process_all(&db).unwrap().defs.len(), count);
        prop_assert!(loader.process_all(&db).unwrap().is_empty());
    }
}
