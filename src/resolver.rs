//! Inheritance resolution.
//!
//! Walks each stub's parent names outward to its root, collecting the
//! lineage and checking along the way:
//! - every hop's parent exists in the batch
//! - no name is visited twice (cyclic parenting)
//! - a declared class is assignable to every class declared further up

use std::collections::HashSet;

use crate::error::DefError;
use crate::stub::{Stub, StubSet};
use crate::types::TypeRegistry;

/// Resolved parent chain of one stub, leaf first.
#[derive(Debug, Clone)]
pub struct Lineage<'s> {
    nodes: Vec<&'s Stub>,
}

impl<'s> Lineage<'s> {
    pub fn leaf(&self) -> &'s Stub {
        self.nodes[0]
    }

    pub fn root(&self) -> &'s Stub {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf first, root last.
    pub fn leaf_to_root(&self) -> impl Iterator<Item = &'s Stub> + '_ {
        self.nodes.iter().copied()
    }

    /// Overlay order: root first, leaf last.
    pub fn root_to_leaf(&self) -> impl Iterator<Item = &'s Stub> + '_ {
        self.nodes.iter().rev().copied()
    }

    /// The nearest explicitly declared class, with the stub declaring it.
    pub fn declared_type(&self) -> Option<(&'s str, &'s Stub)> {
        self.leaf_to_root()
            .find_map(|stub| stub.declared_type.as_deref().map(|class| (class, stub)))
    }

    /// The nearest layer that sets `AllowAdditionalData` decides.
    pub fn allow_additional_data(&self) -> bool {
        self.leaf_to_root()
            .find_map(|stub| stub.allow_additional_data)
            .unwrap_or(false)
    }
}

/// Resolve the lineage of `stub` against the other stubs of its batch.
///
/// An unknown class name comes back as [`DefError::UnknownType`], which the
/// caller treats as batch-fatal; every other error only rejects this stub.
pub fn resolve<'s>(
    stub: &'s Stub,
    stubs: &'s StubSet,
    types: &TypeRegistry,
) -> Result<Lineage<'s>, DefError> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut nodes: Vec<&'s Stub> = Vec::new();
    // Most specific class seen so far.
    let mut narrowest: Option<&str> = None;
    let mut current = stub;

    loop {
        if !visited.insert(current.name.as_str()) {
            let mut chain: Vec<&str> = nodes.iter().map(|s| s.name.as_str()).collect();
            chain.push(current.name.as_str());
            return Err(DefError::CyclicParent {
                origin: stub.origin.clone(),
                name: stub.name.clone(),
                chain: chain.join(" -> "),
            });
        }

        if let Some(class) = current.declared_type.as_deref() {
            if !types.contains(class) {
                return Err(DefError::UnknownType {
                    origin: current.origin.clone(),
                    name: current.name.clone(),
                    class: class.to_string(),
                });
            }
            match narrowest {
                Some(narrow) if !types.is_assignable(narrow, class) => {
                    return Err(DefError::IncompatibleType {
                        origin: stub.origin.clone(),
                        name: stub.name.clone(),
                        class: narrow.to_string(),
                        ancestor: current.name.clone(),
                        ancestor_class: class.to_string(),
                    });
                }
                Some(_) => {}
                None => narrowest = Some(class),
            }
        }

        nodes.push(current);

        let Some(parent) = current.parent_name.as_deref() else {
            break;
        };
        current = stubs.get(parent).ok_or_else(|| DefError::MissingParent {
            origin: stub.origin.clone(),
            name: stub.name.clone(),
            parent: parent.to_string(),
        })?;
    }

    tracing::trace!(
        name = %stub.name,
        depth = nodes.len(),
        class = ?narrowest,
        "resolved lineage"
    );
    Ok(Lineage { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::error::ErrorReporter;
    use crate::source::DefSource;
    use crate::types::BASE_TYPE;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct UnitDef {}

    impl crate::types::DefFields for UnitDef {
        const TYPE_NAME: &'static str = "UnitDef";
        const PARENT_TYPE: &'static str = "ActorDef";
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct FloorDef {}

    impl crate::types::DefFields for FloorDef {
        const TYPE_NAME: &'static str = "FloorDef";
    }

    fn types() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register_abstract("ActorDef", BASE_TYPE);
        types.register::<UnitDef>().register::<FloorDef>();
        types
    }

    fn stubs(json: &str) -> StubSet {
        let mut reporter = ErrorReporter::new();
        let set = crate::stub::parse_batch(
            vec![DefSource::new("test.json", json)],
            &LoaderConfig::default(),
            |_| false,
            &mut reporter,
        );
        assert_eq!(reporter.count(), 0, "fixture should parse cleanly");
        set
    }

    #[test]
    fn test_lineage_order() {
        let set = stubs(
            r#"[{"Name": "Base", "Abstract": true},
                {"Name": "Mid", "Parent": "Base", "Class": "ActorDef", "Abstract": true},
                {"Name": "Leaf", "Parent": "Mid", "Class": "UnitDef"}]"#,
        );
        let lineage = resolve(set.get("Leaf").unwrap(), &set, &types()).unwrap();
        let names: Vec<_> = lineage.root_to_leaf().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Base", "Mid", "Leaf"]);
        assert_eq!(lineage.leaf().name, "Leaf");
        assert_eq!(lineage.root().name, "Base");
        assert_eq!(lineage.declared_type().unwrap().0, "UnitDef");
    }

    #[test]
    fn test_declared_type_inherited() {
        let set = stubs(
            r#"[{"Name": "Base", "Class": "UnitDef", "Abstract": true},
                {"Name": "Leaf", "Parent": "Base"}]"#,
        );
        let lineage = resolve(set.get("Leaf").unwrap(), &set, &types()).unwrap();
        let (class, declared_by) = lineage.declared_type().unwrap();
        assert_eq!(class, "UnitDef");
        assert_eq!(declared_by.name, "Base");
    }

    #[test]
    fn test_missing_parent() {
        let set = stubs(r#"[{"Name": "Leaf", "Parent": "Ghost", "Class": "UnitDef"}]"#);
        let err = resolve(set.get("Leaf").unwrap(), &set, &types()).unwrap_err();
        assert!(matches!(err, DefError::MissingParent { ref parent, .. } if parent == "Ghost"));
    }

    #[test]
    fn test_two_node_cycle() {
        let set = stubs(
            r#"[{"Name": "X", "Parent": "Y"},
                {"Name": "Y", "Parent": "X"}]"#,
        );
        let types = types();
        for name in ["X", "Y"] {
            let err = resolve(set.get(name).unwrap(), &set, &types).unwrap_err();
            assert!(matches!(err, DefError::CyclicParent { .. }), "{name}: {err}");
        }
    }

    #[test]
    fn test_cycle_entered_from_outside() {
        let set = stubs(
            r#"[{"Name": "A", "Parent": "B"},
                {"Name": "B", "Parent": "C"},
                {"Name": "C", "Parent": "A"},
                {"Name": "Tail", "Parent": "A", "Class": "UnitDef"}]"#,
        );
        let err = resolve(set.get("Tail").unwrap(), &set, &types()).unwrap_err();
        match err {
            DefError::CyclicParent { name, chain, .. } => {
                assert_eq!(name, "Tail");
                assert_eq!(chain, "Tail -> A -> B -> C -> A");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_narrowing_allowed() {
        let set = stubs(
            r#"[{"Name": "Actor", "Class": "ActorDef", "Abstract": true},
                {"Name": "Unit", "Parent": "Actor", "Class": "UnitDef"}]"#,
        );
        assert!(resolve(set.get("Unit").unwrap(), &set, &types()).is_ok());
    }

    #[test]
    fn test_widening_rejected() {
        let set = stubs(
            r#"[{"Name": "Floor", "Class": "FloorDef", "Abstract": true},
                {"Name": "Unit", "Parent": "Floor", "Class": "UnitDef"}]"#,
        );
        let err = resolve(set.get("Unit").unwrap(), &set, &types()).unwrap_err();
        match err {
            DefError::IncompatibleType {
                class,
                ancestor,
                ancestor_class,
                ..
            } => {
                assert_eq!(class, "UnitDef");
                assert_eq!(ancestor, "Floor");
                assert_eq!(ancestor_class, "FloorDef");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_unknown_class_is_batch_fatal() {
        let set = stubs(r#"[{"Name": "Leaf", "Class": "MissingDef"}]"#);
        let err = resolve(set.get("Leaf").unwrap(), &set, &types()).unwrap_err();
        assert!(err.is_batch_fatal());
    }

    #[test]
    fn test_allow_additional_data_nearest_wins() {
        let set = stubs(
            r#"[{"Name": "Base", "Abstract": true, "AllowAdditionalData": true},
                {"Name": "Mid", "Parent": "Base", "Abstract": true},
                {"Name": "Strict", "Parent": "Mid", "Class": "UnitDef", "AllowAdditionalData": false},
                {"Name": "Loose", "Parent": "Mid", "Class": "UnitDef"}]"#,
        );
        let types = types();
        let strict = resolve(set.get("Strict").unwrap(), &set, &types).unwrap();
        let loose = resolve(set.get("Loose").unwrap(), &set, &types).unwrap();
        assert!(!strict.allow_additional_data());
        assert!(loose.allow_additional_data());
    }
}
