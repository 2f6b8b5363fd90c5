//! Definition database: id assignment, name/id lookup and the children index.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::def::{AbstractDef, Def, DefId};
use crate::error::DefError;

#[derive(Debug, Default, Clone)]
struct Children {
    concrete: Vec<DefId>,
    /// Indices into `DefDatabase::abstracts`.
    abstracts: Vec<usize>,
}

/// Long-lived store of resolved definitions.
///
/// Concrete definitions get monotonically increasing ids starting at 1;
/// abstract ones are kept only as links in the inheritance forest.
#[derive(Debug, Default)]
pub struct DefDatabase {
    /// Slot `i` holds the definition with id `i + 1`.
    defs: Vec<Def>,
    by_name: HashMap<String, DefId>,
    abstracts: Vec<AbstractDef>,
    abstract_by_name: HashMap<String, usize>,
    children: HashMap<String, Children>,
}

impl DefDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concrete definition and assign its id.
    ///
    /// A name that is already taken (concrete or abstract) is rejected and
    /// the first registration stays.
    pub fn register(&mut self, mut def: Def) -> Result<DefId, DefError> {
        if self.contains(&def.name) {
            tracing::warn!(name = %def.name, origin = %def.file_origin, "duplicate definition ignored");
            return Err(DefError::DuplicateRegistration { name: def.name });
        }

        let next = self.defs.len() + 1;
        let Ok(raw) = u16::try_from(next) else {
            return Err(DefError::IdsExhausted { name: def.name });
        };

        let id = DefId(raw);
        def.id = id;
        tracing::debug!(name = %def.name, %id, class = def.type_name(), "registered definition");
        self.by_name.insert(def.name.clone(), id);
        self.defs.push(def);
        Ok(id)
    }

    /// Register an abstract node. Same duplicate rule, no id.
    pub fn register_abstract(&mut self, def: AbstractDef) -> Result<(), DefError> {
        if self.contains(&def.name) {
            tracing::warn!(name = %def.name, origin = %def.file_origin, "duplicate abstract definition ignored");
            return Err(DefError::DuplicateRegistration { name: def.name });
        }
        self.abstract_by_name.insert(def.name.clone(), self.abstracts.len());
        self.abstracts.push(def);
        Ok(())
    }

    /// Recompute the parent -> children lists from every registered record.
    pub fn rebuild_children_index(&mut self) {
        self.children.clear();

        for def in &self.defs {
            let Some(parent) = def.parent_name.as_deref() else { continue };
            if self.contains(parent) {
                self.children.entry(parent.to_string()).or_default().concrete.push(def.id);
            } else {
                tracing::warn!(name = %def.name, parent, "parent not registered, left out of children index");
            }
        }

        for (index, node) in self.abstracts.iter().enumerate() {
            let Some(parent) = node.parent_name.as_deref() else { continue };
            if self.contains(parent) {
                self.children.entry(parent.to_string()).or_default().abstracts.push(index);
            } else {
                tracing::warn!(name = %node.name, parent, "parent not registered, left out of children index");
            }
        }

        tracing::debug!(parents = self.children.len(), "rebuilt children index");
    }

    /// Concrete descendants of the node called `name`.
    ///
    /// Non-recursive returns direct concrete children. Recursive walks
    /// breadth-first through concrete and abstract children alike but only
    /// emits concrete ones.
    pub fn children_of(&self, name: &str, recursive: bool) -> Vec<&Def> {
        if !recursive {
            return self
                .children
                .get(name)
                .map(|c| c.concrete.iter().filter_map(|&id| self.get_by_id(id)).collect())
                .unwrap_or_default();
        }

        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(name);
        queue.push_back(name);

        while let Some(node) = queue.pop_front() {
            let Some(children) = self.children.get(node) else { continue };
            for def in children.concrete.iter().filter_map(|&id| self.get_by_id(id)) {
                if visited.insert(def.name.as_str()) {
                    result.push(def);
                    queue.push_back(def.name.as_str());
                }
            }
            for node in children.abstracts.iter().map(|&i| &self.abstracts[i]) {
                if visited.insert(node.name.as_str()) {
                    queue.push_back(node.name.as_str());
                }
            }
        }

        result
    }

    pub fn get(&self, name: &str) -> Option<&Def> {
        self.by_name.get(name).and_then(|&id| self.get_by_id(id))
    }

    pub fn get_by_id(&self, id: DefId) -> Option<&Def> {
        if id.is_none() {
            return None;
        }
        self.defs.get(usize::from(id.0) - 1)
    }

    pub fn get_abstract(&self, name: &str) -> Option<&AbstractDef> {
        self.abstract_by_name.get(name).map(|&i| &self.abstracts[i])
    }

    /// True if `name` is registered as either a concrete or an abstract node.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name) || self.abstract_by_name.contains_key(name)
    }

    /// Concrete definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Def> {
        self.defs.iter()
    }

    pub fn abstracts(&self) -> impl Iterator<Item = &AbstractDef> {
        self.abstracts.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn abstract_count(&self) -> usize {
        self.abstracts.len()
    }

    /// Tear the database down. Consuming `self` rules out later queries.
    pub fn dispose(mut self) {
        let count = self.defs.len();
        self.children.clear();
        self.by_name.clear();
        self.abstract_by_name.clear();
        self.abstracts.clear();
        self.defs.clear();
        tracing::debug!(count, "disposed definition database");
    }
}
