//! Runtime bindings: spawning runtime objects from definitions.
//!
//! Each concrete definition class names a runtime class. Construction
//! strategies are registered explicitly, in priority order:
//! 1. a designated provider keyed by its parameter class, found by walking
//!    the definition class and its ancestors
//! 2. a constructor keyed by runtime class
//!
//! [`RuntimeRegistry::build`] picks a strategy per definition class found
//! under a family root; [`RuntimeRegistry::create`] runs it and hands the
//! definition to the new object.

use std::collections::{HashMap, HashSet};

use crate::database::DefDatabase;
use crate::def::Def;
use crate::error::{DefError, ErrorReporter};
use crate::types::{DefFields, TypeRegistry};

/// Runtime objects receive their definition right after construction.
pub trait ApplyDef {
    fn apply_definition(&mut self, def: &Def);
}

struct Candidate<O: ?Sized> {
    /// Definition class the strategy accepts.
    param_type: &'static str,
    /// Typed strategies downcast the payload, so only that exact class works.
    exact: bool,
    /// Runtime class the strategy produces.
    returns: &'static str,
    build: Box<dyn Fn(&Def) -> Option<Box<O>>>,
}

impl<O: ?Sized> Candidate<O> {
    fn accepts(&self, def_type: &str, types: &TypeRegistry) -> Result<(), String> {
        let ok = if self.exact {
            def_type == self.param_type
        } else {
            types.is_assignable(def_type, self.param_type)
        };
        if ok {
            Ok(())
        } else {
            Err(format!("parameter '{}' does not accept '{}'", self.param_type, def_type))
        }
    }
}

/// Registered construction strategies for one runtime object family `O`.
pub struct Bindings<O: ?Sized> {
    providers: HashMap<&'static str, Candidate<O>>,
    constructors: HashMap<&'static str, Candidate<O>>,
}

impl<O: ?Sized> Default for Bindings<O> {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            constructors: HashMap::new(),
        }
    }
}

impl<O: ?Sized + 'static> Bindings<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Designated provider for definitions of class `D`, producing `returns`.
    pub fn provider<D, F>(&mut self, returns: &'static str, build: F) -> &mut Self
    where
        D: DefFields,
        F: Fn(&D) -> Box<O> + 'static,
    {
        self.providers.insert(
            D::TYPE_NAME,
            Candidate {
                param_type: D::TYPE_NAME,
                exact: true,
                returns,
                build: Box::new(move |def: &Def| def.data::<D>().map(&build)),
            },
        );
        self
    }

    /// Provider taking the whole definition, serving `param_type` and every
    /// class derived from it.
    pub fn provider_dyn<F>(&mut self, returns: &'static str, param_type: &'static str, build: F) -> &mut Self
    where
        F: Fn(&Def) -> Box<O> + 'static,
    {
        self.providers.insert(
            param_type,
            Candidate {
                param_type,
                exact: false,
                returns,
                build: Box::new(move |def: &Def| Some(build(def))),
            },
        );
        self
    }

    /// Constructor on runtime class `real_class` taking a `D` payload.
    pub fn constructor<D, F>(&mut self, real_class: &'static str, build: F) -> &mut Self
    where
        D: DefFields,
        F: Fn(&D) -> Box<O> + 'static,
    {
        self.constructors.insert(
            real_class,
            Candidate {
                param_type: D::TYPE_NAME,
                exact: true,
                returns: real_class,
                build: Box::new(move |def: &Def| def.data::<D>().map(&build)),
            },
        );
        self
    }

    /// Constructor taking the whole definition, accepting `param_type` and
    /// every class derived from it (abstract classes included).
    pub fn constructor_dyn<F>(&mut self, real_class: &'static str, param_type: &'static str, build: F) -> &mut Self
    where
        F: Fn(&Def) -> Box<O> + 'static,
    {
        self.constructors.insert(
            real_class,
            Candidate {
                param_type,
                exact: false,
                returns: real_class,
                build: Box::new(move |def: &Def| Some(build(def))),
            },
        );
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Provider(&'static str),
    Constructor(&'static str),
}

/// Per-family table of definition class -> construction strategy.
pub struct RuntimeRegistry<O: ?Sized> {
    family: String,
    bindings: Bindings<O>,
    strategies: HashMap<&'static str, Strategy>,
}

impl<O: ?Sized + ApplyDef + 'static> RuntimeRegistry<O> {
    /// Bind every definition class found under `family_root`.
    ///
    /// Strategy problems are reported per class; classes without a working
    /// strategy simply cannot be created later.
    pub fn build(
        family_root: &str,
        db: &DefDatabase,
        types: &TypeRegistry,
        bindings: Bindings<O>,
        reporter: &mut ErrorReporter,
    ) -> Self {
        let mut registry = Self {
            family: family_root.to_string(),
            bindings,
            strategies: HashMap::new(),
        };

        let mut seen: HashSet<&'static str> = HashSet::new();
        let members = db.get(family_root).into_iter().chain(db.children_of(family_root, true));
        for def in members {
            let class = def.type_name();
            if !seen.insert(class) {
                continue;
            }
            match registry.select(class, types, reporter) {
                Ok(strategy) => {
                    tracing::debug!(family = family_root, class, ?strategy, "bound runtime strategy");
                    registry.strategies.insert(class, strategy);
                }
                Err(err) => reporter.report(err),
            }
        }

        tracing::info!(
            family = family_root,
            classes = seen.len(),
            bound = registry.strategies.len(),
            "built runtime registry"
        );
        registry
    }

    fn select(&self, class: &'static str, types: &TypeRegistry, reporter: &mut ErrorReporter) -> Result<Strategy, DefError> {
        let real_class = types
            .get(class)
            .and_then(|t| t.real_class)
            .ok_or_else(|| DefError::NoRuntimeClass { class: class.to_string() })?;

        // Nearest provider registered for the class or one of its ancestors.
        let provider = types
            .lineage(class)
            .into_iter()
            .find_map(|name| self.bindings.providers.get(name));
        if let Some(provider) = provider {
            let checked = provider.accepts(class, types).and_then(|()| {
                if provider.returns == real_class {
                    Ok(())
                } else {
                    Err(format!("returns '{}' but the runtime class is '{}'", provider.returns, real_class))
                }
            });
            match checked {
                Ok(()) => return Ok(Strategy::Provider(provider.param_type)),
                Err(reason) => reporter.report(DefError::ProviderShape {
                    class: class.to_string(),
                    reason,
                }),
            }
        }

        let Some(constructor) = self.bindings.constructors.get(real_class) else {
            return Err(DefError::NoStrategy {
                class: class.to_string(),
                real_class: real_class.to_string(),
            });
        };
        constructor
            .accepts(class, types)
            .map(|()| Strategy::Constructor(real_class))
            .map_err(|reason| DefError::ConstructorShape {
                class: class.to_string(),
                real_class: real_class.to_string(),
                reason,
            })
    }

    /// Spawn a runtime object for `def`, or `None` if its class is unbound.
    pub fn create(&self, def: &Def) -> Option<Box<O>> {
        let Some(strategy) = self.strategies.get(def.type_name()) else {
            tracing::warn!(family = %self.family, name = %def.name, class = def.type_name(), "no runtime binding");
            return None;
        };
        let candidate = match *strategy {
            Strategy::Provider(key) => self.bindings.providers.get(key),
            Strategy::Constructor(key) => self.bindings.constructors.get(key),
        }?;

        let Some(mut object) = (candidate.build)(def) else {
            tracing::warn!(name = %def.name, class = def.type_name(), "runtime strategy rejected definition payload");
            return None;
        };
        object.apply_definition(def);
        Some(object)
    }

    pub fn is_bound(&self, class: &str) -> bool {
        self.strategies.contains_key(class)
    }

    pub fn family(&self) -> &str {
        &self.family
    }
}
