//! Binds a resolved lineage to a concrete definition class.

use crate::error::DefError;
use crate::resolver::Lineage;
use crate::types::{DefType, TypeRegistry, BASE_TYPE};

/// Find the nearest declared class in `lineage` and check it can be built.
pub fn bind<'t>(lineage: &Lineage<'_>, types: &'t TypeRegistry) -> Result<&'t DefType, DefError> {
    let leaf = lineage.leaf();
    let Some((class, declared_by)) = lineage.declared_type() else {
        return Err(DefError::NoType {
            origin: leaf.origin.clone(),
            name: leaf.name.clone(),
        });
    };

    let def_type = types.get(class).ok_or_else(|| DefError::UnknownType {
        origin: declared_by.origin.clone(),
        name: declared_by.name.clone(),
        class: class.to_string(),
    })?;

    if !def_type.is_instantiable() {
        let origin = leaf.origin.clone();
        let name = leaf.name.clone();
        let class = class.to_string();
        return Err(if def_type.name == BASE_TYPE {
            DefError::BaseType { origin, name, class }
        } else {
            DefError::AbstractType { origin, name, class }
        });
    }

    Ok(def_type)
}
