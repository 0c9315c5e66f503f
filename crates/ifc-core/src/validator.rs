//! Declaration validator: rejects malformed contracts before construction
//!
//! Runs once per declaration, in source order, and stops at the first
//! problem. Checks, in order:
//!
//! 1. No field name is declared twice (static and instance share one namespace)
//! 2. No static method is named `prototype`
//! 3. No instance method is named `constructor`
//! 4. Every own-field default names a field this contract declares

use std::collections::BTreeSet;

use crate::contract::{FieldDecl, MethodDecl, MethodName};
use crate::error::DeclarationError;

/// Reserved on the static site
pub const RESERVED_STATIC: &str = "prototype";

/// Reserved on the instance site
pub const RESERVED_INSTANCE: &str = "constructor";

pub fn validate(
    contract: &str,
    fields: &[FieldDecl],
    methods: &[MethodDecl],
) -> Result<(), DeclarationError> {
    if let Some(field) = first_duplicate(fields.iter().map(|f| f.name.as_str())) {
        return Err(DeclarationError::DuplicateField {
            contract: contract.to_string(),
            field: field.to_string(),
        });
    }

    for is_static in [true, false] {
        let reserved = methods.iter().find_map(|m| match &m.name {
            MethodName::Text(name) if m.is_static == is_static && is_reserved(name, is_static) => {
                Some(name)
            }
            _ => None,
        });
        if let Some(name) = reserved {
            return Err(DeclarationError::ReservedName {
                contract: contract.to_string(),
                name: name.clone(),
                is_static,
            });
        }
    }

    for method in methods {
        if let MethodName::OwnField(field) = &method.name {
            if !fields.iter().any(|f| &f.name == field) {
                return Err(DeclarationError::UnknownDefaultField {
                    contract: contract.to_string(),
                    field: field.clone(),
                });
            }
        }
    }

    Ok(())
}

fn is_reserved(name: &str, is_static: bool) -> bool {
    if is_static {
        name == RESERVED_STATIC
    } else {
        name == RESERVED_INSTANCE
    }
}

fn first_duplicate<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = BTreeSet::new();
    names.find(|name| !seen.insert(*name))
}
