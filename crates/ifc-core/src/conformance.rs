//! Conformance checker: proves a target satisfies a contract hierarchy
//!
//! # Exemptions
//!
//! A field is satisfied either by a non-null member on the target (own or
//! inherited through the superclass chain) or by a default method anywhere in
//! the hierarchy whose name is that field's identity. The exemption sets are
//! computed once from the root contract being mixed in and threaded unchanged
//! through every level of the check. They are never recomputed per parent.
//!
//! Static fields are exempted only by static defaults, and instance fields
//! only by instance defaults.

use std::collections::BTreeSet;

use crate::contract::{ContractDescriptor, Field};
use crate::error::{ConformanceError, UnimplementedField};
use crate::hierarchy;
use crate::identity::FieldIdentity;
use crate::object::{ClassType, PropertyKey};
use crate::Result;

/// Field identities already satisfied by identity-named defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exemptions {
    statics: BTreeSet<FieldIdentity>,
    instance: BTreeSet<FieldIdentity>,
}

impl Exemptions {
    /// Gather every identity-named method across the whole hierarchy
    pub fn collect(contract: &ContractDescriptor) -> Self {
        Self {
            statics: identity_named(contract, true),
            instance: identity_named(contract, false),
        }
    }

    pub fn site(&self, is_static: bool) -> &BTreeSet<FieldIdentity> {
        if is_static {
            &self.statics
        } else {
            &self.instance
        }
    }

    pub fn exempts(&self, field: &Field) -> bool {
        self.site(field.is_static()).contains(field.identity())
    }
}

fn identity_named(contract: &ContractDescriptor, is_static: bool) -> BTreeSet<FieldIdentity> {
    hierarchy::collect(contract, move |c| {
        c.methods()
            .iter()
            .filter(move |m| m.is_static() == is_static)
            .filter_map(|m| m.default_for().cloned())
    })
    .into_iter()
    .collect()
}

/// Check `target` against `contract` and all its ancestors.
///
/// Every unsatisfied field is reported once, in first-visit order, even if
/// a diamond reaches its contract along several paths.
pub fn check(
    contract: &ContractDescriptor,
    target: &ClassType,
    exemptions: &Exemptions,
) -> std::result::Result<(), ConformanceError> {
    let mut missing = Vec::new();
    check_into(contract, target, exemptions, &mut missing);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConformanceError::Unimplemented {
            target: target.name().to_string(),
            missing,
        })
    }
}

fn check_into(
    contract: &ContractDescriptor,
    target: &ClassType,
    exemptions: &Exemptions,
    missing: &mut Vec<UnimplementedField>,
) {
    for field in contract.fields() {
        if exemptions.exempts(field) {
            continue;
        }
        let key = PropertyKey::Field(field.identity().clone());
        if target.has_member(&key, field.is_static()) {
            continue;
        }
        if missing.iter().any(|m| &m.field == field.identity()) {
            continue;
        }
        missing.push(UnimplementedField {
            field: field.identity().clone(),
            is_static: field.is_static(),
        });
    }

    for parent in contract.parents() {
        check_into(parent, target, exemptions, missing);
    }
}

/// Dry run: compute exemptions and check, without installing anything
pub fn conforms(contract: &ContractDescriptor, target: &ClassType) -> Result<()> {
    let exemptions = Exemptions::collect(contract);
    check(contract, target, &exemptions)?;
    Ok(())
}
