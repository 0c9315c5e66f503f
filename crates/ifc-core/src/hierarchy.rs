//! Hierarchy traversal shared by the conformance checker and the installer
//!
//! Order is a depth-first preorder: a contract's own projection first, then
//! each parent's full collection, left to right. Nothing is deduplicated. A
//! contract reachable along two diamond paths is projected twice.
//!
//! Earlier entries take precedence wherever a caller applies
//! first-writer-wins, so the order here is part of the override semantics.

use crate::contract::ContractDescriptor;

/// Apply `project` to `contract` and every ancestor, in preorder
pub fn collect<'a, T, I, F>(contract: &'a ContractDescriptor, project: F) -> Vec<T>
where
    F: Fn(&'a ContractDescriptor) -> I,
    I: IntoIterator<Item = T>,
{
    let mut out = Vec::new();
    collect_into(contract, &project, &mut out);
    out
}

fn collect_into<'a, T, I, F>(contract: &'a ContractDescriptor, project: &F, out: &mut Vec<T>)
where
    F: Fn(&'a ContractDescriptor) -> I,
    I: IntoIterator<Item = T>,
{
    out.extend(project(contract));
    for parent in contract.parents() {
        collect_into(parent, project, out);
    }
}

/// Names of every contract in the hierarchy, in visit order
pub fn visit_order(contract: &ContractDescriptor) -> Vec<&str> {
    collect(contract, |c| Some(c.name()))
}
