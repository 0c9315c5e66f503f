//! Shape digest: stable SHA-256 fingerprint of a contract's declared shape
//!
//! # Pipeline
//!
//! `ContractDescriptor → canonical text → SHA-256 → lowercase hex`
//!
//! # Guarantees
//!
//! - **Deterministic**: identities render by `Contract.field`, never by id,
//!   so the digest is the same in every process
//! - **Order-insensitive**: fields and methods are sorted before hashing
//! - **Hierarchy-sensitive**: parent digests are folded in declared order
//!
//! Method bodies are opaque and do not contribute.

use sha2::{Digest, Sha256};

use crate::contract::ContractDescriptor;
use crate::object::PropertyKey;

/// Hex SHA-256 of the canonical shape text
pub fn shape_digest(contract: &ContractDescriptor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_shape(contract).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Canonical text form used for hashing
pub fn canonical_shape(contract: &ContractDescriptor) -> String {
    let mut out = String::new();
    out.push_str(&format!("contract {}\n", contract.name()));

    let mut fields: Vec<String> = contract
        .fields()
        .iter()
        .map(|f| format!("field {} {}\n", f.name(), site(f.is_static())))
        .collect();
    fields.sort();
    fields.iter().for_each(|line| out.push_str(line));

    let mut methods: Vec<String> = contract
        .methods()
        .iter()
        .map(|m| format!("method {} {}\n", render_key(m.key()), site(m.is_static())))
        .collect();
    methods.sort();
    methods.iter().for_each(|line| out.push_str(line));

    for parent in contract.parents() {
        out.push_str(&format!("parent {}\n", shape_digest(parent)));
    }
    out
}

fn render_key(key: &PropertyKey) -> String {
    match key {
        PropertyKey::Name(name) => format!("name:{}", name),
        PropertyKey::Field(id) => format!("field:{}", id.description()),
    }
}

fn site(is_static: bool) -> &'static str {
    if is_static {
        "static"
    } else {
        "instance"
    }
}
