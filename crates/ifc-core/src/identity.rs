//! Field identity tokens
//!
//! Every field declaration mints one process-unique token. Two contracts that
//! both declare a field called `key` get two different tokens, so storage
//! keyed by identity never collides across independently authored contracts.
//!
//! Tokens can only be minted inside this crate, at contract construction.
//! Outside code obtains them through `ContractDescriptor::field_identity`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{self, AtomicU64};
use std::sync::Arc;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Opaque, unforgeable key for one declared field.
///
/// Equality, ordering and hashing use the minted id only. The description
/// (`Contract.field`) is carried for diagnostics and stable rendering.
#[derive(Clone)]
pub struct FieldIdentity {
    id: u64,
    description: Arc<str>,
}

impl FieldIdentity {
    pub(crate) fn mint(contract: &str, field: &str) -> Self {
        let id = NEXT_IDENTITY.fetch_add(1, atomic::Ordering::Relaxed);
        Self {
            id,
            description: Arc::from(format!("{}.{}", contract, field)),
        }
    }

    /// Process-unique numeric id. Not stable across runs.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `Contract.field` label given at declaration time
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for FieldIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FieldIdentity {}

impl PartialOrd for FieldIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for FieldIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for FieldIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldIdentity({}, {:?})", self.id, self.description)
    }
}

impl fmt::Display for FieldIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}
