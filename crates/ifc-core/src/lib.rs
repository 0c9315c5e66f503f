//! IFC Core - structural interface composition runtime
//!
//! Contracts ("interfaces") declare required fields and default methods,
//! compose through multiple parents, and are mixed into concrete class types
//! after a hierarchy-wide conformance check.
//!
//! # Architecture
//!
//! ```text
//! Declarations → Validator → ContractDescriptor (fields get minted identities)
//!                                  ↓
//!              Hierarchy (preorder) → Exemptions → Conformance check
//!                                  ↓
//!                            Mixin installer (first writer wins)
//! ```
//!
//! # Guarantees
//!
//! - **Collision-proof**: same-named fields in different contracts never share storage
//! - **Global exemptions**: a default anywhere in a hierarchy satisfies a field anywhere in it
//! - **All or nothing**: a failed check installs nothing
//! - **Non-destructive**: a member the target already owns is never overwritten
//!
//! # Example
//!
//! ```
//! use ifc_core::{mixin, ClassBuilder, ContractBuilder, Callable, Value};
//!
//! let comparable = ContractBuilder::new("Comparable")
//!     .field("compareKey")
//!     .method("describe", Callable::constant(Value::from("comparable")))
//!     .build()?;
//! let key = comparable.field_identity("compareKey")?;
//!
//! let mut point = ClassBuilder::new("Point")
//!     .value(&key, Value::Integer(1))
//!     .build()?;
//! mixin(&comparable, &mut point)?;
//! # Ok::<(), ifc_core::Error>(())
//! ```

pub mod conformance;
pub mod contract;
pub mod digest;
pub mod error;
pub mod hierarchy;
pub mod identity;
pub mod manifest;
pub mod mixin;
pub mod object;
pub mod validator;
pub mod value;

pub use conformance::{check, conforms, Exemptions};
pub use contract::{
    Contract, ContractBuilder, ContractDescriptor, Field, FieldDecl, Method, MethodDecl,
    MethodName,
};
pub use digest::shape_digest;
pub use error::{
    ConformanceError, DeclarationError, Error, ManifestError, Result, UnimplementedField,
};
pub use identity::FieldIdentity;
pub use manifest::{Evaluation, Manifest};
pub use mixin::{
    implements, implements_with_report, mixin, mixin_with_report, InstalledMember, MixinReport,
};
pub use object::{ClassBuilder, ClassType, Instance, Member, Property, PropertyKey, PropertyMap};
pub use value::{Callable, Receiver, Value};

/// Validate and build a contract from a front end's ordered declarations
pub fn declare_contract(
    name: impl Into<String>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    parents: Vec<Contract>,
) -> Result<Contract> {
    ContractDescriptor::declare(name, fields, methods, parents)
}

/// Storage key for a contract's field on instances or on the class
pub fn field_identity(contract: &ContractDescriptor, name: &str) -> Result<FieldIdentity> {
    contract.field_identity(name)
}
