//! Error types for the IFC runtime
//!
//! All fallible operations return `Result<T, Error>`.
//! Declaration and conformance failures carry enough context to be surfaced
//! as definition-time diagnostics by whatever front end drives the runtime.

use thiserror::Error;

use crate::identity::FieldIdentity;

/// IFC runtime error types
#[derive(Debug, Error)]
pub enum Error {
    /// A contract declaration was malformed
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// A target type does not satisfy a contract
    #[error(transparent)]
    Conformance(#[from] ConformanceError),

    /// Field lookup by name on a contract that does not declare it
    #[error("contract \"{contract}\" has no field named \"{field}\"")]
    UnknownField { contract: String, field: String },

    /// Attempt to replace a non-configurable property
    #[error("property {key} is not configurable")]
    NotConfigurable { key: String },

    /// Attempt to assign over a non-writable property
    #[error("property {key} is read-only")]
    ReadOnly { key: String },

    /// Member lookup found nothing on the receiver or its chain
    #[error("{owner} has no member {key}")]
    MissingMember { owner: String, key: String },

    /// Member exists but holds data, not a method
    #[error("member {key} of {owner} is not callable")]
    NotCallable { owner: String, key: String },

    /// Declaration manifest could not be read or resolved
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Errors raised while validating a contract declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// The same field name appears twice in one contract
    #[error("interface \"{contract}\" declares field named \"{field}\" more than once")]
    DuplicateField { contract: String, field: String },

    /// Static `prototype` or instance `constructor`
    #[error("interface \"{contract}\": illegal {} method named \"{name}\"", reserved_site(.is_static))]
    ReservedName {
        contract: String,
        name: String,
        is_static: bool,
    },

    /// A method names one of the contract's own fields, but no such field exists
    #[error("interface \"{contract}\": default method names undeclared field \"{field}\"")]
    UnknownDefaultField { contract: String, field: String },
}

/// A single required field left unsatisfied on a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnimplementedField {
    pub field: FieldIdentity,
    pub is_static: bool,
}

impl std::fmt::Display for UnimplementedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.field, site_label(self.is_static))
    }
}

/// Errors raised when a target fails to satisfy a contract hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConformanceError {
    /// One or more required fields have no satisfying member and no default
    #[error("{}", unimplemented_message(.target, .missing))]
    Unimplemented {
        target: String,
        missing: Vec<UnimplementedField>,
    },
}

impl ConformanceError {
    /// Name of the target type that failed the check
    pub fn target(&self) -> &str {
        match self {
            ConformanceError::Unimplemented { target, .. } => target,
        }
    }

    /// Every unsatisfied field, in first-visit order
    pub fn missing(&self) -> &[UnimplementedField] {
        match self {
            ConformanceError::Unimplemented { missing, .. } => missing,
        }
    }
}

/// Errors raised while loading or resolving a declaration manifest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// The manifest is not valid JSON for the expected shape
    #[error("manifest parse error: {0}")]
    Parse(String),

    /// An `extends` or `implements` clause names an undeclared interface
    #[error("unknown interface \"{name}\"")]
    UnknownInterface { name: String },

    /// A class `extends` clause names an undeclared class
    #[error("unknown class \"{name}\"")]
    UnknownClass { name: String },

    /// Two interfaces or two classes share a name
    #[error("\"{name}\" is declared more than once")]
    Redeclared { name: String },

    /// A field reference is not of the form `Interface.field`
    #[error("malformed field reference \"{reference}\" (expected Interface.field)")]
    BadFieldRef { reference: String },

    /// A member gives both or neither of `name` and `field`
    #[error("member of \"{owner}\" must give exactly one of \"name\" or \"field\"")]
    AmbiguousMember { owner: String },

    /// A class member gives both `value` and `returns`
    #[error("member of \"{owner}\" must give at most one of \"value\" or \"returns\"")]
    ConflictingMember { owner: String },
}

impl From<serde_json::Error> for ManifestError {
    fn from(e: serde_json::Error) -> Self {
        ManifestError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Manifest(e.into())
    }
}

fn site_label(is_static: bool) -> &'static str {
    if is_static {
        "static"
    } else {
        "prototype"
    }
}

fn reserved_site(is_static: &bool) -> &'static str {
    site_label(*is_static)
}

fn unimplemented_message(target: &str, missing: &[UnimplementedField]) -> String {
    match missing {
        [] => format!("{} is missing required fields", target),
        [only] => format!("{} not implemented by {}", only.field, target),
        [first, rest @ ..] => format!(
            "{} not implemented by {} (and {} more)",
            first.field,
            target,
            rest.len()
        ),
    }
}

/// Result type alias for IFC operations
pub type Result<T> = std::result::Result<T, Error>;
