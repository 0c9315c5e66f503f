//! Contract descriptors: immutable runtime records of declared interfaces
//!
//! A front end hands the runtime three ordered lists per interface: field
//! declarations, method declarations and parent contracts. `declare`
//! validates them, mints one `FieldIdentity` per field, resolves method
//! names and freezes the result behind an `Arc`.
//!
//! # Guarantees
//!
//! - **Immutable**: descriptors are never mutated after construction
//! - **Acyclic**: parents must exist before a child is declared
//! - **Collision-proof**: every field carries a freshly minted identity

use std::sync::Arc;

use tracing::debug;

use crate::error::DeclarationError;
use crate::hierarchy;
use crate::identity::FieldIdentity;
use crate::object::PropertyKey;
use crate::validator;
use crate::value::Callable;
use crate::{Error, Result};

/// Shared handle to a declared contract
pub type Contract = Arc<ContractDescriptor>;

// ── Declarations (front-end input) ────────────────────────

/// A field as written in an interface body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub is_static: bool,
}

impl FieldDecl {
    pub fn instance(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: false,
        }
    }

    pub fn static_field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: true,
        }
    }
}

/// How a method declaration is named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodName {
    /// Plain text name
    Text(String),
    /// Identity of a field from an already-declared contract
    Field(FieldIdentity),
    /// One of this contract's own fields, resolved once its identity is minted
    OwnField(String),
}

/// A method as written in an interface body
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: MethodName,
    pub is_static: bool,
    pub body: Callable,
}

impl MethodDecl {
    pub fn instance(name: impl Into<String>, body: Callable) -> Self {
        Self {
            name: MethodName::Text(name.into()),
            is_static: false,
            body,
        }
    }

    pub fn static_method(name: impl Into<String>, body: Callable) -> Self {
        Self {
            name: MethodName::Text(name.into()),
            is_static: true,
            body,
        }
    }

    /// Default implementation for a field declared by another contract
    pub fn default_for(field: FieldIdentity, is_static: bool, body: Callable) -> Self {
        Self {
            name: MethodName::Field(field),
            is_static,
            body,
        }
    }

    /// Default implementation for one of the declaring contract's own fields
    pub fn own_default(field: impl Into<String>, is_static: bool, body: Callable) -> Self {
        Self {
            name: MethodName::OwnField(field.into()),
            is_static,
            body,
        }
    }
}

// ── Descriptor ────────────────────────────────────────────

/// A declared field with its minted identity
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    is_static: bool,
    identity: FieldIdentity,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn identity(&self) -> &FieldIdentity {
        &self.identity
    }
}

/// A declared method, keyed by text or by a field identity
#[derive(Debug, Clone)]
pub struct Method {
    key: PropertyKey,
    is_static: bool,
    body: Callable,
}

impl Method {
    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn body(&self) -> &Callable {
        &self.body
    }

    /// The field this method serves as default for, if identity-named
    pub fn default_for(&self) -> Option<&FieldIdentity> {
        self.key.as_field()
    }
}

/// Immutable record of one declared contract
#[derive(Debug)]
pub struct ContractDescriptor {
    name: String,
    fields: Vec<Field>,
    methods: Vec<Method>,
    parents: Vec<Contract>,
}

impl ContractDescriptor {
    /// Validate a declaration and build its descriptor.
    ///
    /// # Errors
    /// `DeclarationError` for duplicate fields, reserved method names, or an
    /// own-field default that names no declared field.
    pub fn declare(
        name: impl Into<String>,
        fields: Vec<FieldDecl>,
        methods: Vec<MethodDecl>,
        parents: Vec<Contract>,
    ) -> Result<Contract> {
        let name = name.into();
        validator::validate(&name, &fields, &methods)?;

        let fields: Vec<Field> = fields
            .into_iter()
            .map(|decl| Field {
                identity: FieldIdentity::mint(&name, &decl.name),
                name: decl.name,
                is_static: decl.is_static,
            })
            .collect();

        let methods = methods
            .into_iter()
            .map(|decl| {
                let key = match decl.name {
                    MethodName::Text(text) => PropertyKey::Name(text),
                    MethodName::Field(identity) => PropertyKey::Field(identity),
                    MethodName::OwnField(field) => {
                        let own = fields.iter().find(|f| f.name == field).ok_or_else(|| {
                            DeclarationError::UnknownDefaultField {
                                contract: name.clone(),
                                field,
                            }
                        })?;
                        PropertyKey::Field(own.identity.clone())
                    }
                };
                Ok(Method {
                    key,
                    is_static: decl.is_static,
                    body: decl.body,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            contract = %name,
            fields = fields.len(),
            methods = methods.len(),
            parents = parents.len(),
            "declared contract"
        );

        Ok(Arc::new(ContractDescriptor {
            name,
            fields,
            methods,
            parents,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own fields, in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Own methods, in declaration order
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn parents(&self) -> &[Contract] {
        &self.parents
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Collision-proof storage key for one of this contract's own fields.
    ///
    /// # Errors
    /// `UnknownField` if this contract does not itself declare `name`.
    pub fn field_identity(&self, name: &str) -> Result<FieldIdentity> {
        self.field(name)
            .map(|f| f.identity.clone())
            .ok_or_else(|| Error::UnknownField {
                contract: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Depth-first, self-before-parents projection over the hierarchy
    pub fn collect<'a, T, I, F>(&'a self, project: F) -> Vec<T>
    where
        F: Fn(&'a ContractDescriptor) -> I,
        I: IntoIterator<Item = T>,
    {
        hierarchy::collect(self, project)
    }
}

/// Fluent front-end helper over `ContractDescriptor::declare`
#[derive(Debug)]
pub struct ContractBuilder {
    name: String,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    parents: Vec<Contract>,
    /// Indices into `methods` whose site follows their own field
    own_defaults: Vec<usize>,
}

impl ContractBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            parents: Vec::new(),
            own_defaults: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: &Contract) -> Self {
        self.parents.push(Arc::clone(parent));
        self
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDecl::instance(name));
        self
    }

    pub fn static_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDecl::static_field(name));
        self
    }

    pub fn method(mut self, name: impl Into<String>, body: Callable) -> Self {
        self.methods.push(MethodDecl::instance(name, body));
        self
    }

    pub fn static_method(mut self, name: impl Into<String>, body: Callable) -> Self {
        self.methods.push(MethodDecl::static_method(name, body));
        self
    }

    /// Instance default for a field declared elsewhere
    pub fn default_for(mut self, field: FieldIdentity, body: Callable) -> Self {
        self.methods.push(MethodDecl::default_for(field, false, body));
        self
    }

    /// Static default for a field declared elsewhere
    pub fn static_default_for(mut self, field: FieldIdentity, body: Callable) -> Self {
        self.methods.push(MethodDecl::default_for(field, true, body));
        self
    }

    /// Default for one of this contract's own fields, on the field's site.
    ///
    /// The site is settled in `build`, so the field may be added later.
    pub fn own_default(mut self, field: impl Into<String>, body: Callable) -> Self {
        self.own_defaults.push(self.methods.len());
        self.methods.push(MethodDecl::own_default(field, false, body));
        self
    }

    pub fn build(mut self) -> Result<Contract> {
        for &index in &self.own_defaults {
            let Some(method) = self.methods.get_mut(index) else {
                continue;
            };
            if let MethodName::OwnField(field) = &method.name {
                method.is_static = self
                    .fields
                    .iter()
                    .find(|f| &f.name == field)
                    .is_some_and(|f| f.is_static);
            }
        }
        ContractDescriptor::declare(self.name, self.fields, self.methods, self.parents)
    }
}
