//! Dynamic object model that contracts are mixed into
//!
//! A `ClassType` has two member sites: `statics` (members on the class
//! itself) and `prototype` (members shared by every instance). Each site is
//! a `PropertyMap` keyed by `PropertyKey`, which is either a plain name or a
//! field identity token.
//!
//! Lookups walk the superclass chain. Ownership tests (`has_own`) never do.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::identity::FieldIdentity;
use crate::value::{Callable, Receiver, Value};
use crate::{Error, Result};

// ── Keys ──────────────────────────────────────────────────

/// A property key: either a name or a field identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    Name(String),
    Field(FieldIdentity),
}

impl PropertyKey {
    pub fn as_field(&self) -> Option<&FieldIdentity> {
        match self {
            PropertyKey::Field(id) => Some(id),
            PropertyKey::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Name(name) => Some(name),
            PropertyKey::Field(_) => None,
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(name) => write!(f, "{}", name),
            PropertyKey::Field(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::Name(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::Name(s)
    }
}

impl From<FieldIdentity> for PropertyKey {
    fn from(id: FieldIdentity) -> Self {
        PropertyKey::Field(id)
    }
}

impl From<&FieldIdentity> for PropertyKey {
    fn from(id: &FieldIdentity) -> Self {
        PropertyKey::Field(id.clone())
    }
}

// ── Properties ────────────────────────────────────────────

/// What a property holds
#[derive(Debug, Clone)]
pub enum Member {
    Data(Value),
    Method(Callable),
}

/// One own property with its attribute flags
#[derive(Debug, Clone)]
pub struct Property {
    pub member: Member,
    pub enumerable: bool,
    pub writable: bool,
    pub configurable: bool,
}

impl Property {
    /// Method declared in a class body: non-enumerable, redefinable
    pub fn method(body: Callable) -> Self {
        Self {
            member: Member::Method(body),
            enumerable: false,
            writable: true,
            configurable: true,
        }
    }

    /// Plain data property
    pub fn data(value: Value) -> Self {
        Self {
            member: Member::Data(value),
            enumerable: true,
            writable: true,
            configurable: true,
        }
    }

    /// Default method installed by a contract. Static defaults are
    /// enumerable, prototype defaults are not. Both stay redefinable.
    pub fn installed(body: Callable, is_static: bool) -> Self {
        Self {
            member: Member::Method(body),
            enumerable: is_static,
            writable: true,
            configurable: true,
        }
    }

    /// Same member, locked against reassignment and redefinition
    pub fn frozen(self) -> Self {
        Self {
            writable: false,
            configurable: false,
            ..self
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match &self.member {
            Member::Data(value) => Some(value),
            Member::Method(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&Callable> {
        match &self.member {
            Member::Method(body) => Some(body),
            Member::Data(_) => None,
        }
    }

    /// A `null` data member does not satisfy a field requirement
    pub fn is_present(&self) -> bool {
        !self.as_value().is_some_and(Value::is_null)
    }
}

/// Own properties of one member site (BTreeMap for deterministic ordering)
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: BTreeMap<PropertyKey, Property>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_own(&self, key: &PropertyKey) -> Option<&Property> {
        self.entries.get(key)
    }

    pub fn has_own(&self, key: &PropertyKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Define or redefine an own property.
    ///
    /// # Errors
    /// `NotConfigurable` if an existing property at `key` is non-configurable.
    pub fn define(&mut self, key: PropertyKey, property: Property) -> Result<()> {
        if let Some(existing) = self.entries.get(&key) {
            if !existing.configurable {
                return Err(Error::NotConfigurable {
                    key: key.to_string(),
                });
            }
        }
        self.entries.insert(key, property);
        Ok(())
    }

    /// Assign a data value, keeping the existing property's flags.
    ///
    /// # Errors
    /// `ReadOnly` if an existing property at `key` is non-writable.
    pub fn assign(&mut self, key: PropertyKey, value: Value) -> Result<()> {
        match self.entries.get_mut(&key) {
            Some(existing) if !existing.writable => Err(Error::ReadOnly {
                key: key.to_string(),
            }),
            Some(existing) => {
                existing.member = Member::Data(value);
                Ok(())
            }
            None => {
                self.entries.insert(key, Property::data(value));
                Ok(())
            }
        }
    }

    /// Enumerable keys only
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, _)| k)
    }

    /// Every own property, enumerable or not
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Property)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Classes ───────────────────────────────────────────────

/// A concrete type: the target of conformance checks and mixins
#[derive(Debug, Clone)]
pub struct ClassType {
    name: String,
    superclass: Option<Arc<ClassType>>,
    statics: PropertyMap,
    prototype: PropertyMap,
}

impl ClassType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            statics: PropertyMap::new(),
            prototype: PropertyMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Arc<ClassType>> {
        self.superclass.as_ref()
    }

    pub fn statics(&self) -> &PropertyMap {
        &self.statics
    }

    pub fn prototype(&self) -> &PropertyMap {
        &self.prototype
    }

    /// Static site or instance site
    pub fn site(&self, is_static: bool) -> &PropertyMap {
        if is_static {
            &self.statics
        } else {
            &self.prototype
        }
    }

    pub fn site_mut(&mut self, is_static: bool) -> &mut PropertyMap {
        if is_static {
            &mut self.statics
        } else {
            &mut self.prototype
        }
    }

    /// Resolve a member on the given site, walking the superclass chain
    pub fn lookup(&self, key: &PropertyKey, is_static: bool) -> Option<&Property> {
        let mut class = Some(self);
        while let Some(current) = class {
            if let Some(property) = current.site(is_static).get_own(key) {
                return Some(property);
            }
            class = current.superclass.as_deref();
        }
        None
    }

    pub fn lookup_static(&self, key: &PropertyKey) -> Option<&Property> {
        self.lookup(key, true)
    }

    pub fn lookup_instance(&self, key: &PropertyKey) -> Option<&Property> {
        self.lookup(key, false)
    }

    /// True when a non-null member is visible at `key` on the given site
    pub fn has_member(&self, key: &PropertyKey, is_static: bool) -> bool {
        self.lookup(key, is_static).is_some_and(Property::is_present)
    }

    /// Invoke a static method
    pub fn call_static(&self, key: &PropertyKey, args: &[Value]) -> Result<Value> {
        let property = self
            .lookup_static(key)
            .ok_or_else(|| Error::MissingMember {
                owner: self.name.clone(),
                key: key.to_string(),
            })?;
        let body = property.as_method().ok_or_else(|| Error::NotCallable {
            owner: self.name.clone(),
            key: key.to_string(),
        })?;
        body.call(Receiver::Class(self), args)
    }

    /// Create an instance with no own slots
    pub fn instantiate(self: &Arc<Self>) -> Instance {
        Instance {
            class: Arc::clone(self),
            slots: PropertyMap::new(),
        }
    }
}

/// Class body under construction.
///
/// Later declarations of the same key replace earlier ones, as in a class
/// body. `build` fails only if a replaced property was frozen.
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    superclass: Option<Arc<ClassType>>,
    pending: Vec<(bool, PropertyKey, Property)>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            pending: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: Arc<ClassType>) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn method(self, key: impl Into<PropertyKey>, body: Callable) -> Self {
        self.property(false, key, Property::method(body))
    }

    pub fn static_method(self, key: impl Into<PropertyKey>, body: Callable) -> Self {
        self.property(true, key, Property::method(body))
    }

    pub fn value(self, key: impl Into<PropertyKey>, value: Value) -> Self {
        self.property(false, key, Property::data(value))
    }

    pub fn static_value(self, key: impl Into<PropertyKey>, value: Value) -> Self {
        self.property(true, key, Property::data(value))
    }

    pub fn property(
        mut self,
        is_static: bool,
        key: impl Into<PropertyKey>,
        property: Property,
    ) -> Self {
        self.pending.push((is_static, key.into(), property));
        self
    }

    pub fn build(self) -> Result<ClassType> {
        let mut class = ClassType::new(self.name);
        class.superclass = self.superclass;
        for (is_static, key, property) in self.pending {
            class.site_mut(is_static).define(key, property)?;
        }
        Ok(class)
    }
}

// ── Instances ─────────────────────────────────────────────

/// An object created from a class. Own slots shadow the prototype chain.
#[derive(Debug, Clone)]
pub struct Instance {
    class: Arc<ClassType>,
    slots: PropertyMap,
}

impl Instance {
    pub fn class(&self) -> &Arc<ClassType> {
        &self.class
    }

    pub fn slots(&self) -> &PropertyMap {
        &self.slots
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Property> {
        self.slots
            .get_own(key)
            .or_else(|| self.class.lookup_instance(key))
    }

    pub fn value(&self, key: &PropertyKey) -> Option<&Value> {
        self.get(key).and_then(Property::as_value)
    }

    /// Write an own slot
    pub fn set(&mut self, key: impl Into<PropertyKey>, value: Value) -> Result<()> {
        self.slots.assign(key.into(), value)
    }

    /// Resolve a method and invoke it with this instance as receiver
    pub fn call(&self, key: &PropertyKey, args: &[Value]) -> Result<Value> {
        let property = self.get(key).ok_or_else(|| Error::MissingMember {
            owner: self.class.name().to_string(),
            key: key.to_string(),
        })?;
        let body = property.as_method().ok_or_else(|| Error::NotCallable {
            owner: self.class.name().to_string(),
            key: key.to_string(),
        })?;
        body.call(Receiver::Instance(self), args)
    }
}
