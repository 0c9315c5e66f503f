//! Declaration manifest: JSON form of what an interface front end produces
//!
//! A manifest lists interfaces and classes in definition order. Evaluating
//! it replays the definitions against the runtime: every interface becomes a
//! contract, every class is built and then mixed with its `implements` list.
//!
//! Interface methods and class members carry constant bodies (`returns`).
//! Class members may instead carry plain data (`value`).
//!
//! # Failure model
//!
//! - Parse errors and unresolved references abort evaluation
//! - Declaration errors abort evaluation
//! - Conformance errors are recorded per class and evaluation continues

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contract::{Contract, ContractDescriptor, FieldDecl, MethodDecl, MethodName};
use crate::error::ManifestError;
use crate::identity::FieldIdentity;
use crate::mixin::{self, MixinReport};
use crate::object::{ClassBuilder, ClassType, PropertyKey};
use crate::value::{Callable, Value};
use crate::{Error, Result};

// ── Document shape ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub interfaces: Vec<InterfaceEntry>,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceEntry {
    pub name: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldEntry {
    pub name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

/// An interface method named by text or field reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Interface.field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Constant the method body returns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<serde_json::Value>,
}

/// A class member: a method (`returns`) or a data member (`value`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Interface.field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Constant the method body returns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<serde_json::Value>,
    /// Data member value (classes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassEntry {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
}

// ── Evaluation result ─────────────────────────────────────

/// A class after its `implements` list was applied (or failed)
#[derive(Debug)]
pub struct ClassOutcome {
    pub class: Arc<ClassType>,
    pub result: std::result::Result<Vec<MixinReport>, Error>,
}

impl ClassOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every contract and class a manifest defined, in definition order
#[derive(Debug, Default)]
pub struct Evaluation {
    pub contracts: Vec<Contract>,
    pub classes: Vec<ClassOutcome>,
}

impl Evaluation {
    pub fn contract(&self, name: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.name() == name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassOutcome> {
        self.classes.iter().find(|c| c.class.name() == name)
    }

    /// True when every class satisfied every contract it implements
    pub fn is_success(&self) -> bool {
        self.classes.iter().all(ClassOutcome::is_ok)
    }
}

// ── Public API ────────────────────────────────────────────

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Replay every definition against the runtime
    pub fn evaluate(&self) -> Result<Evaluation> {
        let mut evaluation = Evaluation::default();
        let mut contracts: BTreeMap<&str, Contract> = BTreeMap::new();

        for entry in &self.interfaces {
            if contracts.contains_key(entry.name.as_str()) {
                return Err(ManifestError::Redeclared {
                    name: entry.name.clone(),
                }
                .into());
            }
            let contract = declare_interface(entry, &contracts)?;
            contracts.insert(entry.name.as_str(), Arc::clone(&contract));
            evaluation.contracts.push(contract);
        }

        let mut classes: BTreeMap<&str, Arc<ClassType>> = BTreeMap::new();
        for entry in &self.classes {
            if classes.contains_key(entry.name.as_str()) {
                return Err(ManifestError::Redeclared {
                    name: entry.name.clone(),
                }
                .into());
            }
            let mut class = build_class(entry, &contracts, &classes)?;
            let implemented = entry
                .implements
                .iter()
                .map(|name| lookup_contract(&contracts, name))
                .collect::<Result<Vec<_>>>()?;
            let result = mixin::implements_with_report(&mut class, &implemented);
            debug!(class = %entry.name, ok = result.is_ok(), "evaluated class");

            let class = Arc::new(class);
            classes.insert(entry.name.as_str(), Arc::clone(&class));
            evaluation.classes.push(ClassOutcome { class, result });
        }

        Ok(evaluation)
    }
}

fn declare_interface(
    entry: &InterfaceEntry,
    contracts: &BTreeMap<&str, Contract>,
) -> Result<Contract> {
    let parents = entry
        .extends
        .iter()
        .map(|name| lookup_contract(contracts, name))
        .collect::<Result<Vec<_>>>()?;

    let fields = entry
        .fields
        .iter()
        .map(|f| FieldDecl {
            name: f.name.clone(),
            is_static: f.is_static,
        })
        .collect();

    let methods = entry
        .methods
        .iter()
        .map(|m| {
            let name = match member_target(&entry.name, m.name.as_deref(), m.field.as_deref())? {
                MemberTarget::Text(text) => MethodName::Text(text),
                MemberTarget::Field { interface, field } if interface == entry.name => {
                    if !entry.fields.iter().any(|f| f.name == field) {
                        return Err(Error::UnknownField {
                            contract: interface,
                            field,
                        });
                    }
                    MethodName::OwnField(field)
                }
                MemberTarget::Field { interface, field } => {
                    MethodName::Field(resolve_field(contracts, &interface, &field)?)
                }
            };
            Ok(MethodDecl {
                name,
                is_static: m.is_static,
                body: constant_body(m.returns.as_ref()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ContractDescriptor::declare(entry.name.clone(), fields, methods, parents)
}

fn build_class(
    entry: &ClassEntry,
    contracts: &BTreeMap<&str, Contract>,
    classes: &BTreeMap<&str, Arc<ClassType>>,
) -> Result<ClassType> {
    let mut builder = ClassBuilder::new(entry.name.clone());
    if let Some(parent) = &entry.extends {
        let superclass = classes
            .get(parent.as_str())
            .ok_or_else(|| ManifestError::UnknownClass {
                name: parent.clone(),
            })?;
        builder = builder.extends(Arc::clone(superclass));
    }

    for member in &entry.members {
        if member.value.is_some() && member.returns.is_some() {
            return Err(ManifestError::ConflictingMember {
                owner: entry.name.clone(),
            }
            .into());
        }
        let key = match member_target(&entry.name, member.name.as_deref(), member.field.as_deref())? {
            MemberTarget::Text(text) => PropertyKey::Name(text),
            MemberTarget::Field { interface, field } => {
                PropertyKey::Field(resolve_field(contracts, &interface, &field)?)
            }
        };
        builder = match &member.value {
            Some(value) if member.is_static => builder.static_value(key, Value::from_json(value)),
            Some(value) => builder.value(key, Value::from_json(value)),
            None if member.is_static => {
                builder.static_method(key, constant_body(member.returns.as_ref()))
            }
            None => builder.method(key, constant_body(member.returns.as_ref())),
        };
    }

    builder.build()
}

enum MemberTarget {
    Text(String),
    Field { interface: String, field: String },
}

fn member_target(
    owner: &str,
    name: Option<&str>,
    field: Option<&str>,
) -> Result<MemberTarget> {
    match (name, field) {
        (Some(name), None) => Ok(MemberTarget::Text(name.to_string())),
        (None, Some(reference)) => {
            let (interface, field) =
                reference
                    .split_once('.')
                    .ok_or_else(|| ManifestError::BadFieldRef {
                        reference: reference.to_string(),
                    })?;
            if interface.is_empty() || field.is_empty() {
                return Err(ManifestError::BadFieldRef {
                    reference: reference.to_string(),
                }
                .into());
            }
            Ok(MemberTarget::Field {
                interface: interface.to_string(),
                field: field.to_string(),
            })
        }
        _ => Err(ManifestError::AmbiguousMember {
            owner: owner.to_string(),
        }
        .into()),
    }
}

fn lookup_contract(contracts: &BTreeMap<&str, Contract>, name: &str) -> Result<Contract> {
    contracts
        .get(name)
        .cloned()
        .ok_or_else(|| {
            ManifestError::UnknownInterface {
                name: name.to_string(),
            }
            .into()
        })
}

fn resolve_field(
    contracts: &BTreeMap<&str, Contract>,
    interface: &str,
    field: &str,
) -> Result<FieldIdentity> {
    lookup_contract(contracts, interface)?.field_identity(field)
}

fn constant_body(returns: Option<&serde_json::Value>) -> Callable {
    Callable::constant(returns.map(Value::from_json).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeclarationError;
    use crate::object::Property;

    fn evaluate(json: &str) -> Result<Evaluation> {
        Manifest::from_json(json)?.evaluate()
    }

    #[test]
    fn test_empty_manifest() {
        let evaluation = evaluate("{}").unwrap();
        assert!(evaluation.contracts.is_empty());
        assert!(evaluation.is_success());
    }

    #[test]
    fn test_comparable_point_scenario() {
        let missing = r#"{
            "interfaces": [
                { "name": "Comparable",
                  "fields": [ { "name": "compareKey" } ] }
            ],
            "classes": [ { "name": "Point", "implements": ["Comparable"] } ]
        }"#;
        let evaluation = evaluate(missing).unwrap();
        let point = evaluation.class("Point").unwrap();
        match &point.result {
            Err(Error::Conformance(e)) => {
                assert_eq!(e.missing()[0].field.description(), "Comparable.compareKey");
            }
            other => panic!("expected conformance failure, got {:?}", other),
        }
        assert!(point.class.prototype().is_empty(), "no partial install");

        let satisfied = r#"{
            "interfaces": [
                { "name": "Comparable",
                  "fields": [ { "name": "compareKey" } ],
                  "methods": [ { "name": "describe", "returns": "comparable" } ] }
            ],
            "classes": [
                { "name": "Point", "implements": ["Comparable"],
                  "members": [
                    { "field": "Comparable.compareKey", "value": 1 },
                    { "name": "lessThan", "returns": true } ] }
            ]
        }"#;
        let evaluation = evaluate(satisfied).unwrap();
        assert!(evaluation.is_success());
        let point = &evaluation.class("Point").unwrap().class;
        assert!(point.prototype().has_own(&PropertyKey::from("lessThan")));
        assert!(point.prototype().has_own(&PropertyKey::from("describe")));
    }

    #[test]
    fn test_field_ref_default_in_child() {
        let json = r#"{
            "interfaces": [
                { "name": "Keyed", "fields": [ { "name": "key" } ] },
                { "name": "AutoKeyed", "extends": ["Keyed"],
                  "methods": [ { "field": "Keyed.key", "returns": 0 } ] }
            ],
            "classes": [ { "name": "Row", "implements": ["AutoKeyed"] } ]
        }"#;
        let evaluation = evaluate(json).unwrap();
        assert!(evaluation.is_success());
        let key = evaluation
            .contract("Keyed")
            .unwrap()
            .field_identity("key")
            .unwrap();
        let row = &evaluation.class("Row").unwrap().class;
        assert!(row.prototype().get_own(&PropertyKey::Field(key)).and_then(Property::as_method).is_some());
    }

    #[test]
    fn test_own_field_default() {
        let json = r#"{
            "interfaces": [
                { "name": "Counter",
                  "fields": [ { "name": "start", "static": true } ],
                  "methods": [ { "field": "Counter.start", "static": true, "returns": 0 } ] }
            ],
            "classes": [ { "name": "Clicks", "implements": ["Counter"] } ]
        }"#;
        let evaluation = evaluate(json).unwrap();
        assert!(evaluation.is_success());
        assert_eq!(evaluation.class("Clicks").unwrap().class.statics().len(), 1);
    }

    #[test]
    fn test_superclass_member_satisfies() {
        let json = r#"{
            "interfaces": [ { "name": "Sized", "fields": [ { "name": "size" } ] } ],
            "classes": [
                { "name": "Base", "members": [ { "field": "Sized.size", "value": 3 } ] },
                { "name": "Derived", "extends": "Base", "implements": ["Sized"] }
            ]
        }"#;
        let evaluation = evaluate(json).unwrap();
        assert!(evaluation.is_success());
    }

    #[test]
    fn test_conformance_failure_does_not_stop_evaluation() {
        let json = r#"{
            "interfaces": [ { "name": "Sized", "fields": [ { "name": "size" } ] } ],
            "classes": [
                { "name": "Bad", "implements": ["Sized"] },
                { "name": "Good", "implements": ["Sized"],
                  "members": [ { "field": "Sized.size", "value": 1 } ] }
            ]
        }"#;
        let evaluation = evaluate(json).unwrap();
        assert!(!evaluation.is_success());
        assert!(!evaluation.class("Bad").unwrap().is_ok());
        assert!(evaluation.class("Good").unwrap().is_ok());
    }

    #[test]
    fn test_declaration_error_aborts() {
        let json = r#"{
            "interfaces": [
                { "name": "Dup", "fields": [ { "name": "a" }, { "name": "a" } ] }
            ]
        }"#;
        let err = evaluate(json).unwrap_err();
        assert!(matches!(
            err,
            Error::Declaration(DeclarationError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_unknown_references() {
        let unknown_parent = r#"{ "interfaces": [ { "name": "A", "extends": ["Missing"] } ] }"#;
        assert!(matches!(
            evaluate(unknown_parent).unwrap_err(),
            Error::Manifest(ManifestError::UnknownInterface { .. })
        ));

        let forward_parent = r#"{ "interfaces": [
            { "name": "A", "extends": ["B"] }, { "name": "B" } ] }"#;
        assert!(evaluate(forward_parent).is_err(), "parents must be declared first");

        let unknown_class = r#"{ "classes": [ { "name": "C", "extends": "Nope" } ] }"#;
        assert!(matches!(
            evaluate(unknown_class).unwrap_err(),
            Error::Manifest(ManifestError::UnknownClass { .. })
        ));

        let unknown_field = r#"{
            "interfaces": [ { "name": "A", "fields": [ { "name": "x" } ] } ],
            "classes": [ { "name": "C", "members": [ { "field": "A.y", "value": 1 } ] } ]
        }"#;
        assert!(matches!(
            evaluate(unknown_field).unwrap_err(),
            Error::UnknownField { .. }
        ));
    }

    #[test]
    fn test_malformed_members() {
        let bad_ref = r#"{ "classes": [ { "name": "C", "members": [ { "field": "nodot" } ] } ] }"#;
        assert!(matches!(
            evaluate(bad_ref).unwrap_err(),
            Error::Manifest(ManifestError::BadFieldRef { .. })
        ));

        let both = r#"{ "classes": [ { "name": "C",
            "members": [ { "name": "x", "field": "A.x" } ] } ] }"#;
        assert!(matches!(
            evaluate(both).unwrap_err(),
            Error::Manifest(ManifestError::AmbiguousMember { .. })
        ));
    }

    #[test]
    fn test_interface_method_rejects_value() {
        let json = r#"{
            "interfaces": [ { "name": "A", "methods": [ { "name": "m", "value": 5 } ] } ],
            "classes": [ { "name": "C", "implements": ["A"] } ]
        }"#;
        assert!(matches!(
            evaluate(json).unwrap_err(),
            Error::Manifest(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_class_member_rejects_value_and_returns() {
        let json = r#"{ "classes": [ { "name": "C",
            "members": [ { "name": "m", "value": 1, "returns": 2 } ] } ] }"#;
        assert!(matches!(
            evaluate(json).unwrap_err(),
            Error::Manifest(ManifestError::ConflictingMember { ref owner }) if owner == "C"
        ));
    }

    #[test]
    fn test_unresolved_own_field_is_unknown_field() {
        let own = r#"{ "interfaces": [ { "name": "A",
            "methods": [ { "field": "A.missing", "returns": 0 } ] } ] }"#;
        let other = r#"{ "interfaces": [
            { "name": "B" },
            { "name": "A", "methods": [ { "field": "B.missing", "returns": 0 } ] } ] }"#;
        for json in [own, other] {
            assert!(matches!(
                evaluate(json).unwrap_err(),
                Error::UnknownField { ref field, .. } if field == "missing"
            ));
        }
    }

    #[test]
    fn test_redeclared_names() {
        let json = r#"{ "interfaces": [ { "name": "A" }, { "name": "A" } ] }"#;
        assert!(matches!(
            evaluate(json).unwrap_err(),
            Error::Manifest(ManifestError::Redeclared { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Manifest::from_json("{ not json").unwrap_err(),
            Error::Manifest(ManifestError::Parse(_))
        ));
        assert!(matches!(
            Manifest::from_json(r#"{ "interfacez": [] }"#).unwrap_err(),
            Error::Manifest(ManifestError::Parse(_))
        ));
    }
}
