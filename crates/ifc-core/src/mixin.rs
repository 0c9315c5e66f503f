//! Mixin installer: applies a contract's defaults onto a target type
//!
//! # Pipeline
//!
//! `Exemptions::collect → check → collect methods (preorder) → install`
//!
//! Installation is first-writer-wins. A method is written only if its site
//! has no *own* member at that key, whether the member was declared by the
//! target or installed earlier in the same pass. Because the check runs
//! before any write, a failed mixin leaves the target untouched.
//!
//! Applying several contracts is sequential `mixin` calls in list order, so
//! the first contract in an `implements` list wins ties.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::conformance::{self, Exemptions};
use crate::contract::ContractDescriptor;
use crate::hierarchy;
use crate::object::{ClassType, Property};
use crate::Result;

/// One member written onto the target by a mixin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledMember {
    /// Rendered key (`name` or `Symbol(Contract.field)`)
    pub key: String,
    pub is_static: bool,
    /// Contract whose method was installed
    pub from: String,
}

/// What a single mixin did to its target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MixinReport {
    pub contract: String,
    pub target: String,
    pub installed: Vec<InstalledMember>,
    /// Methods not written because the site already owned the key
    pub skipped: usize,
}

/// Check `target` against `contract`, then install every default it lacks.
///
/// # Errors
/// `Conformance` if any field in the hierarchy is unsatisfied. The target
/// is unchanged in that case.
pub fn mixin<'t>(
    contract: &ContractDescriptor,
    target: &'t mut ClassType,
) -> Result<&'t mut ClassType> {
    mixin_with_report(contract, target)?;
    Ok(target)
}

/// `mixin`, returning the record of what was installed and skipped
pub fn mixin_with_report(
    contract: &ContractDescriptor,
    target: &mut ClassType,
) -> Result<MixinReport> {
    let exemptions = Exemptions::collect(contract);
    if let Err(err) = conformance::check(contract, target, &exemptions) {
        warn!(
            contract = contract.name(),
            target = target.name(),
            missing = err.missing().len(),
            "mixin rejected"
        );
        return Err(err.into());
    }

    let methods = hierarchy::collect(contract, |c| c.methods().iter().map(move |m| (c, m)));

    let mut report = MixinReport {
        contract: contract.name().to_string(),
        target: target.name().to_string(),
        ..MixinReport::default()
    };

    for (owner, method) in methods {
        let site = target.site_mut(method.is_static());
        if site.has_own(method.key()) {
            debug!(key = %method.key(), from = owner.name(), "skipped, already owned");
            report.skipped += 1;
            continue;
        }
        site.define(
            method.key().clone(),
            Property::installed(method.body().clone(), method.is_static()),
        )?;
        debug!(
            key = %method.key(),
            from = owner.name(),
            is_static = method.is_static(),
            "installed"
        );
        report.installed.push(InstalledMember {
            key: method.key().to_string(),
            is_static: method.is_static(),
            from: owner.name().to_string(),
        });
    }

    info!(
        contract = contract.name(),
        target = target.name(),
        installed = report.installed.len(),
        skipped = report.skipped,
        "mixin applied"
    );
    Ok(report)
}

/// Apply an ordered `implements` list, left to right.
///
/// Stops at the first failing contract. Contracts before it stay applied.
pub fn implements<'t, C>(
    target: &'t mut ClassType,
    contracts: &[C],
) -> Result<&'t mut ClassType>
where
    C: AsRef<ContractDescriptor>,
{
    implements_with_report(target, contracts)?;
    Ok(target)
}

/// `implements`, returning one report per applied contract
pub fn implements_with_report<C>(
    target: &mut ClassType,
    contracts: &[C],
) -> Result<Vec<MixinReport>>
where
    C: AsRef<ContractDescriptor>,
{
    contracts
        .iter()
        .map(|contract| mixin_with_report(contract.as_ref(), target))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Contract, ContractBuilder};
    use crate::object::{ClassBuilder, PropertyKey};
    use crate::value::{Callable, Value};
    use crate::Error;
    use std::sync::Arc;

    fn returns(v: i64) -> Callable {
        Callable::constant(Value::Integer(v))
    }

    fn installed_body(class: &ClassType, key: &str, is_static: bool) -> Option<Callable> {
        class
            .site(is_static)
            .get_own(&PropertyKey::from(key))
            .and_then(Property::as_method)
            .cloned()
    }

    fn with_foo(name: &str, body: &Callable) -> Contract {
        ContractBuilder::new(name)
            .method("foo", body.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_installs_defaults_and_returns_target() {
        let greet = Callable::constant(Value::from("hi"));
        let greeter = ContractBuilder::new("Greeter")
            .method("greet", greet.clone())
            .static_method("create", returns(1))
            .build()
            .unwrap();
        let mut person = ClassType::new("Person");
        let out = mixin(&greeter, &mut person).unwrap();
        assert_eq!(out.name(), "Person");
        assert!(installed_body(&person, "greet", false).unwrap().same(&greet));
        assert!(installed_body(&person, "create", true).is_some());
    }

    #[test]
    fn test_first_mixin_wins() {
        let a_foo = returns(1);
        let b_foo = returns(2);
        let a = with_foo("A", &a_foo);
        let b = with_foo("B", &b_foo);

        let mut t = ClassType::new("T");
        mixin(&a, &mut t).unwrap();
        mixin(&b, &mut t).unwrap();
        assert!(installed_body(&t, "foo", false).unwrap().same(&a_foo));

        let mut u = ClassType::new("U");
        mixin(&b, &mut u).unwrap();
        mixin(&a, &mut u).unwrap();
        assert!(installed_body(&u, "foo", false).unwrap().same(&b_foo));
    }

    #[test]
    fn test_own_member_never_overwritten() {
        let own = returns(0);
        let contract = with_foo("A", &returns(1));
        let mut t = ClassBuilder::new("T").method("foo", own.clone()).build().unwrap();
        let report = mixin_with_report(&contract, &mut t).unwrap();
        assert!(installed_body(&t, "foo", false).unwrap().same(&own));
        assert!(report.installed.is_empty());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_own_method_beats_parent_method() {
        let parent_foo = returns(1);
        let child_foo = returns(2);
        let parent = with_foo("Parent", &parent_foo);
        let child = ContractBuilder::new("Child")
            .extends(&parent)
            .method("foo", child_foo.clone())
            .build()
            .unwrap();
        let mut t = ClassType::new("T");
        mixin(&child, &mut t).unwrap();
        assert!(installed_body(&t, "foo", false).unwrap().same(&child_foo));
    }

    #[test]
    fn test_left_parent_beats_right_parent() {
        let left_foo = returns(1);
        let left = with_foo("Left", &left_foo);
        let right = with_foo("Right", &returns(2));
        let both = ContractBuilder::new("Both")
            .extends(&left)
            .extends(&right)
            .build()
            .unwrap();
        let mut t = ClassType::new("T");
        let report = mixin_with_report(&both, &mut t).unwrap();
        assert!(installed_body(&t, "foo", false).unwrap().same(&left_foo));
        assert_eq!(report.installed.len(), 1);
        assert_eq!(report.installed[0].from, "Left");
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_failure_leaves_target_untouched() {
        let needy = ContractBuilder::new("Needy")
            .field("a")
            .field("b")
            .method("helper", returns(1))
            .static_method("make", returns(2))
            .build()
            .unwrap();
        let mut t = ClassType::new("T");
        let err = mixin(&needy, &mut t).unwrap_err();
        match err {
            Error::Conformance(e) => assert_eq!(e.missing().len(), 2),
            other => panic!("expected conformance error, got {other:?}"),
        }
        assert!(t.prototype().is_empty());
        assert!(t.statics().is_empty());
    }

    #[test]
    fn test_identity_default_installed_under_identity_key() {
        let keyed = ContractBuilder::new("Keyed").field("key").build().unwrap();
        let key = keyed.field_identity("key").unwrap();
        let body = returns(42);
        let auto = ContractBuilder::new("AutoKeyed")
            .extends(&keyed)
            .default_for(key.clone(), body.clone())
            .build()
            .unwrap();
        let mut t = ClassType::new("T");
        mixin(&auto, &mut t).unwrap();
        let installed = t
            .prototype()
            .get_own(&PropertyKey::from(&key))
            .and_then(Property::as_method)
            .unwrap();
        assert!(installed.same(&body));
        assert!(!t.prototype().has_own(&PropertyKey::from("key")));

        let instance = Arc::new(t).instantiate();
        assert_eq!(
            instance.call(&PropertyKey::from(&key), &[]).unwrap(),
            Value::Integer(42)
        );
    }

    #[test]
    fn test_installed_enumerability_follows_site() {
        let contract = ContractBuilder::new("Flags")
            .method("inst", returns(1))
            .static_method("stat", returns(2))
            .build()
            .unwrap();
        let mut t = ClassType::new("T");
        mixin(&contract, &mut t).unwrap();
        assert_eq!(t.prototype().keys().count(), 0);
        assert_eq!(t.statics().keys().count(), 1);
        let inst = t.prototype().get_own(&PropertyKey::from("inst")).unwrap();
        assert!(inst.writable && inst.configurable);
    }

    #[test]
    fn test_installed_default_redefinable_by_target() {
        let contract = with_foo("A", &returns(1));
        let mut t = ClassType::new("T");
        mixin(&contract, &mut t).unwrap();
        let replacement = returns(9);
        t.site_mut(false)
            .define(PropertyKey::from("foo"), Property::method(replacement.clone()))
            .unwrap();
        assert!(installed_body(&t, "foo", false).unwrap().same(&replacement));
    }

    #[test]
    fn test_inherited_member_does_not_block_install() {
        let base_foo = returns(0);
        let base = Arc::new(ClassBuilder::new("Base").method("foo", base_foo).build().unwrap());
        let contract_foo = returns(1);
        let contract = with_foo("A", &contract_foo);
        let mut derived = ClassBuilder::new("Derived").extends(base).build().unwrap();
        mixin(&contract, &mut derived).unwrap();
        assert!(installed_body(&derived, "foo", false).unwrap().same(&contract_foo));
    }

    #[test]
    fn test_diamond_installs_shared_default_once() {
        let top = ContractBuilder::new("Top")
            .field("id")
            .own_default("id", returns(7))
            .method("describe", returns(0))
            .build()
            .unwrap();
        let left = ContractBuilder::new("Left").extends(&top).build().unwrap();
        let right = ContractBuilder::new("Right").extends(&top).build().unwrap();
        let bottom = ContractBuilder::new("Bottom")
            .extends(&left)
            .extends(&right)
            .build()
            .unwrap();

        let mut via_diamond = ClassType::new("Diamond");
        let report = mixin_with_report(&bottom, &mut via_diamond).unwrap();
        assert_eq!(report.installed.len(), 2);
        assert_eq!(report.skipped, 2, "second path re-visits both methods");

        let mut via_top = ClassType::new("Direct");
        mixin(&top, &mut via_top).unwrap();
        assert_eq!(via_diamond.prototype().len(), via_top.prototype().len());
    }

    #[test]
    fn test_implements_applies_in_order() {
        let first_foo = returns(1);
        let contracts = vec![with_foo("First", &first_foo), with_foo("Second", &returns(2))];
        let mut t = ClassType::new("T");
        let reports = implements_with_report(&mut t, &contracts).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].skipped, 1);
        assert!(installed_body(&t, "foo", false).unwrap().same(&first_foo));
    }

    #[test]
    fn test_implements_stops_at_first_failure() {
        let ok = with_foo("Ok", &returns(1));
        let needy = ContractBuilder::new("Needy").field("x").build().unwrap();
        let later = ContractBuilder::new("Later").method("bar", returns(2)).build().unwrap();
        let mut t = ClassType::new("T");
        let err = implements(&mut t, &[ok, needy, later]).unwrap_err();
        assert!(matches!(err, Error::Conformance(_)));
        assert!(installed_body(&t, "foo", false).is_some());
        assert!(installed_body(&t, "bar", false).is_none());
    }
}
