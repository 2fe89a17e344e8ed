use parking_lot::RwLock;
use reflecta::{Function, RegistrationError, Scope, TypeRegistry, Variable};
use reflecta_testhelpers::{IPanic, test};

use crate::fixtures::Vec2;

fn math(registry: &TypeRegistry) -> Result<Scope, RegistrationError> {
    let math = Scope::new("math");
    math.add_function(Function::new(registry, "abs", |x: i64| x.abs())?)?;
    math.add_function(Function::new(registry, "abs", |x: f64| x.abs())?)?;
    math.add_function(Function::new(registry, "neg", |x: i64| -x)?)?;
    Ok(math)
}

#[test]
fn overloads_are_told_apart_by_argument_types() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let math = math(&registry)?;

    assert_eq!(math.get_name(), "math");
    assert_eq!(math.functions().len(), 3);

    let abs_f64 = math.get_function_with("abs", &[registry.resolve::<f32>()]);
    assert!(abs_f64.get_type().return_type() == registry.resolve::<f64>());
    assert_eq!(abs_f64.invoke((-1.5_f32,)).get_as::<f64>(), Ok(&1.5));

    let abs_i64 = math.get_function_with("abs", &[registry.resolve::<i64>()]);
    assert_eq!(abs_i64.invoke((-4_i64,)).get_as::<i64>(), Ok(&4));

    assert!(math.get_function("abs").is_valid());
    assert!(!math.get_function_with("abs", &[registry.resolve::<String>()]).is_valid());
    assert!(!math.get_function("sqrt").is_valid());
    Ok(())
}

#[test]
fn adding_the_same_signature_replaces() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let math = math(&registry)?;
    math.add_function(Function::new(&registry, "neg", |x: i64| x.wrapping_neg())?)?;
    assert_eq!(math.functions().len(), 3);
    assert_eq!(
        math.add_function(Function::default()),
        Err(RegistrationError::EmptyHandle)
    );
    Ok(())
}

#[test]
fn variables_and_typedefs() -> Result<(), IPanic> {
    static ORIGIN: Vec2 = Vec2 { x: 0, y: 0 };
    static SCALE: RwLock<i32> = RwLock::new(1);

    let registry = TypeRegistry::new();
    let scope = Scope::new("geometry");
    scope.add_variable(Variable::readonly(&registry, "origin", &ORIGIN)?)?;
    scope.add_variable(Variable::new(&registry, "scale", &SCALE)?)?;
    scope.add_typedef("point", registry.resolve::<Vec2>());

    assert_eq!(scope.variables().len(), 2);
    assert_eq!(
        scope.get_variable("origin").get().get_as::<Vec2>(),
        Ok(&Vec2::new(0, 0))
    );
    scope.get_variable("scale").try_set(3_i8)?;
    assert_eq!(*SCALE.read(), 3);
    assert!(!scope.get_variable("missing").is_valid());

    assert_eq!(scope.get_typedef("point"), Some(registry.resolve::<Vec2>()));
    assert_eq!(scope.get_typedef("vector"), None);
    scope.add_typedef("point", registry.resolve::<i32>());
    assert_eq!(scope.typedefs(), vec![(String::from("point"), registry.resolve::<i32>())]);
    Ok(())
}

#[test]
fn merging_copies_entries() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let math = math(&registry)?;
    let extra = Scope::new("extra");
    extra.add_function(Function::new(&registry, "neg", |x: i64| 0 - x)?)?;
    extra.add_function(Function::new(&registry, "half", |x: f64| x / 2.0)?)?;
    extra.add_typedef("real", registry.resolve::<f64>());

    math.merge(&extra);
    assert_eq!(math.functions().len(), 4);
    assert!(math.get_function("half").is_valid());
    assert_eq!(math.get_typedef("real"), Some(registry.resolve::<f64>()));
    assert_eq!(extra.functions().len(), 2);
    Ok(())
}

#[test]
fn static_scopes_are_shared_per_registry() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let first = registry.static_scope("std");
    first.add_function(Function::new(&registry, "one", || 1_i32)?)?;

    let again = registry.clone().static_scope("std");
    assert_eq!(again.get_function("one").invoke(()).get_as::<i32>(), Ok(&1));
    assert_eq!(first, again);

    let other = TypeRegistry::new();
    assert!(other.static_scope("std").functions().is_empty());
    Ok(())
}
