use reflecta::{
    BindOpts, Error, ErrorCode, Function, FunctionPolicy, RegistrationError, SharedValue,
    TypeRegistry, UValue,
};
use reflecta_testhelpers::{IPanic, test};

use crate::fixtures::{Circle, Opaque, Shape};

fn add(registry: &TypeRegistry) -> Result<Function, RegistrationError> {
    Function::new(registry, "add", |a: i64, b: f64| a as f64 + b)
}

#[test]
fn invoke_widens_arguments() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let add = add(&registry)?;

    assert_eq!(add.get_name(), "add");
    assert_eq!(add.arity(), 2);
    assert_eq!(add.invoke((2_i32, 0.5_f32)).get_as::<f64>(), Ok(&2.5));
    assert_eq!(add.try_invoke((2_i64, 1.0_f64))?.get_as::<f64>(), Ok(&3.0));
    Ok(())
}

#[test]
fn checked_calls_report_the_first_problem() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let add = add(&registry)?;

    assert_eq!(
        add.try_invoke((1_i64,)).err(),
        Some(Error::ArityMismatch {
            expected: 2,
            actual: 1
        })
    );
    assert_eq!(
        add.try_invoke((1_i64, String::from("two"))).err(),
        Some(Error::ArgumentTypeMismatch { position: 1 })
    );
    // narrowing is never implicit
    assert_eq!(
        add.try_invoke((1.5_f64, 1.0_f64)).err(),
        Some(Error::ArgumentTypeMismatch { position: 0 })
    );
    Ok(())
}

#[test]
fn type_only_checks() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let add = add(&registry)?;

    assert!(add.is_invocable_with::<(i32, f32)>());
    assert!(!add.is_invocable_with::<(f32, f32)>());
    assert_eq!(add.check_invocable_error::<(i8, u16)>(), ErrorCode::NoError);
    assert_eq!(add.check_invocable_error::<(i64,)>(), ErrorCode::ArityMismatch);
    assert_eq!(
        add.check_invocable_error::<(i64, String)>(),
        ErrorCode::ArgumentTypeMismatch
    );
    assert!(add.is_invocable_with_args((1_i64, 2.0_f64)));
    assert_eq!(
        add.check_invocable_error_with_args((1_u64, 2.0_f64)),
        ErrorCode::ArgumentTypeMismatch
    );
    Ok(())
}

#[test]
fn dynamic_argument_lists() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let add = add(&registry)?;

    let args = vec![UValue::new(4_i64), UValue::new(0.25_f64)];
    assert_eq!(add.invoke(&args[..]).get_as::<f64>(), Ok(&4.25));
    assert_eq!(add.try_invoke(args)?.get_as::<f64>(), Ok(&4.25));

    let empty = vec![UValue::empty(), UValue::new(1.0_f64)];
    assert_eq!(
        add.try_invoke(empty).err(),
        Some(Error::ArgumentTypeMismatch { position: 0 })
    );
    Ok(())
}

#[test]
#[should_panic(expected = "invalid call of function add")]
fn unchecked_calls_panic_on_misuse() {
    let registry = TypeRegistry::new();
    let add = add(&registry).unwrap();
    add.invoke((String::from("nope"), 1.0_f64));
}

#[test]
fn void_and_discarded_returns_are_empty() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let noop = Function::new(&registry, "noop", || {})?;
    assert!(noop.invoke(()).is_empty());
    assert!(noop.get_type().return_type().is_void());

    let opts = BindOpts::new().policy(FunctionPolicy::DiscardReturn)?;
    let answer = Function::with_opts(&registry, "answer", || 42_i32, opts)?;
    assert!(answer.invoke(()).is_empty());
    Ok(())
}

#[test]
fn references_can_be_returned_as_pointers() -> Result<(), IPanic> {
    static LIMIT: i32 = 64;

    let registry = TypeRegistry::new();
    let opts = BindOpts::new().policy(FunctionPolicy::ReturnReferenceAsPointer)?;
    let limit = Function::with_opts(&registry, "limit", || &LIMIT, opts)?;

    let pointer = limit.invoke(());
    assert_eq!(pointer.get_as::<*const i32>(), Ok(&(&LIMIT as *const i32)));

    assert_eq!(
        pointer.deref_value().err(),
        Some(Error::UnsupportedOperation { operation: "deref" })
    );
    assert_eq!(unsafe { pointer.deref_unchecked() }?.get_as::<i32>(), Ok(&64));

    let copy = Function::new(&registry, "limit", || &LIMIT)?;
    assert_eq!(copy.invoke(()).deref_value()?.get_as::<i32>(), Ok(&64));
    Ok(())
}

#[test]
fn reference_parameters_borrow_their_arguments() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    registry.add_base::<Circle, Shape>()?;
    let id = Function::new(&registry, "id", |shape: &Shape| shape.id)?;
    assert!(id.get_type().argument_types()[0] == registry.resolve::<&'static Shape>());

    let shape = Shape { id: 3 };
    assert_eq!(id.try_invoke((&shape,))?.get_as::<u32>(), Ok(&3));
    assert_eq!(id.try_invoke((Shape { id: 4 },))?.get_as::<u32>(), Ok(&4));
    assert_eq!(id.try_invoke((UValue::new(Shape { id: 5 }),))?.get_as::<u32>(), Ok(&5));

    let circle = Circle {
        shape: Shape { id: 6 },
        radius: 1.0,
    };
    assert_eq!(id.try_invoke((&circle,))?.get_as::<u32>(), Ok(&6));

    assert!(id.is_invocable_with::<(Shape,)>());
    assert!(id.is_invocable_with::<(&Circle,)>());
    assert!(!id.is_invocable_with::<(*const Shape,)>());
    assert_eq!(
        id.try_invoke((7_u32,)).err(),
        Some(Error::ArgumentTypeMismatch { position: 0 })
    );
    Ok(())
}

#[test]
fn policies_must_fit_the_return_type() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();

    let err = Function::new(&registry, "make", || Opaque).err();
    assert!(matches!(
        err,
        Some(RegistrationError::PolicyMismatch {
            policy: "as_copy",
            ..
        })
    ));

    let opts = BindOpts::new().policy(FunctionPolicy::ReturnReferenceAsPointer)?;
    assert!(Function::with_opts(&registry, "seven", || 7_i32, opts).is_err());

    let opts = BindOpts::new().policy(FunctionPolicy::DiscardReturn)?;
    assert!(Function::with_opts(&registry, "make", || Opaque, opts).is_ok());
    Ok(())
}

#[test]
fn arguments_and_metadata() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let opts = BindOpts::new()
        .argument("lhs")
        .argument("rhs")
        .metadata("doc", SharedValue::new(String::from("adds two numbers")));
    let add = Function::with_opts(&registry, "add", |a: i64, b: f64| a as f64 + b, opts)?;

    let arguments = add.get_arguments();
    assert_eq!(arguments.len(), 2);
    assert_eq!(arguments[0].get_name(), "lhs");
    assert_eq!(arguments[1].get_position(), 1);
    assert!(arguments[1].get_type() == registry.resolve::<f64>());
    assert!(!add.get_argument(2).is_valid());

    let doc = add.get_metadata().get("doc");
    assert_eq!(
        doc.map(|value| value.get_as::<String>().cloned()),
        Some(Ok(String::from("adds two numbers")))
    );

    let opts = BindOpts::new().argument("a").argument("b").argument("c");
    assert_eq!(
        Function::with_opts(&registry, "add", |a: i64, b: f64| a as f64 + b, opts).err(),
        Some(RegistrationError::TooManyArgumentNames {
            provided: 3,
            arity: 2
        })
    );
    Ok(())
}

#[test]
fn empty_handles() {
    let empty = Function::default();
    assert!(!empty.is_valid());
    assert!(empty.try_index().is_none());
    assert!(empty.get_metadata().is_empty());
    assert_eq!(empty, Function::default());
    assert_eq!(format!("{empty:?}"), "Function(empty)");
}

#[test]
fn handles_compare_by_index() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let first = add(&registry)?;
    let second = add(&registry)?;
    let other = Function::new(&registry, "sub", |a: i64, b: f64| a as f64 - b)?;

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert!(Function::default() < first);
    Ok(())
}
