use reflecta::{
    BindOpts, Error, ErrorCode, Method, MethodPolicy, RefWrapper, RegistrationError, TypeRegistry,
    UValue,
};
use reflecta_testhelpers::{IPanic, test};

use crate::fixtures::{Circle, Label, Shape, Vec2};

struct Vec2Methods {
    dot: Method,
    scale: Method,
}

fn vec2_methods(registry: &TypeRegistry) -> Result<Vec2Methods, RegistrationError> {
    Ok(Vec2Methods {
        dot: Method::new(registry, "dot", Vec2::dot)?,
        scale: Method::new(registry, "scale", Vec2::scale)?,
    })
}

#[test]
fn receivers_decide_constness() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, scale } = vec2_methods(&registry)?;

    assert!(dot.get_type().is_const());
    assert!(!scale.get_type().is_const());
    assert_eq!(dot.arity(), 1);
    assert!(dot.get_type().owner_type() == registry.resolve::<Vec2>());
    assert!(scale.get_type().return_type().is_void());
    Ok(())
}

#[test]
fn invoke_on_references_and_values() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, scale } = vec2_methods(&registry)?;

    let mut v = Vec2::new(1, 2);
    let other = Vec2::new(3, 4);
    assert_eq!(dot.invoke(&v, (&other,)).get_as::<i32>(), Ok(&11));

    assert!(scale.invoke(&mut v, (3_i32,)).is_empty());
    assert_eq!(v, Vec2::new(3, 6));

    let mut value = UValue::new(Vec2::new(2, 0));
    scale.try_invoke(&mut value, (2_i16,))?;
    assert_eq!(value.get_as::<Vec2>(), Ok(&Vec2::new(4, 0)));
    assert_eq!(dot.try_invoke(&value, (other,))?.get_as::<i32>(), Ok(&12));
    Ok(())
}

#[test]
fn invoke_through_pointers() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, scale } = vec2_methods(&registry)?;

    let mut v = Vec2::new(1, 1);
    let ptr: *mut Vec2 = &mut v;
    scale.try_invoke(ptr, (5_i32,))?;
    let cptr: *const Vec2 = ptr;
    assert_eq!(dot.try_invoke(cptr, (Vec2::new(1, 0),))?.get_as::<i32>(), Ok(&5));

    // a pointer held in a value is followed too
    let held = UValue::new(ptr);
    assert_eq!(dot.try_invoke(&held, (Vec2::new(0, 1),))?.get_as::<i32>(), Ok(&5));
    assert_eq!(v, Vec2::new(5, 5));
    Ok(())
}

#[test]
fn instance_errors() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, scale } = vec2_methods(&registry)?;

    let v = Vec2::new(1, 1);
    assert_eq!(scale.try_invoke(&v, (2_i32,)).err(), Some(Error::BadConstAccess));

    let cptr: *const Vec2 = &v;
    assert_eq!(scale.try_invoke(cptr, (2_i32,)).err(), Some(Error::BadConstAccess));

    let null: *mut Vec2 = core::ptr::null_mut();
    assert_eq!(scale.try_invoke(null, (2_i32,)).err(), Some(Error::BadInstanceCast));

    let shape = Shape { id: 1 };
    assert_eq!(
        dot.try_invoke(&shape, (Vec2::new(0, 0),)).err(),
        Some(Error::InstanceTypeMismatch)
    );
    assert_eq!(
        dot.try_invoke(UValue::empty(), (Vec2::new(0, 0),)).err(),
        Some(Error::InstanceTypeMismatch)
    );
    Ok(())
}

#[test]
fn reference_wrappers_are_not_receivers() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, .. } = vec2_methods(&registry)?;

    let v = Vec2::new(1, 1);
    let wrapper = UValue::new(RefWrapper::new(&v));
    assert_eq!(
        dot.try_invoke(&wrapper, (Vec2::new(1, 0),)).err(),
        Some(Error::InstanceTypeMismatch)
    );
    Ok(())
}

#[test]
fn reference_parameters() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let longer_than = Method::new(&registry, "longer_than", Label::longer_than)?;

    let long = Label::new("long");
    let short = Label::new("ab");
    assert_eq!(longer_than.try_invoke(&long, (&short,))?.get_as::<bool>(), Ok(&true));
    assert_eq!(longer_than.try_invoke(&short, (long.clone(),))?.get_as::<bool>(), Ok(&false));
    assert_eq!(
        longer_than.try_invoke(&short, (UValue::new(Label::new("a")),))?.get_as::<bool>(),
        Ok(&true)
    );
    assert!(longer_than.is_invocable_with::<&Label, (&Label,)>());
    assert!(!longer_than.is_invocable_with::<&Label, (*const Label,)>());
    Ok(())
}

#[test]
fn borrows_of_the_receiver() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let opts = BindOpts::new().policy(MethodPolicy::ReturnReferenceAsPointer)?;
    let text = Method::with_opts(&registry, "text", Label::text, opts)?;
    assert!(text.get_type().is_const());
    assert!(text.get_type().return_type() == registry.resolve::<&'static String>());

    let label = Label::new("hello");
    let pointer = text.try_invoke(&label, ())?;
    assert_eq!(pointer.get_as::<*const String>(), Ok(&(&label.text as *const String)));

    let copy = Method::new(&registry, "text", Label::text)?;
    assert_eq!(copy.try_invoke(&label, ())?.get_as::<String>(), Ok(&String::from("hello")));

    let opts = BindOpts::new().policy(MethodPolicy::DiscardReturn)?;
    let discarded = Method::with_opts(&registry, "text", Label::text, opts)?;
    assert!(discarded.try_invoke(&label, ())?.is_empty());

    let opts = BindOpts::new().policy(MethodPolicy::ReturnReferenceAsPointer)?;
    let text_mut = Method::with_opts(&registry, "text_mut", Label::text_mut, opts)?;
    assert!(!text_mut.get_type().is_const());

    let mut label = Label::new("x");
    let pointer = *text_mut.try_invoke(&mut label, ())?.get_as::<*mut String>()?;
    unsafe { (*pointer).push('y') };
    assert_eq!(label.text, "xy");
    Ok(())
}

#[test]
fn arity_is_checked_before_the_instance() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, .. } = vec2_methods(&registry)?;

    let shape = Shape { id: 1 };
    assert_eq!(
        dot.try_invoke(&shape, ()).err(),
        Some(Error::ArityMismatch {
            expected: 1,
            actual: 0
        })
    );
    assert_eq!(
        dot.try_invoke(&Vec2::new(0, 0), (1_i32,)).err(),
        Some(Error::ArgumentTypeMismatch { position: 0 })
    );
    Ok(())
}

#[test]
fn type_only_checks() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, scale } = vec2_methods(&registry)?;

    assert!(dot.is_invocable_with::<&Vec2, (Vec2,)>());
    assert!(dot.is_invocable_with::<*const Vec2, (Vec2,)>());
    assert!(scale.is_invocable_with::<&mut Vec2, (i8,)>());
    assert_eq!(
        scale.check_invocable_error::<&Vec2, (i32,)>(),
        ErrorCode::BadConstAccess
    );
    assert_eq!(
        scale.check_invocable_error::<*const Vec2, (i32,)>(),
        ErrorCode::BadConstAccess
    );
    assert_eq!(
        dot.check_invocable_error::<&Shape, (Vec2,)>(),
        ErrorCode::InstanceTypeMismatch
    );

    let v = Vec2::new(0, 0);
    assert!(dot.is_invocable_with_args(&v, (Vec2::new(1, 1),)));
    assert_eq!(
        dot.check_invocable_error_with_args(&v, ()),
        ErrorCode::ArityMismatch
    );
    Ok(())
}

#[test]
fn base_methods_accept_derived_instances() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    registry.add_base::<Circle, Shape>()?;

    let shape_class = registry.resolve_class::<Shape>()?;
    shape_class.add_method(Method::new(&registry, "id", |shape: &Shape| shape.id)?)?;
    shape_class.add_method(Method::new(&registry, "renumber", |shape: &mut Shape, id: u32| {
        shape.id = id;
    })?)?;

    let circle_class = registry.resolve_class::<Circle>()?;
    let id = circle_class.get_method("id");
    assert!(id.is_valid());
    assert!(!circle_class.get_method("missing").is_valid());

    let mut circle = Circle {
        shape: Shape { id: 7 },
        radius: 1.5,
    };
    assert_eq!(id.try_invoke(&circle, ())?.get_as::<u32>(), Ok(&7));

    let renumber = circle_class.get_method_with("renumber", &[registry.resolve::<u8>()]);
    renumber.try_invoke(&mut circle, (9_u8,))?;
    assert_eq!(circle.shape.id, 9);

    let ptr: *mut Circle = &mut circle;
    assert_eq!(id.try_invoke(ptr, ())?.get_as::<u32>(), Ok(&9));
    Ok(())
}

#[test]
fn methods_are_checked_against_their_owner() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let Vec2Methods { dot, .. } = vec2_methods(&registry)?;
    let shape_class = registry.resolve_class::<Shape>()?;

    assert!(matches!(
        shape_class.add_method(dot.clone()),
        Err(RegistrationError::OwnerMismatch { .. })
    ));
    assert_eq!(
        shape_class.add_method(Method::default()),
        Err(RegistrationError::EmptyHandle)
    );

    let vec2_class = registry.resolve_class::<Vec2>()?;
    vec2_class.add_method(dot.clone())?;
    vec2_class.add_method(dot)?;
    assert_eq!(vec2_class.methods().len(), 1);
    Ok(())
}
