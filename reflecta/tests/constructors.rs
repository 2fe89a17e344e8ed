use std::sync::Arc;

use reflecta::{
    BindOpts, Constructor, ConstructorPolicy, Destructor, Error, ErrorCode, MemoryBuffer, Method,
    RegistrationError, TypeRegistry, UValue,
};
use reflecta_testhelpers::{IPanic, test};

use crate::fixtures::{Circle, Opaque, Shape, Tracked, Vec2, live};

#[test]
fn create_objects() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let ctor = Constructor::new(&registry, Vec2::new)?;

    assert_eq!(ctor.arity(), 2);
    assert!(ctor.get_type().owner_type() == registry.resolve::<Vec2>());
    assert_eq!(ctor.create((1_i32, 2_i32)).get_as::<Vec2>(), Ok(&Vec2::new(1, 2)));
    assert_eq!(ctor.try_create((3_i8, 4_u8))?.get_as::<Vec2>(), Ok(&Vec2::new(3, 4)));
    assert_eq!(
        ctor.try_create((1_i32,)).err(),
        Some(Error::ArityMismatch {
            expected: 2,
            actual: 1
        })
    );
    assert_eq!(
        ctor.try_create((1_i32, 2.0_f64)).err(),
        Some(Error::ArgumentTypeMismatch { position: 1 })
    );

    assert!(ctor.is_invocable_with::<(i16, i16)>());
    assert_eq!(ctor.check_invocable_error::<(i64, i32)>(), ErrorCode::ArgumentTypeMismatch);
    assert!(ctor.is_invocable_with_args((1_i32, 1_i32)));
    assert_eq!(ctor.check_invocable_error_with_args(()), ErrorCode::ArityMismatch);
    Ok(())
}

#[test]
fn classes_pick_the_first_fitting_constructor() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let class = registry.resolve_class::<Vec2>()?;
    class.add_constructor(Constructor::new(&registry, Vec2::new)?)?;
    class.add_constructor(Constructor::new(&registry, |both: i32| Vec2::new(both, both))?)?;

    assert_eq!(class.constructors().len(), 2);
    let unit = class.create((7_i32,)).ok_or(Error::BadUValueAccess)?;
    assert_eq!(unit.get_as::<Vec2>(), Ok(&Vec2::new(7, 7)));
    let pair = class.create((1_i32, 2_i32)).ok_or(Error::BadUValueAccess)?;
    assert_eq!(pair.get_as::<Vec2>(), Ok(&Vec2::new(1, 2)));
    assert!(class.create((String::new(),)).is_none());

    let by_types = class.get_constructor_with(&[registry.resolve::<u8>()]);
    assert_eq!(by_types.arity(), 1);
    assert!(!class.get_constructor_with(&[]).is_valid());
    Ok(())
}

#[test]
fn constructors_must_match_their_class() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let ctor = Constructor::new(&registry, Vec2::new)?;
    let string_class = registry.resolve_class::<String>()?;
    assert!(matches!(
        string_class.add_constructor(ctor),
        Err(RegistrationError::OwnerMismatch { .. })
    ));

    assert!(matches!(
        Constructor::new(&registry, || Opaque),
        Err(RegistrationError::PolicyMismatch { .. })
    ));
    Ok(())
}

#[test]
fn raw_pointers_are_released_by_the_destructor() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let opts = BindOpts::new().policy(ConstructorPolicy::AsRawPointer)?;
    let ctor = Constructor::with_opts(&registry, Vec2::new, opts)?;
    let dtor = Destructor::new::<Vec2>(&registry);

    let value = ctor.create((5_i32, 6_i32));
    let ptr = *value.get_as::<*mut Vec2>()?;
    assert_eq!(unsafe { &*ptr }, &Vec2::new(5, 6));

    assert!(dtor.is_invocable_with::<*mut Vec2>());
    assert!(!dtor.is_invocable_with::<*const Vec2>());
    assert_eq!(
        dtor.check_invocable_error::<i32>(),
        ErrorCode::ArgumentTypeMismatch
    );

    let null: *mut Vec2 = core::ptr::null_mut();
    assert_eq!(unsafe { dtor.try_destroy(null) }, Err(Error::BadInstanceCast));
    assert_eq!(
        unsafe { dtor.try_destroy(3_i32) },
        Err(Error::ArgumentTypeMismatch { position: 0 })
    );
    unsafe { dtor.try_destroy(&value) }?;
    Ok(())
}

#[test]
fn destructors_refuse_pointers_to_derived_classes() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    registry.add_base::<Circle, Shape>()?;
    let opts = BindOpts::new().policy(ConstructorPolicy::AsRawPointer)?;
    let ctor = Constructor::with_opts(
        &registry,
        |id: u32, radius: f64| Circle {
            shape: Shape { id },
            radius,
        },
        opts,
    )?;
    let shape_dtor = Destructor::new::<Shape>(&registry);
    let circle_dtor = Destructor::new::<Circle>(&registry);

    let circle = ctor.create((3_u32, 1.5_f64));
    assert_eq!(unsafe { &**circle.get_as::<*mut Circle>()? }.radius, 1.5);

    assert!(!shape_dtor.is_invocable_with::<*mut Circle>());
    assert_eq!(
        shape_dtor.check_invocable_error::<*mut Circle>(),
        ErrorCode::ArgumentTypeMismatch
    );
    assert_eq!(
        unsafe { shape_dtor.try_destroy(&circle) },
        Err(Error::ArgumentTypeMismatch { position: 0 })
    );

    assert!(circle_dtor.is_invocable_with::<*mut Circle>());
    unsafe { circle_dtor.try_destroy(&circle) }?;
    Ok(())
}

#[test]
fn shared_pointers() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let opts = BindOpts::new().policy(ConstructorPolicy::AsSharedPointer)?;
    let ctor = Constructor::with_opts(&registry, || Opaque, opts)?;
    let value = ctor.create(());
    assert!(value.is::<Arc<Opaque>>());

    let opts = BindOpts::new().policy(ConstructorPolicy::AsSharedPointer)?;
    let ctor = Constructor::with_opts(&registry, Vec2::new, opts)?;
    let shared = ctor.create((1_i32, 1_i32));
    let copy = shared.clone();
    let arc = shared.get_as::<Arc<Vec2>>()?;
    assert_eq!(Arc::strong_count(arc), 2);
    assert_eq!(copy.deref_value()?.get_as::<Vec2>(), Ok(&Vec2::new(1, 1)));
    Ok(())
}

#[test]
fn placement_construction_and_destruction() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let class = registry.resolve_class::<Tracked>()?;
    class.add_constructor(Constructor::new(&registry, Tracked::new)?)?;
    class.add_destructor(Destructor::new::<Tracked>(&registry))?;
    class.add_method(Method::new(&registry, "bump", |t: &mut Tracked| t.value += 1)?)?;
    class.add_method(Method::new(&registry, "value", |t: &Tracked| t.value)?)?;

    let before = live();
    let mut buffer = MemoryBuffer::for_class(class);
    assert_eq!(buffer.size(), class.size());

    let mem = buffer.as_mut_ptr();
    let pointer = unsafe { class.create_at(mem, (41_i32,)) }.ok_or(Error::BadUValueAccess)?;
    assert_eq!(live(), before + 1);
    assert_eq!(*pointer.get_as::<*mut Tracked>()?, mem.cast::<Tracked>());

    class.get_method("bump").try_invoke(&pointer, ())?;
    let value = class.get_method("value").try_invoke(&pointer, ())?;
    assert_eq!(value.get_as::<i32>(), Ok(&42));

    let copy: UValue = class.create((1_i32,)).ok_or(Error::BadUValueAccess)?;
    assert_eq!(live(), before + 2);
    drop(copy);

    assert!(unsafe { class.destroy_at(mem) });
    assert_eq!(live(), before);
    Ok(())
}
