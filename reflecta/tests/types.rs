use std::sync::Arc;

use reflecta::{
    ClassFlags, RegistrationError, TypeId, TypeKind, TypeRegistry, resolve_type,
};
use reflecta_testhelpers::{IPanic, test};

use crate::fixtures::{Circle, Opaque, Shape, Vec2};

#[test]
fn kinds() {
    let registry = TypeRegistry::new();
    assert_eq!(registry.resolve::<()>().kind(), TypeKind::Void);
    assert_eq!(registry.resolve::<u16>().kind(), TypeKind::Number);
    assert_eq!(registry.resolve::<[i32; 3]>().kind(), TypeKind::Array);
    assert_eq!(registry.resolve::<*const Vec2>().kind(), TypeKind::Pointer);
    assert_eq!(registry.resolve::<&'static i32>().kind(), TypeKind::Reference);
    assert_eq!(registry.resolve::<Vec2>().kind(), TypeKind::Class);
    assert_eq!(registry.resolve::<String>().kind(), TypeKind::Class);
    assert_eq!(registry.resolve::<fn(i32) -> bool>().kind(), TypeKind::Function);
}

#[test]
fn numbers() {
    let registry = TypeRegistry::new();
    let u8_ty = registry.resolve_number::<u8>();
    let i16_ty = registry.resolve_number::<i16>();
    let f32_ty = registry.resolve_number::<f32>();
    let bool_ty = registry.resolve_number::<bool>();

    assert!(u8_ty.is_unsigned() && u8_ty.is_integral());
    assert!(f32_ty.is_floating_point() && f32_ty.is_signed());
    assert!(bool_ty.is_boolean());
    assert_eq!(i16_ty.size(), 2);

    assert!(u8_ty.can_widen_to(i16_ty));
    assert!(i16_ty.can_widen_to(f32_ty));
    assert!(!i16_ty.can_widen_to(u8_ty));
    assert!(!f32_ty.can_widen_to(i16_ty));
    assert!(!bool_ty.can_widen_to(u8_ty));
}

#[test]
fn indirections() {
    let registry = TypeRegistry::new();
    let array = registry.resolve::<[i32; 3]>().as_array().expect("arrays are arrays");
    assert_eq!(array.extent(), 3);
    assert!(array.data_type() == registry.resolve::<i32>());

    let ptr = registry.resolve::<*mut Vec2>().as_pointer().expect("pointer");
    assert!(!ptr.is_readonly());
    assert!(ptr.data_type() == registry.resolve::<Vec2>());
    let cptr = registry.resolve::<*const Vec2>().as_pointer().expect("pointer");
    assert!(cptr.is_readonly());
    assert_ne!(ptr.id(), cptr.id());
}

#[test]
fn classes() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let vec2 = registry.resolve_class::<Vec2>()?;
    assert_eq!(vec2.size(), size_of::<Vec2>());
    assert_eq!(vec2.align(), align_of::<Vec2>());
    assert!(vec2.flags().is_empty());

    let opaque = registry.resolve_class::<Opaque>()?;
    assert!(opaque.flags().contains(ClassFlags::IS_EMPTY));

    let list = registry.resolve_class::<Vec<u8>>()?;
    assert!(list.flags().contains(ClassFlags::IS_GENERIC | ClassFlags::IS_ARRAY_LIKE));
    assert_eq!(list.arity(), 1);
    assert!(list.argument_types()[0] == registry.resolve::<u8>());

    let shared = registry.resolve_class::<Arc<Vec2>>()?;
    assert!(shared.flags().contains(ClassFlags::IS_POINTER_LIKE));

    assert_eq!(
        registry.resolve_class::<u32>().err(),
        Some(RegistrationError::NotAClass {
            type_name: "u32"
        })
    );
    Ok(())
}

#[test]
fn inheritance() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let shape = registry.resolve_class::<Shape>()?;
    let circle = registry.resolve_class::<Circle>()?;
    assert!(!circle.is_derived_from(shape));

    registry.add_base::<Circle, Shape>()?;
    registry.add_base::<Circle, Shape>()?;
    assert_eq!(circle.bases(), vec![shape]);
    assert!(circle.is_derived_from(shape));
    assert!(shape.is_base_of(circle));
    assert!(!shape.is_derived_from(circle));
    assert!(!circle.is_derived_from(circle));
    Ok(())
}

#[test]
fn identities_are_stable() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let vec2 = registry.resolve::<Vec2>();
    assert_eq!(vec2, registry.resolve::<Vec2>());
    assert_eq!(vec2.id(), TypeId::of::<Vec2>());
    assert_eq!(registry.get_by_id(vec2.id()), Some(vec2));
    assert!(registry.types().contains(&vec2));

    // the global registry is a separate cache with the same identities
    let global = resolve_type::<Vec2>();
    assert_eq!(global.id(), vec2.id());
    assert!(!TypeRegistry::global().ptr_eq(&registry));
    assert!(registry.ptr_eq(&registry.clone()));

    let unseen = TypeRegistry::new();
    assert_eq!(unseen.get_by_id(TypeId::of::<Vec2>()), None);
    assert_eq!(vec2.name(), core::any::type_name::<Vec2>());
    Ok(())
}

#[test]
fn registry_types_are_ordered() {
    let registry = TypeRegistry::new();
    registry.resolve::<Shape>();
    registry.resolve::<u8>();
    let types = registry.types();
    assert!(types.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(registry.types_of::<(u8, Shape)>(), vec![
        registry.resolve::<u8>(),
        registry.resolve::<Shape>()
    ]);
}
