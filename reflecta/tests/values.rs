use core::cmp::Ordering;

use reflecta::{Error, TypeRegistry, UValue};
use reflecta_testhelpers::{IPanic, test};

use crate::fixtures::{Opaque, Shape, Vec2};

#[test]
fn empty_values() {
    let empty = UValue::empty();
    assert!(empty.is_empty());
    assert!(!empty.is_valid());
    assert_eq!(empty.type_name(), None);
    assert_eq!(empty.get_as::<i32>(), Err(Error::BadUValueAccess));
    assert_eq!(empty, UValue::default());
    assert_eq!(format!("{empty:?}"), "UValue(empty)");
    assert_eq!(empty.to_display_string(), Err(Error::BadUValueAccess));
}

#[test]
fn typed_access() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let mut value = UValue::new(Vec2::new(1, 2));
    assert!(value.is::<Vec2>());
    assert!(!value.is::<Shape>());
    assert_eq!(value.get_type(&registry), Some(registry.resolve::<Vec2>()));

    value.get_as_mut::<Vec2>()?.x = 10;
    assert_eq!(value.get_as::<Vec2>()?.x, 10);
    assert!(value.try_get_as::<i32>().is_none());
    assert_eq!(value.get_as::<i32>(), Err(Error::BadUValueAccess));

    let back = value.into_inner::<Vec2>();
    assert_eq!(back.ok(), Some(Vec2::new(10, 2)));

    let number = UValue::new(5_u8);
    let number = number.into_inner::<i32>().expect_err("a u8 is not an i32");
    assert_eq!(number.get_as::<u8>(), Ok(&5));
    Ok(())
}

#[test]
fn emplace_reset_and_swap() -> Result<(), IPanic> {
    let mut value = UValue::new(1_i32);
    *value.emplace(String::from("two")) += "!";
    assert_eq!(value.get_as::<String>()?, "two!");

    let mut other = UValue::new(3.0_f64);
    value.swap(&mut other);
    assert_eq!(value.get_as::<f64>(), Ok(&3.0));
    assert_eq!(other.get_as::<String>()?, "two!");

    other.reset();
    assert!(other.is_empty());
    Ok(())
}

#[test]
fn copies_are_independent() -> Result<(), IPanic> {
    let original = UValue::new(vec![1_u32, 2, 3]);
    let mut copy = original.clone();
    copy.get_as_mut::<Vec<u32>>()?.push(4);

    assert_eq!(original.get_as::<Vec<u32>>()?.len(), 3);
    assert_eq!(copy.get_as::<Vec<u32>>()?.len(), 4);
    assert_ne!(original, copy);
    Ok(())
}

#[test]
fn comparisons() -> Result<(), IPanic> {
    let one = UValue::new(1_i32);
    let two = UValue::new(2_i32);
    assert!(one < two);
    assert_eq!(one.try_partial_cmp(&two)?, Some(Ordering::Less));
    assert!(one.try_eq(&UValue::new(1_i32))?);

    // different types never compare equal, even when the numbers match
    assert!(!one.try_eq(&UValue::new(1_i64))?);
    assert_eq!(one.try_partial_cmp(&UValue::new(1_i64))?, None);
    assert!(UValue::empty() < one);

    let vec2 = UValue::new(Vec2::new(0, 0));
    assert_eq!(
        vec2.try_partial_cmp(&vec2.clone()),
        Err(Error::UnsupportedOperation { operation: "ord" })
    );
    Ok(())
}

#[test]
fn formatting_and_parsing() -> Result<(), IPanic> {
    let mut value = UValue::new(0_i64);
    value.parse_from("-42")?;
    assert_eq!(value.get_as::<i64>(), Ok(&-42));
    assert_eq!(value.to_display_string()?, "-42");
    assert_eq!(format!("{value:?}"), "UValue(-42)");

    assert_eq!(
        value.parse_from("forty"),
        Err(Error::ParseFailed { type_name: "i64" })
    );
    assert_eq!(value.get_as::<i64>(), Ok(&-42));

    let mut vec2 = UValue::new(Vec2::new(1, 2));
    assert_eq!(
        vec2.parse_from("1,2"),
        Err(Error::UnsupportedOperation { operation: "parse" })
    );
    assert_eq!(
        vec2.to_display_string(),
        Err(Error::UnsupportedOperation { operation: "display" })
    );
    assert_eq!(format!("{vec2:?}"), "UValue(Vec2 { x: 1, y: 2 })");
    Ok(())
}

#[test]
fn deref_and_index() -> Result<(), IPanic> {
    static ANSWER: u16 = 42;

    let reference = UValue::new(&ANSWER);
    assert_eq!(reference.deref_value()?.get_as::<u16>(), Ok(&42));

    let array = UValue::new([10_u8, 20, 30]);
    assert_eq!(array.index_value(1)?.get_as::<u8>(), Ok(&20));
    assert!(array.index_value(3).is_err());

    let null: *const u16 = core::ptr::null();
    assert_eq!(
        UValue::new(null).deref_value().err(),
        Some(Error::UnsupportedOperation { operation: "deref" })
    );
    assert_eq!(
        unsafe { UValue::new(null).deref_unchecked() }.err(),
        Some(Error::BadUValueAccess)
    );
    let pointer: *const u16 = &ANSWER;
    assert_eq!(unsafe { UValue::new(pointer).deref_unchecked() }?.get_as::<u16>(), Ok(&42));
    assert_eq!(
        UValue::new(1_u8).deref_value().err(),
        Some(Error::UnsupportedOperation { operation: "deref" })
    );
    Ok(())
}

#[test]
fn values_without_a_clone_op_are_rejected() {
    assert_eq!(
        UValue::from_reflected(Opaque).err(),
        Some(Error::UnsupportedOperation { operation: "clone" })
    );
    assert!(UValue::from_reflected(Shape { id: 1 }).is_ok());
}
