use std::sync::LazyLock;

use proptest::prelude::*;
use reflecta::{Function, Member, TypeRegistry, UValue};

use crate::fixtures::Vec2;

/// Shared by every case: registries keep their descriptors for the life of
/// the process.
static REGISTRY: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    /// Passing a narrower number gives the callee the same value.
    #[test]
    fn widening_preserves_values(a in any::<i32>(), b in any::<f32>().prop_filter("finite", |b| b.is_finite())) {
        let registry = &*REGISTRY;
        let pair = Function::new(registry, "pair", |a: i64, b: f64| a as f64 + b).unwrap();
        let identity = Function::new(registry, "identity", |a: i64| a).unwrap();

        let id_out = identity.invoke((a,));
        prop_assert_eq!(id_out.get_as::<i64>(), Ok(&i64::from(a)));
        let pair_out = pair.try_invoke((a, b)).unwrap();
        prop_assert_eq!(
            pair_out.get_as::<f64>(),
            Ok(&(f64::from(a) + f64::from(b)))
        );
    }

    /// What a member setter stores, its getter reads back.
    #[test]
    fn members_read_back_what_was_written(x in any::<i16>(), y in any::<i32>()) {
        let registry = &*REGISTRY;
        let mx = Member::new(registry, "x", |v: &Vec2| &v.x, |v: &mut Vec2| &mut v.x).unwrap();
        let my = Member::new(registry, "y", |v: &Vec2| &v.y, |v: &mut Vec2| &mut v.y).unwrap();

        let mut value = UValue::new(Vec2::new(0, 0));
        mx.try_set(&mut value, x).unwrap();
        my.try_set(&mut value, y).unwrap();

        prop_assert_eq!(value.get_as::<Vec2>(), Ok(&Vec2::new(i32::from(x), y)));
        let x_out = mx.get(&value);
        prop_assert_eq!(x_out.get_as::<i32>(), Ok(&i32::from(x)));
    }

    /// Copies compare equal to their source and stay independent of it.
    #[test]
    fn copies_compare_equal(items in prop::collection::vec(any::<u32>(), 0..16)) {
        let original = UValue::new(items.clone());
        let mut copy = original.clone();
        prop_assert_eq!(&original, &copy);

        copy.get_as_mut::<Vec<u32>>().unwrap().push(0);
        prop_assert_eq!(original.get_as::<Vec<u32>>(), Ok(&items));
    }
}
