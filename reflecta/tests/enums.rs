use reflecta::{Evalue, Metadata, RegistrationError, SharedValue, TypeKind, TypeRegistry};
use reflecta_testhelpers::{IPanic, test};

#[derive(Clone, Copy, PartialEq, Debug)]
enum Color {
    Red = 1,
    Green = 2,
    Blue = 4,
}
reflecta::reflect_enum!(Color as u8);

#[derive(Clone, Copy, PartialEq, Debug)]
enum Level {
    Low = -1,
}
reflecta::reflect_enum!(Level as i16);

#[test]
fn evalues_map_names_to_values() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let ty = registry.resolve::<Color>();
    assert_eq!(ty.kind(), TypeKind::Enum);

    let color = ty.as_enum().expect("enums describe themselves as enums");
    color.add_evalue(Evalue::new(&registry, "red", Color::Red))?;
    color.add_evalue(Evalue::new(&registry, "green", Color::Green))?;
    color.add_evalue(Evalue::new(&registry, "blue", Color::Blue))?;

    assert_eq!(color.value_to_name(Color::Green).as_deref(), Some("green"));
    assert_eq!(
        color
            .name_to_value("blue")
            .map(|value| value.get_as::<Color>().copied()),
        Some(Ok(Color::Blue))
    );
    assert!(color.name_to_value("purple").is_none());

    let names: Vec<String> = color
        .evalues()
        .iter()
        .map(|evalue| evalue.get_name().to_owned())
        .collect();
    assert_eq!(names, ["blue", "green", "red"]);

    let red = color.get_evalue("red");
    assert!(red.get_type() == color);
    assert_eq!(red.get_underlying_value().get_as::<u8>(), Ok(&1));
    assert!(!color.get_evalue("purple").is_valid());
    Ok(())
}

#[test]
fn underlying_types() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let level = registry.resolve::<Level>().as_enum().expect("Level is an enum");
    assert!(level.underlying_type().is_signed());
    assert_eq!(level.underlying_type().size(), 2);

    let low = Evalue::with_metadata(
        &registry,
        "low",
        Level::Low,
        Metadata::new().with("label", SharedValue::new(String::from("LOW"))),
    );
    assert_eq!(low.get_underlying_value().get_as::<i16>(), Ok(&-1));
    assert!(low.get_metadata().contains("label"));
    level.add_evalue(low)?;
    assert_eq!(level.value_to_name(Level::Low).as_deref(), Some("low"));
    Ok(())
}

#[test]
fn evalues_belong_to_one_enum() -> Result<(), IPanic> {
    let registry = TypeRegistry::new();
    let level = registry.resolve::<Level>().as_enum().expect("Level is an enum");

    assert!(matches!(
        level.add_evalue(Evalue::new(&registry, "red", Color::Red)),
        Err(RegistrationError::OwnerMismatch { .. })
    ));
    assert_eq!(level.add_evalue(Evalue::default()), Err(RegistrationError::EmptyHandle));

    // same name replaces
    let color = registry.resolve::<Color>().as_enum().expect("Color is an enum");
    color.add_evalue(Evalue::new(&registry, "primary", Color::Red))?;
    color.add_evalue(Evalue::new(&registry, "primary", Color::Blue))?;
    assert_eq!(color.evalues().len(), 1);
    assert_eq!(color.value_to_name(Color::Blue).as_deref(), Some("primary"));
    assert_eq!(color.value_to_name(Color::Red), None);
    Ok(())
}
