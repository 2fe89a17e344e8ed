use crate::{
    EnumType, EvalueIndex, Metadata, Number, Numeric, ReflectEnum, SharedValue, TypeRegistry,
    UValue, trace,
};

pub(crate) struct EvalueState {
    index: EvalueIndex,
    metadata: Metadata,
    value: SharedValue,
    underlying: SharedValue,
    number: Number,
}

super::handle! {
    /// A named constant of an enum.
    ///
    /// ```
    /// use reflecta::{Evalue, TypeRegistry};
    ///
    /// #[derive(Clone, Copy, PartialEq, Debug)]
    /// enum Color {
    ///     Red = 1,
    /// }
    /// reflecta::reflect_enum!(Color as u8);
    ///
    /// let registry = TypeRegistry::new();
    /// let red = Evalue::new(&registry, "red", Color::Red);
    /// assert_eq!(red.get_value().get_as::<Color>(), Ok(&Color::Red));
    /// assert_eq!(red.get_underlying_value().get_as::<u8>(), Ok(&1));
    /// ```
    Evalue, EvalueState, EvalueIndex
}

impl Evalue {
    /// Registers `value` under `name`.
    pub fn new<E: ReflectEnum>(registry: &TypeRegistry, name: &str, value: E) -> Self {
        Self::with_metadata(registry, name, value, Metadata::new())
    }

    /// Registers `value` under `name` with metadata attached.
    pub fn with_metadata<E: ReflectEnum>(
        registry: &TypeRegistry,
        name: &str,
        value: E,
        metadata: Metadata,
    ) -> Self {
        let Some(ty) = registry.resolve::<E>().as_enum() else {
            unreachable!("enums describe themselves as enums")
        };
        let underlying = value.to_underlying();
        trace!("registered evalue {name} of {}", ty.name());
        Evalue::from_state(EvalueState {
            index: EvalueIndex::new(ty, name),
            metadata,
            value: SharedValue::new(value),
            underlying: SharedValue::new(underlying),
            number: underlying.to_number(),
        })
    }

    /// Descriptor of the enum.
    pub fn get_type(&self) -> EnumType {
        self.get_index().get_type()
    }

    /// Name of the constant.
    pub fn get_name(&self) -> &str {
        self.get_index().get_name()
    }

    /// The constant as a value of the enum type.
    pub fn get_value(&self) -> &UValue {
        self.state().value.get()
    }

    /// The constant as a value of the underlying integer type.
    pub fn get_underlying_value(&self) -> &UValue {
        self.state().underlying.get()
    }

    pub(crate) fn underlying_number(&self) -> Number {
        self.state().number
    }
}
