use alloc::collections::BTreeMap;

use parking_lot::RwLock;

use crate::{
    Evalue, Numeric, NumberType, Reflect, RegistrationError, TypeRegistry, UValue, debug,
};

/// Fieldless enums whose variants convert to an underlying integer.
///
/// Usually implemented through [`crate::reflect_enum!`].
pub trait ReflectEnum: Reflect + Copy + Send + Sync {
    /// The underlying integer type.
    type Underlying: Numeric;

    /// Converts to the underlying integer.
    fn to_underlying(self) -> Self::Underlying;
}

/// Enum descriptor payload.
pub struct EnumDef {
    pub(crate) underlying_type: NumberType,
    pub(crate) evalues: RwLock<BTreeMap<String, Evalue>>,
}

impl EnumDef {
    /// Definition for the enum `E`, resolving its underlying type.
    pub fn new<E: ReflectEnum>(registry: &TypeRegistry) -> Self {
        EnumDef {
            underlying_type: registry.resolve_number::<E::Underlying>(),
            evalues: RwLock::new(BTreeMap::new()),
        }
    }
}

super::type_view! {
    /// Descriptor of a fieldless enum.
    EnumType, Enum, EnumDef, as_enum, is_enum
}

impl EnumType {
    /// Descriptor of the underlying integer type.
    pub fn underlying_type(self) -> NumberType {
        self.def.underlying_type
    }

    /// All registered constants, ordered by name.
    pub fn evalues(self) -> Vec<Evalue> {
        self.def.evalues.read().values().cloned().collect()
    }

    /// The constant called `name`, or an empty handle.
    pub fn get_evalue(self, name: &str) -> Evalue {
        self.def.evalues.read().get(name).cloned().unwrap_or_default()
    }

    /// The name of the constant whose underlying value equals `value`'s.
    pub fn value_to_name<E: ReflectEnum>(self, value: E) -> Option<String> {
        let number = value.to_underlying().to_number();
        self.def
            .evalues
            .read()
            .iter()
            .find(|(_, evalue)| evalue.underlying_number() == number)
            .map(|(name, _)| name.clone())
    }

    /// A copy of the value of the constant called `name`.
    pub fn name_to_value(self, name: &str) -> Option<UValue> {
        let evalue = self.get_evalue(name);
        evalue.is_valid().then(|| evalue.get_value().clone())
    }

    /// Adds a constant; a constant with the same name is replaced.
    pub fn add_evalue(self, evalue: Evalue) -> Result<(), RegistrationError> {
        let (owner, name) = match evalue.try_index() {
            Some(index) => (index.get_type(), index.get_name().to_owned()),
            None => return Err(RegistrationError::EmptyHandle),
        };
        if owner != self {
            return Err(RegistrationError::OwnerMismatch {
                entity: name,
                owner: owner.name(),
                target: self.name(),
            });
        }

        if self.def.evalues.write().insert(name.clone(), evalue).is_some() {
            debug!("{}: replaced evalue {}", self.name(), name);
        }
        Ok(())
    }
}
