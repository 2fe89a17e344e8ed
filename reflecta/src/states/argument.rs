use crate::{AnyType, ArgumentIndex, Metadata};

pub(crate) struct ArgumentState {
    index: ArgumentIndex,
    name: String,
    metadata: Metadata,
}

super::handle! {
    /// A parameter of a function, method or constructor.
    Argument, ArgumentState, ArgumentIndex
}

impl Argument {
    pub(crate) fn new(index: ArgumentIndex, name: String, metadata: Metadata) -> Self {
        Argument::from_state(ArgumentState {
            index,
            name,
            metadata,
        })
    }

    /// Descriptor of the parameter type.
    pub fn get_type(&self) -> AnyType {
        self.get_index().get_type()
    }

    /// Zero-based position.
    pub fn get_position(&self) -> usize {
        self.get_index().get_position()
    }

    /// Name given at registration; empty when none was given.
    pub fn get_name(&self) -> &str {
        &self.state().name
    }
}
