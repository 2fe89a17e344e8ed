use alloc::collections::BTreeMap;
use core::fmt::Debug;

use parking_lot::RwLock;

use crate::cast::arguments_compatible;
use crate::{
    AnyType, Function, FunctionIndex, Metadata, RegistrationError, ScopeIndex, Variable,
    VariableIndex, debug, trace,
};

pub(crate) struct ScopeState {
    index: ScopeIndex,
    metadata: Metadata,
    functions: RwLock<BTreeMap<FunctionIndex, Function>>,
    variables: RwLock<BTreeMap<VariableIndex, Variable>>,
    typedefs: RwLock<BTreeMap<String, AnyType>>,
}

super::handle! {
    /// A named container of functions, variables and type aliases.
    ///
    /// Scopes are filled in after creation; every clone of a handle sees the
    /// same content. Adding an entity whose index is already present
    /// replaces the previous one.
    ///
    /// ```
    /// use reflecta::{Function, Scope, TypeRegistry};
    ///
    /// let registry = TypeRegistry::new();
    /// let math = Scope::new("math");
    /// math.add_function(Function::new(&registry, "abs", |x: i64| x.abs()).unwrap())
    ///     .unwrap();
    ///
    /// let abs = math.get_function_with("abs", &[registry.resolve::<i32>()]);
    /// assert_eq!(abs.invoke((-3_i32,)).get_as::<i64>(), Ok(&3));
    /// ```
    Scope, ScopeState, ScopeIndex
}

fn insert<K: Ord + Debug, V>(scope: &str, map: &RwLock<BTreeMap<K, V>>, key: K, value: V) {
    let mut map = map.write();
    if map.contains_key(&key) {
        debug!("scope {scope}: replacing {key:?}");
    } else {
        trace!("scope {scope}: adding {key:?}");
    }
    map.insert(key, value);
}

impl Scope {
    /// An empty scope called `name`.
    pub fn new(name: &str) -> Self {
        Self::with_metadata(name, Metadata::new())
    }

    /// An empty scope called `name` with metadata attached.
    pub fn with_metadata(name: &str, metadata: Metadata) -> Self {
        Scope::from_state(ScopeState {
            index: ScopeIndex::new(name),
            metadata,
            functions: RwLock::new(BTreeMap::new()),
            variables: RwLock::new(BTreeMap::new()),
            typedefs: RwLock::new(BTreeMap::new()),
        })
    }

    /// Name of the scope.
    pub fn get_name(&self) -> &str {
        self.get_index().get_name()
    }

    /// Adds a function; one with the same name and signature is replaced.
    pub fn add_function(&self, function: Function) -> Result<(), RegistrationError> {
        let index = function.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        insert(self.get_name(), &self.state().functions, index, function);
        Ok(())
    }

    /// Adds a variable; one with the same name and type is replaced.
    pub fn add_variable(&self, variable: Variable) -> Result<(), RegistrationError> {
        let index = variable.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        insert(self.get_name(), &self.state().variables, index, variable);
        Ok(())
    }

    /// Adds the alias `name` for `ty`, replacing any previous alias.
    pub fn add_typedef(&self, name: &str, ty: AnyType) {
        insert(self.get_name(), &self.state().typedefs, name.to_owned(), ty);
    }

    /// Functions, ordered by index.
    pub fn functions(&self) -> Vec<Function> {
        self.state().functions.read().values().cloned().collect()
    }

    /// Variables, ordered by index.
    pub fn variables(&self) -> Vec<Variable> {
        self.state().variables.read().values().cloned().collect()
    }

    /// Type aliases, ordered by name.
    pub fn typedefs(&self) -> Vec<(String, AnyType)> {
        self.state()
            .typedefs
            .read()
            .iter()
            .map(|(name, &ty)| (name.clone(), ty))
            .collect()
    }

    /// The first function called `name`, or an empty handle.
    pub fn get_function(&self, name: &str) -> Function {
        self.state()
            .functions
            .read()
            .iter()
            .find(|(index, _)| index.get_name() == name)
            .map(|(_, function)| function.clone())
            .unwrap_or_default()
    }

    /// The first function called `name` accepting arguments of the given
    /// types, or an empty handle.
    pub fn get_function_with(&self, name: &str, argument_types: &[AnyType]) -> Function {
        self.state()
            .functions
            .read()
            .iter()
            .find(|(index, _)| {
                index.get_name() == name
                    && arguments_compatible(argument_types, index.get_type().argument_types())
            })
            .map(|(_, function)| function.clone())
            .unwrap_or_default()
    }

    /// The first variable called `name`, or an empty handle.
    pub fn get_variable(&self, name: &str) -> Variable {
        self.state()
            .variables
            .read()
            .iter()
            .find(|(index, _)| index.get_name() == name)
            .map(|(_, variable)| variable.clone())
            .unwrap_or_default()
    }

    /// The type aliased as `name`.
    pub fn get_typedef(&self, name: &str) -> Option<AnyType> {
        self.state().typedefs.read().get(name).copied()
    }

    /// Copies every entry of `other` into this scope, replacing entries with
    /// the same index.
    pub fn merge(&self, other: &Scope) {
        for function in other.functions() {
            if let Some(index) = function.try_index().cloned() {
                insert(self.get_name(), &self.state().functions, index, function);
            }
        }
        for variable in other.variables() {
            if let Some(index) = variable.try_index().cloned() {
                insert(self.get_name(), &self.state().variables, index, variable);
            }
        }
        for (name, ty) in other.typedefs() {
            insert(self.get_name(), &self.state().typedefs, name, ty);
        }
    }
}
