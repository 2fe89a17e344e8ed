use alloc::boxed::Box;

use parking_lot::RwLock;

use crate::policy::AccessFns;
use crate::{
    BindOpts, Error, ErrorCode, IntoUArg, Metadata, PointerType, RefKind, Reflect,
    RegistrationError, Result, TypeRegistry, UArg, UArgBase, UValue, VariableIndex,
    VariablePolicy, trace,
};

type GetFn = Box<dyn Fn() -> UValue + Send + Sync>;
type SetFn = Box<dyn Fn(&UArg<'_>) -> Result<()> + Send + Sync>;

pub(crate) struct VariableState {
    index: VariableIndex,
    metadata: Metadata,
    registry: TypeRegistry,
    getter: GetFn,
    setter: Option<SetFn>,
}

super::handle! {
    /// A global or associated variable.
    ///
    /// Read-only variables wrap a `&'static V`; writable ones a
    /// `&'static RwLock<V>`, which readers and writers lock for the duration
    /// of a copy.
    ///
    /// ```
    /// use parking_lot::RwLock;
    /// use reflecta::{TypeRegistry, Variable};
    ///
    /// static COUNTER: RwLock<i64> = RwLock::new(0);
    ///
    /// let registry = TypeRegistry::new();
    /// let counter = Variable::new(&registry, "counter", &COUNTER).unwrap();
    ///
    /// counter.set(41_i32);
    /// assert_eq!(counter.get().get_as::<i64>(), Ok(&41));
    /// assert_eq!(*COUNTER.read(), 41);
    /// ```
    Variable, VariableState, VariableIndex
}

impl Variable {
    /// Registers a writable variable with the default policy.
    pub fn new<V>(
        registry: &TypeRegistry,
        name: &str,
        variable: &'static RwLock<V>,
    ) -> Result<Self, RegistrationError>
    where
        V: Reflect + Clone + Send + Sync,
    {
        Self::with_opts(registry, name, variable, BindOpts::new())
    }

    /// Registers a writable variable.
    pub fn with_opts<V>(
        registry: &TypeRegistry,
        name: &str,
        variable: &'static RwLock<V>,
        opts: BindOpts<VariablePolicy>,
    ) -> Result<Self, RegistrationError>
    where
        V: Reflect + Clone + Send + Sync,
    {
        let ty = Self::resolve::<*mut V>(registry);
        let policy = opts.chosen_policy();
        let access = policy.compile::<V>()?;

        let getter: GetFn = match policy {
            VariablePolicy::AsCopy => Box::new(move || {
                let guard = variable.read();
                unsafe { (access.shared)((&*guard as *const V).cast()) }
            }),
            _ => Box::new(move || unsafe { (access.exclusive)(variable.data_ptr().cast()) }),
        };

        let value_type = registry.resolve::<V>();
        let setter: SetFn = Box::new(move |arg| {
            let value = arg
                .cast_with::<V>(value_type)
                .ok_or(Error::ArgumentTypeMismatch { position: 0 })?;
            *variable.write() = value;
            Ok(())
        });

        Ok(Self::build(registry, name, ty, opts.metadata, getter, Some(setter)))
    }

    /// Registers a read-only variable with the default policy.
    pub fn readonly<V>(
        registry: &TypeRegistry,
        name: &str,
        variable: &'static V,
    ) -> Result<Self, RegistrationError>
    where
        V: Reflect + Sync,
    {
        Self::readonly_with_opts(registry, name, variable, BindOpts::new())
    }

    /// Registers a read-only variable.
    pub fn readonly_with_opts<V>(
        registry: &TypeRegistry,
        name: &str,
        variable: &'static V,
        opts: BindOpts<VariablePolicy>,
    ) -> Result<Self, RegistrationError>
    where
        V: Reflect + Sync,
    {
        let ty = Self::resolve::<*const V>(registry);
        let access: AccessFns = opts.chosen_policy().compile::<V>()?;
        let getter: GetFn =
            Box::new(move || unsafe { (access.shared)((variable as *const V).cast()) });
        Ok(Self::build(registry, name, ty, opts.metadata, getter, None))
    }

    fn resolve<P: Reflect>(registry: &TypeRegistry) -> PointerType {
        match registry.resolve::<P>().as_pointer() {
            Some(ty) => ty,
            None => unreachable!("raw pointers describe themselves as pointers"),
        }
    }

    fn build(
        registry: &TypeRegistry,
        name: &str,
        ty: PointerType,
        metadata: Metadata,
        getter: GetFn,
        setter: Option<SetFn>,
    ) -> Self {
        trace!("registered variable {name}: {}", ty.name());
        Variable::from_state(VariableState {
            index: VariableIndex::new(ty, name),
            metadata,
            registry: registry.clone(),
            getter,
            setter,
        })
    }

    /// Pointer descriptor: `*const V` when read-only, `*mut V` otherwise.
    pub fn get_type(&self) -> PointerType {
        self.get_index().get_type()
    }

    /// Name the variable was registered under.
    pub fn get_name(&self) -> &str {
        self.get_index().get_name()
    }

    /// Returns `true` for variables registered with [`Self::readonly`].
    pub fn is_readonly(&self) -> bool {
        self.get_type().is_readonly()
    }

    /// Reads the variable, shaped by its policy.
    pub fn get(&self) -> UValue {
        (self.state().getter)()
    }

    fn check(&self, arg: &UArgBase) -> Result<()> {
        let ty = self.get_type();
        if ty.is_readonly() {
            return Err(Error::BadConstAccess);
        }
        if !arg.can_cast_to_type(ty.data_type()) {
            return Err(Error::ArgumentTypeMismatch { position: 0 });
        }
        Ok(())
    }

    fn write<'a>(&self, value: impl IntoUArg<'a>, checked: bool) -> Result<()> {
        let state = self.state();
        let source = value.into_source();
        if checked {
            if let Err(err) = self.check(&source.base(&state.registry)) {
                trace!("rejected write of variable {}: {err}", self.get_name());
                return Err(err);
            }
        }
        let setter = state.setter.as_ref().ok_or(Error::BadConstAccess)?;
        setter(&source.uarg(&state.registry))
    }

    /// Assigns `value`.
    ///
    /// # Panics
    ///
    /// Panics if the variable is read-only or the value does not convert.
    pub fn set<'a>(&self, value: impl IntoUArg<'a>) {
        if let Err(err) = self.write(value, false) {
            panic!("invalid write of variable {}: {err}", self.get_name());
        }
    }

    /// Checks the value, then assigns.
    pub fn try_set<'a>(&self, value: impl IntoUArg<'a>) -> Result<()> {
        self.write(value, true)
    }

    /// Returns `true` if a value of type `T` can be assigned.
    pub fn is_settable_with<T: Reflect>(&self) -> bool {
        self.check_settable_error::<T>().is_ok()
    }

    /// Classifies an assignment of a `T`.
    pub fn check_settable_error<T: Reflect>(&self) -> ErrorCode {
        let registry = &self.state().registry;
        ErrorCode::of(&self.check(&UArgBase::new(registry.resolve::<T>(), RefKind::Owned)))
    }

    /// Returns `true` if `value` can be assigned.
    pub fn is_settable_with_args<'a>(&self, value: impl IntoUArg<'a>) -> bool {
        let source = value.into_source();
        self.check(&source.base(&self.state().registry)).is_ok()
    }
}
