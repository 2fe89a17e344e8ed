use alloc::boxed::Box;

use crate::policy::AccessFns;
use crate::{
    Access, BindOpts, Error, ErrorCode, InstanceType, IntoUArg, IntoUInst, MemberIndex,
    MemberPolicy, MemberSig, MemberType, Metadata, ReadOnly, ReadWrite, RefKind, Reflect,
    RegistrationError, Result, TypeRegistry, UArg, UArgBase, UInstBase, UValue, trace,
};

type GetFn = Box<dyn Fn(*mut u8, bool) -> UValue + Send + Sync>;
type SetFn = Box<dyn Fn(*mut u8, &UArg<'_>) -> Result<()> + Send + Sync>;

pub(crate) struct MemberState {
    index: MemberIndex,
    metadata: Metadata,
    registry: TypeRegistry,
    getter: GetFn,
    setter: Option<SetFn>,
}

super::handle! {
    /// A member: a field of its owner type reached through accessor
    /// functions.
    ///
    /// ```
    /// use reflecta::{Member, TypeRegistry};
    ///
    /// #[derive(Clone)]
    /// struct Point {
    ///     x: i32,
    /// }
    /// reflecta::reflect_class!(Point: Clone);
    ///
    /// let registry = TypeRegistry::new();
    /// let x = Member::new(&registry, "x", |p: &Point| &p.x, |p: &mut Point| &mut p.x).unwrap();
    ///
    /// let mut point = Point { x: 1 };
    /// x.set(&mut point, 5);
    /// assert_eq!(x.get(&point).get_as::<i32>(), Ok(&5));
    /// ```
    Member, MemberState, MemberIndex
}

fn getter<C: 'static, V: 'static>(
    get: fn(&C) -> &V,
    get_mut: Option<fn(&mut C) -> &mut V>,
    access: AccessFns,
) -> GetFn {
    Box::new(move |object, exclusive| match (exclusive, get_mut) {
        (true, Some(get_mut)) => {
            let value = get_mut(unsafe { &mut *object.cast::<C>() });
            unsafe { (access.exclusive)((value as *mut V).cast()) }
        }
        _ => {
            let value = get(unsafe { &*object.cast::<C>() });
            unsafe { (access.shared)((value as *const V).cast()) }
        }
    })
}

impl Member {
    /// Registers a read-write member with the default policy.
    pub fn new<C, V>(
        registry: &TypeRegistry,
        name: &str,
        get: fn(&C) -> &V,
        get_mut: fn(&mut C) -> &mut V,
    ) -> Result<Self, RegistrationError>
    where
        C: Reflect,
        V: Reflect + Clone,
    {
        Self::with_opts(registry, name, get, get_mut, BindOpts::new())
    }

    /// Registers a read-write member.
    pub fn with_opts<C, V>(
        registry: &TypeRegistry,
        name: &str,
        get: fn(&C) -> &V,
        get_mut: fn(&mut C) -> &mut V,
        opts: BindOpts<MemberPolicy>,
    ) -> Result<Self, RegistrationError>
    where
        C: Reflect,
        V: Reflect + Clone,
    {
        let ty = Self::resolve::<C, V, ReadWrite>(registry);
        let value_type = ty.value_type();
        let setter: SetFn = Box::new(move |object, arg| {
            let value = arg
                .cast_with::<V>(value_type)
                .ok_or(Error::ArgumentTypeMismatch { position: 0 })?;
            *get_mut(unsafe { &mut *object.cast::<C>() }) = value;
            Ok(())
        });
        let access = opts.chosen_policy().compile::<V>()?;
        Ok(Self::build(
            registry,
            name,
            ty,
            opts.metadata,
            getter(get, Some(get_mut), access),
            Some(setter),
        ))
    }

    /// Registers a read-only member with the default policy.
    pub fn readonly<C, V>(
        registry: &TypeRegistry,
        name: &str,
        get: fn(&C) -> &V,
    ) -> Result<Self, RegistrationError>
    where
        C: Reflect,
        V: Reflect,
    {
        Self::readonly_with_opts(registry, name, get, BindOpts::new())
    }

    /// Registers a read-only member.
    pub fn readonly_with_opts<C, V>(
        registry: &TypeRegistry,
        name: &str,
        get: fn(&C) -> &V,
        opts: BindOpts<MemberPolicy>,
    ) -> Result<Self, RegistrationError>
    where
        C: Reflect,
        V: Reflect,
    {
        let ty = Self::resolve::<C, V, ReadOnly>(registry);
        let access = opts.chosen_policy().compile::<V>()?;
        Ok(Self::build(
            registry,
            name,
            ty,
            opts.metadata,
            getter(get, None, access),
            None,
        ))
    }

    fn resolve<C: Reflect, V: Reflect, A: Access>(registry: &TypeRegistry) -> MemberType {
        match registry.resolve::<MemberSig<C, V, A>>().as_member() {
            Some(ty) => ty,
            None => unreachable!("member signatures describe themselves as members"),
        }
    }

    fn build(
        registry: &TypeRegistry,
        name: &str,
        ty: MemberType,
        metadata: Metadata,
        getter: GetFn,
        setter: Option<SetFn>,
    ) -> Self {
        trace!("registered member {name} of {}: {}", ty.owner_type().name(), ty.name());
        Member::from_state(MemberState {
            index: MemberIndex::new(ty, name),
            metadata,
            registry: registry.clone(),
            getter,
            setter,
        })
    }

    /// Descriptor of the member.
    pub fn get_type(&self) -> MemberType {
        self.get_index().get_type()
    }

    /// Name the member was registered under.
    pub fn get_name(&self) -> &str {
        self.get_index().get_name()
    }

    fn check_get(&self, inst: &UInstBase) -> Result<()> {
        inst.check(self.get_type().owner_type(), false)
            .map_err(|_| Error::BadInstanceCast)
    }

    /// Read-only member first, then const instance, then the instance type,
    /// then the value.
    fn check_set(&self, inst: &UInstBase, arg: &UArgBase) -> Result<()> {
        let ty = self.get_type();
        if ty.is_readonly() || inst.is_inst_const() {
            return Err(Error::BadConstAccess);
        }
        inst.check(ty.owner_type(), true)?;
        if !arg.can_cast_to_type(ty.value_type()) {
            return Err(Error::ArgumentTypeMismatch { position: 0 });
        }
        Ok(())
    }

    fn read<'a>(&self, instance: impl IntoUInst<'a>, checked: bool) -> Result<UValue> {
        let state = self.state();
        let owner = self.get_type().owner_type();
        let mut inst = instance.into_uinst();
        let base = inst.base(&state.registry);
        if checked {
            self.check_get(&base)?;
        }
        let exclusive = !base.is_inst_const();
        let object = inst
            .object_ptr(&state.registry, owner, exclusive)
            .map_err(|_| Error::BadInstanceCast)?;
        Ok((state.getter)(object, exclusive))
    }

    fn write<'a, 'b>(
        &self,
        instance: impl IntoUInst<'a>,
        value: impl IntoUArg<'b>,
        checked: bool,
    ) -> Result<()> {
        let state = self.state();
        let mut inst = instance.into_uinst();
        let source = value.into_source();
        if checked {
            let checked = self.check_set(&inst.base(&state.registry), &source.base(&state.registry));
            if let Err(err) = checked {
                trace!("rejected write of member {}: {err}", self.get_name());
                return Err(err);
            }
        }
        let setter = state.setter.as_ref().ok_or(Error::BadConstAccess)?;
        let object = inst.object_ptr(&state.registry, self.get_type().owner_type(), true)?;
        setter(object, &source.uarg(&state.registry))
    }

    /// Reads the member of `instance`, shaped by the member's policy.
    ///
    /// # Panics
    ///
    /// Panics if `instance` does not lead to an owner object.
    pub fn get<'a>(&self, instance: impl IntoUInst<'a>) -> UValue {
        match self.read(instance, false) {
            Ok(value) => value,
            Err(err) => panic!("invalid read of member {}: {err}", self.get_name()),
        }
    }

    /// Checks the instance, then reads the member.
    pub fn try_get<'a>(&self, instance: impl IntoUInst<'a>) -> Result<UValue> {
        self.read(instance, true)
    }

    /// Assigns `value` to the member of `instance`.
    ///
    /// # Panics
    ///
    /// Panics if the member is read-only, the instance is const or
    /// unrelated, or the value does not convert.
    pub fn set<'a, 'b>(&self, instance: impl IntoUInst<'a>, value: impl IntoUArg<'b>) {
        if let Err(err) = self.write(instance, value, false) {
            panic!("invalid write of member {}: {err}", self.get_name());
        }
    }

    /// Checks the instance and the value, then assigns.
    pub fn try_set<'a, 'b>(
        &self,
        instance: impl IntoUInst<'a>,
        value: impl IntoUArg<'b>,
    ) -> Result<()> {
        self.write(instance, value, true)
    }

    /// Returns `true` if the member can be read through an instance of
    /// type `I`.
    pub fn is_gettable_with<I: InstanceType>(&self) -> bool {
        self.check_get(&I::base(&self.state().registry)).is_ok()
    }

    /// Returns `true` if a value of type `V` can be assigned through an
    /// instance of type `I`.
    pub fn is_settable_with<I: InstanceType, V: Reflect>(&self) -> bool {
        self.check_settable_error::<I, V>().is_ok()
    }

    /// Classifies an assignment of a `V` through an instance of type `I`.
    pub fn check_settable_error<I: InstanceType, V: Reflect>(&self) -> ErrorCode {
        let registry = &self.state().registry;
        let arg = UArgBase::new(registry.resolve::<V>(), RefKind::Owned);
        ErrorCode::of(&self.check_set(&I::base(registry), &arg))
    }
}
