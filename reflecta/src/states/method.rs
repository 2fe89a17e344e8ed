use alloc::boxed::Box;

use smallvec::SmallVec;

use super::argument::Argument;
use crate::uarg::{check_arguments, source_uargs};
use crate::{
    AnyType, ArgTypes, BindOpts, Error, ErrorCode, InstanceType, IntoArgs, IntoMethod,
    IntoUInst, Metadata, MethodIndex, MethodPolicy, MethodSig, MethodType, RegistrationError,
    Result, TypeRegistry, UArg, UArgBase, UInstBase, UValue, trace,
};

type InvokeFn = Box<dyn Fn(*mut u8, &[UArg<'_>]) -> Result<UValue> + Send + Sync>;

pub(crate) struct MethodState {
    index: MethodIndex,
    metadata: Metadata,
    arguments: Vec<Argument>,
    registry: TypeRegistry,
    invoke: InvokeFn,
}

super::handle! {
    /// A method: a function called on an instance of its owner type or of
    /// a class deriving from it.
    Method, MethodState, MethodIndex
}

impl Method {
    /// Registers `f` under `name` with the default policy.
    ///
    /// Closures taking `&C` become const methods, closures taking `&mut C`
    /// mutable ones.
    pub fn new<F, Marker>(registry: &TypeRegistry, name: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: IntoMethod<Marker>,
    {
        Self::with_opts(registry, name, f, BindOpts::new())
    }

    /// Registers `f` under `name`.
    pub fn with_opts<F, Marker>(
        registry: &TypeRegistry,
        name: &str,
        f: F,
        opts: BindOpts<MethodPolicy>,
    ) -> Result<Self, RegistrationError>
    where
        F: IntoMethod<Marker>,
    {
        let sig = registry.resolve::<MethodSig<F::Owner, F::Params, F::Return, F::Receiver>>();
        let Some(ty) = sig.as_method() else {
            unreachable!("method signatures describe themselves as methods")
        };
        let ret = F::compile_return(opts.chosen_policy())?;
        let arguments = super::make_arguments(ty.argument_types(), opts.arguments)?;

        let params = ty.argument_types();
        let invoke: InvokeFn = Box::new(move |object, args| {
            // the receiver outlives the closure call, so borrowed returns
            // are still valid when `ret` reads them
            unsafe { f.call(object, params, args).map(|out| ret(out)) }
        });

        trace!(
            "registered method {name} of {}: {}",
            ty.owner_type().name(),
            ty.name()
        );
        Ok(Method::from_state(MethodState {
            index: MethodIndex::new(ty, name),
            metadata: opts.metadata,
            arguments,
            registry: registry.clone(),
            invoke,
        }))
    }

    /// Descriptor of the signature.
    pub fn get_type(&self) -> MethodType {
        self.get_index().get_type()
    }

    /// Name the method was registered under.
    pub fn get_name(&self) -> &str {
        self.get_index().get_name()
    }

    /// Number of parameters, not counting the receiver.
    pub fn arity(&self) -> usize {
        self.get_type().arity()
    }

    /// Parameter handles, in order.
    pub fn get_arguments(&self) -> &[Argument] {
        &self.state().arguments
    }

    /// The parameter at `position`, or an empty handle.
    pub fn get_argument(&self, position: usize) -> Argument {
        self.state()
            .arguments
            .get(position)
            .cloned()
            .unwrap_or_default()
    }

    fn params(&self) -> &'static [AnyType] {
        self.get_type().argument_types()
    }

    /// Arity first, then the instance, then each argument.
    fn check(&self, inst: &UInstBase, args: &[UArgBase]) -> Result<()> {
        let ty = self.get_type();
        if args.len() != ty.arity() {
            return Err(Error::ArityMismatch {
                expected: ty.arity(),
                actual: args.len(),
            });
        }
        inst.check(ty.owner_type(), !ty.is_const())?;
        check_arguments(self.params(), args)
    }

    fn call<'a, 'b>(
        &self,
        instance: impl IntoUInst<'a>,
        args: impl IntoArgs<'b>,
        checked: bool,
    ) -> Result<UValue> {
        let state = self.state();
        let ty = self.get_type();
        let mut inst = instance.into_uinst();
        let sources = args.into_sources();

        if checked {
            let bases: SmallVec<[UArgBase; 4]> =
                sources.iter().map(|source| source.base(&state.registry)).collect();
            if let Err(err) = self.check(&inst.base(&state.registry), &bases) {
                trace!("rejected call of method {}: {err}", self.get_name());
                return Err(err);
            }
        }

        let object = inst.object_ptr(&state.registry, ty.owner_type(), !ty.is_const())?;
        let uargs = source_uargs(&sources, &state.registry);
        (state.invoke)(object, &uargs)
    }

    /// Calls the method on `instance`.
    ///
    /// # Panics
    ///
    /// Panics if the instance or the arguments do not fit the signature;
    /// see [`Self::try_invoke`] for the checked variant.
    pub fn invoke<'a, 'b>(&self, instance: impl IntoUInst<'a>, args: impl IntoArgs<'b>) -> UValue {
        match self.call(instance, args, false) {
            Ok(value) => value,
            Err(err) => panic!("invalid call of method {}: {err}", self.get_name()),
        }
    }

    /// Checks the instance and the arguments, then calls the method.
    pub fn try_invoke<'a, 'b>(
        &self,
        instance: impl IntoUInst<'a>,
        args: impl IntoArgs<'b>,
    ) -> Result<UValue> {
        self.call(instance, args, true)
    }

    /// Returns `true` if an instance of type `I` with arguments of types
    /// `A` would be accepted.
    pub fn is_invocable_with<I: InstanceType, A: ArgTypes>(&self) -> bool {
        self.check_invocable_error::<I, A>().is_ok()
    }

    /// Classifies a call on an instance of type `I` with arguments of types
    /// `A`.
    pub fn check_invocable_error<I: InstanceType, A: ArgTypes>(&self) -> ErrorCode {
        let registry = &self.state().registry;
        ErrorCode::of(&self.check(&I::base(registry), &A::bases(registry)))
    }

    /// Returns `true` if `instance` and `args` would be accepted.
    pub fn is_invocable_with_args<'a, 'b>(
        &self,
        instance: impl IntoUInst<'a>,
        args: impl IntoArgs<'b>,
    ) -> bool {
        self.check_invocable_error_with_args(instance, args).is_ok()
    }

    /// Classifies a call on `instance` with `args`.
    pub fn check_invocable_error_with_args<'a, 'b>(
        &self,
        instance: impl IntoUInst<'a>,
        args: impl IntoArgs<'b>,
    ) -> ErrorCode {
        let registry = &self.state().registry;
        let inst = instance.into_uinst();
        let sources = args.into_sources();
        let bases: SmallVec<[UArgBase; 4]> =
            sources.iter().map(|source| source.base(registry)).collect();
        ErrorCode::of(&self.check(&inst.base(registry), &bases))
    }
}
