use alloc::boxed::Box;

use smallvec::SmallVec;

use super::argument::Argument;
use crate::uarg::{check_arguments, source_uargs};
use crate::{
    AnyType, ArgTypes, BindOpts, ErrorCode, FunctionIndex, FunctionPolicy,
    FunctionType, IntoArgs, IntoFunction, Metadata, RegistrationError, Result, TypeRegistry,
    UArg, UArgBase, UValue, trace,
};

type InvokeFn = Box<dyn Fn(&[UArg<'_>]) -> Result<UValue> + Send + Sync>;

pub(crate) struct FunctionState {
    index: FunctionIndex,
    metadata: Metadata,
    arguments: Vec<Argument>,
    registry: TypeRegistry,
    invoke: InvokeFn,
}

super::handle! {
    /// A free or associated function.
    ///
    /// ```
    /// use reflecta::{Function, TypeRegistry};
    ///
    /// let registry = TypeRegistry::new();
    /// let add = Function::new(&registry, "add", |a: i32, b: i32| a + b).unwrap();
    ///
    /// assert!(add.is_invocable_with::<(i32, i32)>());
    /// assert_eq!(add.invoke((1, 2)).get_as::<i32>(), Ok(&3));
    /// assert!(add.try_invoke((1,)).is_err());
    /// ```
    Function, FunctionState, FunctionIndex
}

impl Function {
    /// Registers `f` under `name` with the default policy.
    pub fn new<F, Args>(registry: &TypeRegistry, name: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: IntoFunction<Args>,
    {
        Self::with_opts(registry, name, f, BindOpts::new())
    }

    /// Registers `f` under `name`.
    pub fn with_opts<F, Args>(
        registry: &TypeRegistry,
        name: &str,
        f: F,
        opts: BindOpts<FunctionPolicy>,
    ) -> Result<Self, RegistrationError>
    where
        F: IntoFunction<Args>,
    {
        let Some(ty) = registry.resolve::<F::Signature>().as_function() else {
            unreachable!("fn pointer types describe themselves as functions")
        };
        let ret = opts.chosen_policy().compile::<F::Return>()?;
        let arguments = super::make_arguments(ty.argument_types(), opts.arguments)?;

        let params = ty.argument_types();
        let invoke: InvokeFn = Box::new(move |args| f.call(params, args).map(ret));

        trace!("registered function {name}: {}", ty.name());
        Ok(Function::from_state(FunctionState {
            index: FunctionIndex::new(ty, name),
            metadata: opts.metadata,
            arguments,
            registry: registry.clone(),
            invoke,
        }))
    }

    /// Descriptor of the signature.
    pub fn get_type(&self) -> FunctionType {
        self.get_index().get_type()
    }

    /// Name the function was registered under.
    pub fn get_name(&self) -> &str {
        self.get_index().get_name()
    }

    /// Number of parameters.
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

    /// Calls the function.
    ///
    /// # Panics
    ///
    /// Panics if the arguments do not fit the signature; see
    /// [`Self::try_invoke`] for the checked variant.
    pub fn invoke<'a>(&self, args: impl IntoArgs<'a>) -> UValue {
        let state = self.state();
        let sources = args.into_sources();
        let uargs = source_uargs(&sources, &state.registry);
        match (state.invoke)(&uargs) {
            Ok(value) => value,
            Err(err) => panic!("invalid call of function {}: {err}", self.get_name()),
        }
    }

    /// Checks the arguments, then calls the function.
    pub fn try_invoke<'a>(&self, args: impl IntoArgs<'a>) -> Result<UValue> {
        let state = self.state();
        let sources = args.into_sources();
        if let Err(err) = super::check_sources(self.params(), &sources, &state.registry) {
            trace!("rejected call of function {}: {err}", self.get_name());
            return Err(err);
        }
        let uargs = source_uargs(&sources, &state.registry);
        (state.invoke)(&uargs)
    }

    /// Returns `true` if arguments of types `A` would be accepted.
    pub fn is_invocable_with<A: ArgTypes>(&self) -> bool {
        self.check_invocable_error::<A>().is_ok()
    }

    /// Classifies a call with arguments of types `A`.
    pub fn check_invocable_error<A: ArgTypes>(&self) -> ErrorCode {
        let bases: SmallVec<[UArgBase; 4]> = A::bases(&self.state().registry);
        ErrorCode::of(&check_arguments(self.params(), &bases))
    }

    /// Returns `true` if `args` would be accepted.
    pub fn is_invocable_with_args<'a>(&self, args: impl IntoArgs<'a>) -> bool {
        self.check_invocable_error_with_args(args).is_ok()
    }

    /// Classifies a call with `args`.
    pub fn check_invocable_error_with_args<'a>(&self, args: impl IntoArgs<'a>) -> ErrorCode {
        let sources = args.into_sources();
        ErrorCode::of(&super::check_sources(
            self.params(),
            &sources,
            &self.state().registry,
        ))
    }
}
