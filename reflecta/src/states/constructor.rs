use alloc::boxed::Box;
use alloc::sync::Arc;

use smallvec::SmallVec;

use super::argument::Argument;
use crate::uarg::{check_arguments, source_uargs};
use crate::{
    AnyType, ArgSource, ArgTypes, BindOpts, ConstructorIndex, ConstructorPolicy,
    ConstructorSig, ConstructorType, ErrorCode, IntoArgs, IntoFunction, Metadata,
    RegistrationError, Result, TypeRegistry, UArg, UArgBase, UValue, trace,
};

type CreateFn = Box<dyn Fn(&[UArg<'_>]) -> Result<UValue> + Send + Sync>;
type CreateAtFn = Box<dyn Fn(*mut u8, &[UArg<'_>]) -> Result<UValue> + Send + Sync>;

pub(crate) struct ConstructorState {
    index: ConstructorIndex,
    metadata: Metadata,
    arguments: Vec<Argument>,
    registry: TypeRegistry,
    create: CreateFn,
    create_at: CreateAtFn,
}

super::handle! {
    /// A constructor: builds an instance of its class from arguments.
    ///
    /// ```
    /// use reflecta::{Constructor, TypeRegistry};
    ///
    /// #[derive(Clone)]
    /// struct Point {
    ///     x: i32,
    ///     y: i32,
    /// }
    /// reflecta::reflect_class!(Point: Clone);
    ///
    /// let registry = TypeRegistry::new();
    /// let new = Constructor::new(&registry, |x: i32, y: i32| Point { x, y }).unwrap();
    ///
    /// let point = new.create((2, 3));
    /// assert_eq!(point.get_as::<Point>().unwrap().y, 3);
    /// ```
    Constructor, ConstructorState, ConstructorIndex
}

impl Constructor {
    /// Registers `f`, whose return type is the constructed class, with the
    /// default policy.
    pub fn new<F, Args>(registry: &TypeRegistry, f: F) -> Result<Self, RegistrationError>
    where
        F: IntoFunction<Args>,
    {
        Self::with_opts(registry, f, BindOpts::new())
    }

    /// Registers `f`, whose return type is the constructed class.
    pub fn with_opts<F, Args>(
        registry: &TypeRegistry,
        f: F,
        opts: BindOpts<ConstructorPolicy>,
    ) -> Result<Self, RegistrationError>
    where
        F: IntoFunction<Args>,
    {
        let Some(ty) = registry
            .resolve::<ConstructorSig<F::Return, F::Params>>()
            .as_constructor()
        else {
            unreachable!("constructor signatures describe themselves as constructors")
        };
        let shape = opts.chosen_policy().compile::<F::Return>()?;
        let arguments = super::make_arguments(ty.argument_types(), opts.arguments)?;

        let params = ty.argument_types();
        let f = Arc::new(f);
        let create: CreateFn = {
            let f = f.clone();
            Box::new(move |args| f.call(params, args).map(shape))
        };
        let create_at: CreateAtFn = Box::new(move |mem, args| {
            let object = f.call(params, args)?;
            let ptr = mem.cast::<F::Return>();
            unsafe { ptr.write(object) };
            Ok(UValue::new(ptr))
        });

        trace!("registered constructor {}", ty.name());
        Ok(Constructor::from_state(ConstructorState {
            index: ConstructorIndex::new(ty),
            metadata: opts.metadata,
            arguments,
            registry: registry.clone(),
            create,
            create_at,
        }))
    }

    /// Descriptor of the signature.
    pub fn get_type(&self) -> ConstructorType {
        self.get_index().get_type()
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

    pub(crate) fn check_sources(&self, sources: &[ArgSource<'_>]) -> Result<()> {
        super::check_sources(self.params(), sources, &self.state().registry)
    }

    pub(crate) fn create_from_sources(&self, sources: &[ArgSource<'_>]) -> Result<UValue> {
        let state = self.state();
        let uargs = source_uargs(sources, &state.registry);
        (state.create)(&uargs)
    }

    /// # Safety
    ///
    /// See [`Self::create_at`].
    pub(crate) unsafe fn create_at_from_sources(
        &self,
        mem: *mut u8,
        sources: &[ArgSource<'_>],
    ) -> Result<UValue> {
        let state = self.state();
        let uargs = source_uargs(sources, &state.registry);
        (state.create_at)(mem, &uargs)
    }

    /// Creates an instance, shaped by the constructor's policy.
    ///
    /// # Panics
    ///
    /// Panics if the arguments do not fit the signature.
    pub fn create<'a>(&self, args: impl IntoArgs<'a>) -> UValue {
        match self.create_from_sources(&args.into_sources()) {
            Ok(value) => value,
            Err(err) => panic!("invalid call of constructor {}: {err}", self.get_type().name()),
        }
    }

    /// Checks the arguments, then creates an instance.
    pub fn try_create<'a>(&self, args: impl IntoArgs<'a>) -> Result<UValue> {
        let sources = args.into_sources();
        if let Err(err) = self.check_sources(&sources) {
            trace!("rejected call of constructor {}: {err}", self.get_type().name());
            return Err(err);
        }
        self.create_from_sources(&sources)
    }

    /// Constructs an instance in `mem`, whatever the policy, and returns a
    /// `*mut` pointer to it.
    ///
    /// # Safety
    ///
    /// `mem` must be valid for writes of the class's size and aligned to its
    /// alignment. The instance must later be dropped, e.g. with
    /// [`crate::Destructor::destroy_at`].
    ///
    /// # Panics
    ///
    /// Panics if the arguments do not fit the signature.
    pub unsafe fn create_at<'a>(&self, mem: *mut u8, args: impl IntoArgs<'a>) -> UValue {
        match unsafe { self.create_at_from_sources(mem, &args.into_sources()) } {
            Ok(value) => value,
            Err(err) => panic!("invalid call of constructor {}: {err}", self.get_type().name()),
        }
    }

    /// Checks the arguments, then constructs an instance in `mem`.
    ///
    /// # Safety
    ///
    /// See [`Self::create_at`].
    pub unsafe fn try_create_at<'a>(&self, mem: *mut u8, args: impl IntoArgs<'a>) -> Result<UValue> {
        let sources = args.into_sources();
        self.check_sources(&sources)?;
        unsafe { self.create_at_from_sources(mem, &sources) }
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
        ErrorCode::of(&self.check_sources(&args.into_sources()))
    }
}
