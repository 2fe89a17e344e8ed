use crate::{
    AnyType, DestructorIndex, DestructorSig, DestructorType, Error, ErrorCode, IntoUArg,
    Metadata, RefKind, Reflect, Result, TypeRegistry, UArg, UArgBase, trace,
};

pub(crate) struct DestructorState {
    index: DestructorIndex,
    metadata: Metadata,
    registry: TypeRegistry,
    pointer_type: AnyType,
    destroy: unsafe fn(*mut u8),
    destroy_at: unsafe fn(*mut u8),
}

super::handle! {
    /// The destructor of a class: drops instances created by a constructor.
    Destructor, DestructorState, DestructorIndex
}

/// Reads the pointer held by `arg` when it is exactly a `pointer_type`.
///
/// A pointer to a derived class is refused: its base part does not start
/// the `Box` allocation being released.
fn extract_pointer(arg: &UArg<'_>, pointer_type: AnyType) -> Option<*mut u8> {
    if arg.base().get_type() != Some(pointer_type) {
        return None;
    }
    Some(unsafe { arg.data().cast::<*mut u8>().read() })
}

unsafe fn destroy_boxed<C>(object: *mut u8) {
    drop(unsafe { Box::from_raw(object.cast::<C>()) });
}

unsafe fn destroy_in_place<C>(object: *mut u8) {
    unsafe { core::ptr::drop_in_place(object.cast::<C>()) };
}

impl Destructor {
    /// Registers the destructor of `C`.
    pub fn new<C: Reflect>(registry: &TypeRegistry) -> Self {
        Self::with_metadata::<C>(registry, Metadata::new())
    }

    /// Registers the destructor of `C` with metadata attached.
    pub fn with_metadata<C: Reflect>(registry: &TypeRegistry, metadata: Metadata) -> Self {
        let Some(ty) = registry.resolve::<DestructorSig<C>>().as_destructor() else {
            unreachable!("destructor signatures describe themselves as destructors")
        };
        trace!("registered destructor {}", ty.name());
        Destructor::from_state(DestructorState {
            index: DestructorIndex::new(ty),
            metadata,
            registry: registry.clone(),
            pointer_type: registry.resolve::<*mut C>(),
            destroy: destroy_boxed::<C>,
            destroy_at: destroy_in_place::<C>,
        })
    }

    /// Descriptor of the destructor.
    pub fn get_type(&self) -> DestructorType {
        self.get_index().get_type()
    }

    fn check(&self, arg: &UArgBase) -> Result<()> {
        if arg.get_type() == Some(self.state().pointer_type) {
            Ok(())
        } else {
            Err(Error::ArgumentTypeMismatch { position: 0 })
        }
    }

    fn pointer<'a>(&self, arg: impl IntoUArg<'a>) -> Result<*mut u8> {
        let state = self.state();
        let source = arg.into_source();
        let pointer = extract_pointer(&source.uarg(&state.registry), state.pointer_type)
            .ok_or(Error::ArgumentTypeMismatch { position: 0 })?;
        if pointer.is_null() {
            return Err(Error::BadInstanceCast);
        }
        Ok(pointer)
    }

    /// Drops and frees an instance created with the raw-pointer constructor
    /// policy; `arg` holds the `*mut C`.
    ///
    /// # Safety
    ///
    /// The pointer must come from a `Box<C>`, for example a constructor with
    /// [`crate::ConstructorPolicy::AsRawPointer`], and must not be used
    /// afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `arg` is not a non-null `*mut C`. Pointers to derived
    /// classes and `*const C` are refused.
    pub unsafe fn destroy<'a>(&self, arg: impl IntoUArg<'a>) {
        match self.pointer(arg) {
            Ok(pointer) => unsafe { (self.state().destroy)(pointer) },
            Err(err) => panic!("invalid call of destructor {}: {err}", self.get_type().name()),
        }
    }

    /// Like [`Self::destroy`], failing instead of panicking.
    ///
    /// # Safety
    ///
    /// See [`Self::destroy`].
    pub unsafe fn try_destroy<'a>(&self, arg: impl IntoUArg<'a>) -> Result<()> {
        let pointer = self.pointer(arg)?;
        unsafe { (self.state().destroy)(pointer) };
        Ok(())
    }

    /// Drops the instance living at `mem` without freeing the memory.
    ///
    /// # Safety
    ///
    /// `mem` must hold a live `C`, for example one placed by
    /// [`crate::Constructor::create_at`], which must not be used afterwards.
    pub unsafe fn destroy_at(&self, mem: *mut u8) {
        unsafe { (self.state().destroy_at)(mem) };
    }

    /// Returns `true` if a value of type `P` is accepted by
    /// [`Self::destroy`].
    pub fn is_invocable_with<P: Reflect>(&self) -> bool {
        self.check_invocable_error::<P>().is_ok()
    }

    /// Classifies a call of [`Self::destroy`] with a value of type `P`.
    pub fn check_invocable_error<P: Reflect>(&self) -> ErrorCode {
        let registry = &self.state().registry;
        ErrorCode::of(&self.check(&UArgBase::new(registry.resolve::<P>(), RefKind::Owned)))
    }
}
