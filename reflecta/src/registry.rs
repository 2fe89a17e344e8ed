use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::alloc::Layout;
use core::fmt;
use std::sync::LazyLock;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::{
    AnyType, ArgTypes, ClassType, NumberType, Numeric, RegistrationError, Scope, TypeData,
    TypeDef, TypeId, UpcastFns, ValueOps, debug, trace,
};

/// A type that can describe itself to a [`TypeRegistry`].
///
/// `describe` is called at most once per registry, the first time the type
/// is resolved. It may resolve other types (pointees, parameters, generic
/// arguments); the type's own identity already exists at that point.
/// Class descriptions never resolve their members, so a class may refer to
/// itself through pointers.
///
/// Implement it with [`crate::reflect_class!`] or [`crate::reflect_enum!`]
/// rather than by hand.
pub trait Reflect: Sized + 'static {
    /// Operations values of this type support once erased.
    const OPS: ValueOps = ValueOps::new();

    /// What a callable receives for a parameter of this type when the
    /// argument is only borrowed for `'a`. `Self` for values, `&'a T` for
    /// `&'static T`.
    type Param<'a>;

    /// Shortens `self` to the borrow a callable is handed.
    fn into_param<'a>(self) -> Self::Param<'a>;

    /// Builds the kind-specific part of this type's descriptor.
    fn describe(registry: &TypeRegistry) -> TypeDef;
}

/// Projection from a derived class to a base class, registered with
/// [`TypeRegistry::add_base`].
pub trait Upcast<B> {
    /// Borrows the base part.
    fn upcast(&self) -> &B;

    /// Mutably borrows the base part.
    fn upcast_mut(&mut self) -> &mut B;
}

unsafe fn upcast_shared<D: Upcast<B>, B>(ptr: *const u8) -> *const u8 {
    let derived = unsafe { &*ptr.cast::<D>() };
    (derived.upcast() as *const B).cast()
}

unsafe fn upcast_exclusive<D: Upcast<B>, B>(ptr: *mut u8) -> *mut u8 {
    let derived = unsafe { &mut *ptr.cast::<D>() };
    (derived.upcast_mut() as *mut B).cast()
}

struct RegistryInner {
    types: RwLock<HashMap<core::any::TypeId, &'static TypeData>>,
    scopes: RwLock<BTreeMap<String, Scope>>,
}

/// Cache of type descriptors.
///
/// Cloning is cheap and yields a handle to the same cache. Descriptors are
/// never freed: they live as long as the process, so resolved [`AnyType`]s
/// stay valid even after every registry handle is dropped.
#[derive(Clone)]
pub struct TypeRegistry {
    inner: Arc<RegistryInner>,
}

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.inner.types.read().len())
            .field("scopes", &self.inner.scopes.read().len())
            .finish()
    }
}

impl TypeRegistry {
    /// An empty registry.
    ///
    /// Every descriptor it resolves is leaked, and a new registry resolves
    /// its own. Build registries once (or use [`Self::global`]) rather than
    /// per operation.
    pub fn new() -> Self {
        TypeRegistry {
            inner: Arc::new(RegistryInner {
                types: RwLock::new(HashMap::new()),
                scopes: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// The process-wide registry behind [`resolve_type`].
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Returns `true` if both handles refer to the same cache.
    pub fn ptr_eq(&self, other: &TypeRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The descriptor of `T`, building and caching it on first request.
    ///
    /// Concurrent first requests race benignly: all callers observe the same
    /// cached descriptor.
    pub fn resolve<T: Reflect>(&self) -> AnyType {
        let native = core::any::TypeId::of::<T>();
        if let Some(data) = self.inner.types.read().get(&native) {
            return AnyType(*data);
        }

        // identity first, so nested resolutions can already refer to it
        let id = TypeId::for_native(native);
        let def = T::describe(self);

        let mut types = self.inner.types.write();
        let data: &'static TypeData = *types.entry(native).or_insert_with(|| {
            trace!("resolved {} as {:?} ({})", core::any::type_name::<T>(), def.kind(), id);
            Box::leak(Box::new(TypeData {
                id,
                native,
                name: core::any::type_name::<T>(),
                layout: Layout::new::<T>(),
                def,
            }))
        });
        AnyType(data)
    }

    /// The descriptor of a primitive number.
    pub fn resolve_number<N: Numeric>(&self) -> NumberType {
        match self.resolve::<N>().as_number() {
            Some(number) => number,
            None => unreachable!("numeric types always describe themselves as numbers"),
        }
    }

    /// Descriptors of the types in a tuple, in order.
    pub fn types_of<A: ArgTypes>(&self) -> Vec<AnyType> {
        A::types(self)
    }

    /// The cached descriptor with identity `id`, if any.
    pub fn get_by_id(&self, id: TypeId) -> Option<AnyType> {
        self.inner
            .types
            .read()
            .values()
            .find(|data| data.id == id)
            .map(|data| AnyType(*data))
    }

    /// Every cached descriptor, ordered by identity.
    pub fn types(&self) -> Vec<AnyType> {
        let mut types: Vec<AnyType> = self
            .inner
            .types
            .read()
            .values()
            .map(|data| AnyType(*data))
            .collect();
        types.sort();
        types
    }

    /// Records `B` as a base class of `D`. Adding the same base twice is a
    /// no-op.
    pub fn add_base<D, B>(&self) -> Result<(), RegistrationError>
    where
        D: Reflect + Upcast<B>,
        B: Reflect,
    {
        let derived = self.resolve_class::<D>()?;
        let base = self.resolve_class::<B>()?;
        derived.add_base(
            base,
            UpcastFns {
                shared: upcast_shared::<D, B>,
                exclusive: upcast_exclusive::<D, B>,
            },
        )
    }

    /// The descriptor of `T`, which must be a class.
    pub fn resolve_class<T: Reflect>(&self) -> Result<ClassType, RegistrationError> {
        let ty = self.resolve::<T>();
        ty.as_class().ok_or(RegistrationError::NotAClass {
            type_name: ty.name(),
        })
    }

    /// The named scope shared by every user of this registry, created empty
    /// on first request.
    pub fn static_scope(&self, name: &str) -> Scope {
        if let Some(scope) = self.inner.scopes.read().get(name) {
            return scope.clone();
        }

        self.inner
            .scopes
            .write()
            .entry(name.to_owned())
            .or_insert_with(|| {
                debug!("creating static scope {name}");
                Scope::new(name)
            })
            .clone()
    }
}

/// Resolves `T` in the global registry.
pub fn resolve_type<T: Reflect>() -> AnyType {
    TypeRegistry::global().resolve::<T>()
}
