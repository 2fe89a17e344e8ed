use alloc::collections::BTreeMap;
use core::fmt::Debug;

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::cast::arguments_compatible;
use crate::{
    AnyType, ClassFlags, Constructor, ConstructorIndex, Destructor, DestructorIndex, Function,
    FunctionIndex, IntoArgs, Member, MemberIndex, Method, MethodIndex, Reflect,
    RegistrationError, UValue, Variable, VariableIndex, debug, trace,
};

/// Projection from a derived object to one of its bases.
#[derive(Clone, Copy)]
pub(crate) struct UpcastFns {
    pub(crate) shared: unsafe fn(*const u8) -> *const u8,
    pub(crate) exclusive: unsafe fn(*mut u8) -> *mut u8,
}

pub(crate) type UpcastPath = SmallVec<[UpcastFns; 2]>;

#[derive(Clone, Copy)]
struct BaseInfo {
    class: ClassType,
    upcast: UpcastFns,
}

/// Class descriptor payload.
///
/// Apart from size and flags, everything here is filled in during
/// registration: bases through [`crate::TypeRegistry::add_base`], entities
/// through the `ClassType::add_*` methods.
pub struct ClassDef {
    flags: ClassFlags,
    argument_types: Vec<AnyType>,
    bases: RwLock<Vec<BaseInfo>>,
    constructors: RwLock<BTreeMap<ConstructorIndex, Constructor>>,
    destructors: RwLock<BTreeMap<DestructorIndex, Destructor>>,
    functions: RwLock<BTreeMap<FunctionIndex, Function>>,
    members: RwLock<BTreeMap<MemberIndex, Member>>,
    methods: RwLock<BTreeMap<MethodIndex, Method>>,
    variables: RwLock<BTreeMap<VariableIndex, Variable>>,
}

impl ClassDef {
    /// Definition for the class `T`, deriving flags from its layout and
    /// value operations.
    pub fn new<T: Reflect>() -> Self {
        let mut flags = ClassFlags::empty();
        if core::mem::size_of::<T>() == 0 {
            flags |= ClassFlags::IS_EMPTY;
        }
        if T::OPS.deref.is_some() {
            flags |= ClassFlags::IS_POINTER_LIKE;
        }
        if T::OPS.index.is_some() {
            flags |= ClassFlags::IS_ARRAY_LIKE;
        }

        ClassDef {
            flags,
            argument_types: Vec::new(),
            bases: RwLock::new(Vec::new()),
            constructors: RwLock::new(BTreeMap::new()),
            destructors: RwLock::new(BTreeMap::new()),
            functions: RwLock::new(BTreeMap::new()),
            members: RwLock::new(BTreeMap::new()),
            methods: RwLock::new(BTreeMap::new()),
            variables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Records the generic arguments the class was instantiated with.
    pub fn with_argument_types(mut self, argument_types: Vec<AnyType>) -> Self {
        if !argument_types.is_empty() {
            self.flags |= ClassFlags::IS_GENERIC;
        }
        self.argument_types = argument_types;
        self
    }
}

super::type_view! {
    /// Descriptor of a class: structs, strings, collections, smart pointers.
    ClassType, Class, ClassDef, as_class, is_class
}

fn fill_in<K: Ord + Debug, V>(
    class: ClassType,
    map: &RwLock<BTreeMap<K, V>>,
    key: K,
    value: V,
) {
    let mut map = map.write();
    if map.contains_key(&key) {
        debug!("{}: replacing {:?}", class.name(), key);
    } else {
        trace!("{}: adding {:?}", class.name(), key);
    }
    map.insert(key, value);
}

fn snapshot<K, V: Clone>(map: &RwLock<BTreeMap<K, V>>) -> Vec<V> {
    map.read().values().cloned().collect()
}

fn find<K, V: Clone>(map: &RwLock<BTreeMap<K, V>>, pred: impl Fn(&K) -> bool) -> Option<V> {
    map.read()
        .iter()
        .find(|(key, _)| pred(key))
        .map(|(_, value)| value.clone())
}

impl ClassType {
    /// Class flags.
    pub fn flags(self) -> ClassFlags {
        self.def.flags
    }

    /// Size in bytes.
    pub fn size(self) -> usize {
        self.data.layout.size()
    }

    /// Alignment in bytes.
    pub fn align(self) -> usize {
        self.data.layout.align()
    }

    /// Number of generic arguments.
    pub fn arity(self) -> usize {
        self.def.argument_types.len()
    }

    /// Generic arguments, e.g. `T` for `Vec<T>`.
    pub fn argument_types(self) -> &'static [AnyType] {
        &self.def.argument_types
    }

    /// Direct bases, in registration order.
    pub fn bases(self) -> Vec<ClassType> {
        self.def.bases.read().iter().map(|base| base.class).collect()
    }

    /// Returns `true` if `self` is a direct or indirect base of `derived`.
    pub fn is_base_of(self, derived: ClassType) -> bool {
        derived.is_derived_from(self)
    }

    /// Returns `true` if `base` is a direct or indirect base of `self`.
    pub fn is_derived_from(self, base: ClassType) -> bool {
        self != base && self.upcast_path(base).is_some()
    }

    /// The chain of projections leading from `self` to `to`, depth first in
    /// base registration order. Empty when `self == to`.
    pub(crate) fn upcast_path(self, to: ClassType) -> Option<UpcastPath> {
        if self == to {
            return Some(UpcastPath::new());
        }

        let bases: SmallVec<[BaseInfo; 4]> = self.def.bases.read().iter().copied().collect();
        bases.into_iter().find_map(|base| {
            let mut path = base.class.upcast_path(to)?;
            path.insert(0, base.upcast);
            Some(path)
        })
    }

    pub(crate) fn add_base(self, base: ClassType, upcast: UpcastFns) -> Result<(), RegistrationError> {
        if base == self || base.is_derived_from(self) {
            return Err(RegistrationError::CyclicBase {
                derived: self.name(),
                base: base.name(),
            });
        }

        let mut bases = self.def.bases.write();
        if bases.iter().any(|known| known.class == base) {
            return Ok(());
        }
        trace!("{}: adding base {}", self.name(), base.name());
        bases.push(BaseInfo {
            class: base,
            upcast,
        });
        Ok(())
    }

    /// Searches `self`, then its bases depth first.
    fn search<V>(self, lookup: &impl Fn(&'static ClassDef) -> Option<V>) -> Option<V> {
        if let Some(found) = lookup(self.def) {
            return Some(found);
        }
        self.bases()
            .into_iter()
            .find_map(|base| base.search(lookup))
    }

    fn check_owner(self, entity: &str, owner: AnyType) -> Result<(), RegistrationError> {
        if self == owner {
            Ok(())
        } else {
            Err(RegistrationError::OwnerMismatch {
                entity: entity.to_owned(),
                owner: owner.name(),
                target: self.name(),
            })
        }
    }

    /// Adds a constructor; one with the same signature is replaced.
    pub fn add_constructor(self, constructor: Constructor) -> Result<(), RegistrationError> {
        let index = constructor.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        self.check_owner("constructor", index.get_type().owner_type())?;
        fill_in(self, &self.def.constructors, index, constructor);
        Ok(())
    }

    /// Adds the destructor, replacing any previous one.
    pub fn add_destructor(self, destructor: Destructor) -> Result<(), RegistrationError> {
        let index = destructor.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        self.check_owner("destructor", index.get_type().owner_type())?;
        fill_in(self, &self.def.destructors, index, destructor);
        Ok(())
    }

    /// Adds an associated function; one with the same name and signature is
    /// replaced.
    pub fn add_function(self, function: Function) -> Result<(), RegistrationError> {
        let index = function.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        fill_in(self, &self.def.functions, index, function);
        Ok(())
    }

    /// Adds a member; one with the same name and signature is replaced.
    pub fn add_member(self, member: Member) -> Result<(), RegistrationError> {
        let index = member.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        self.check_owner(index.get_name(), index.get_type().owner_type())?;
        fill_in(self, &self.def.members, index, member);
        Ok(())
    }

    /// Adds a method; one with the same name and signature is replaced.
    pub fn add_method(self, method: Method) -> Result<(), RegistrationError> {
        let index = method.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        self.check_owner(index.get_name(), index.get_type().owner_type())?;
        fill_in(self, &self.def.methods, index, method);
        Ok(())
    }

    /// Adds an associated variable; one with the same name and type is
    /// replaced.
    pub fn add_variable(self, variable: Variable) -> Result<(), RegistrationError> {
        let index = variable.try_index().ok_or(RegistrationError::EmptyHandle)?.clone();
        fill_in(self, &self.def.variables, index, variable);
        Ok(())
    }

    /// Own constructors.
    pub fn constructors(self) -> Vec<Constructor> {
        snapshot(&self.def.constructors)
    }

    /// Own destructors (at most one).
    pub fn destructors(self) -> Vec<Destructor> {
        snapshot(&self.def.destructors)
    }

    /// Own associated functions.
    pub fn functions(self) -> Vec<Function> {
        snapshot(&self.def.functions)
    }

    /// Own members.
    pub fn members(self) -> Vec<Member> {
        snapshot(&self.def.members)
    }

    /// Own methods.
    pub fn methods(self) -> Vec<Method> {
        snapshot(&self.def.methods)
    }

    /// Own associated variables.
    pub fn variables(self) -> Vec<Variable> {
        snapshot(&self.def.variables)
    }

    /// The first constructor accepting arguments of the given types, or an
    /// empty handle.
    pub fn get_constructor_with(self, argument_types: &[AnyType]) -> Constructor {
        find(&self.def.constructors, |index| {
            arguments_compatible(argument_types, index.get_type().argument_types())
        })
        .unwrap_or_default()
    }

    /// The destructor, or an empty handle.
    pub fn get_destructor(self) -> Destructor {
        find(&self.def.destructors, |_| true).unwrap_or_default()
    }

    /// The first function called `name`, searching bases too.
    pub fn get_function(self, name: &str) -> Function {
        self.search(&|def| find(&def.functions, |index| index.get_name() == name))
            .unwrap_or_default()
    }

    /// The first function called `name` accepting arguments of the given
    /// types, searching bases too.
    pub fn get_function_with(self, name: &str, argument_types: &[AnyType]) -> Function {
        self.search(&|def| {
            find(&def.functions, |index| {
                index.get_name() == name
                    && arguments_compatible(argument_types, index.get_type().argument_types())
            })
        })
        .unwrap_or_default()
    }

    /// The first member called `name`, searching bases too.
    pub fn get_member(self, name: &str) -> Member {
        self.search(&|def| find(&def.members, |index| index.get_name() == name))
            .unwrap_or_default()
    }

    /// The first method called `name`, searching bases too.
    pub fn get_method(self, name: &str) -> Method {
        self.search(&|def| find(&def.methods, |index| index.get_name() == name))
            .unwrap_or_default()
    }

    /// The first method called `name` accepting arguments of the given
    /// types, searching bases too.
    pub fn get_method_with(self, name: &str, argument_types: &[AnyType]) -> Method {
        self.search(&|def| {
            find(&def.methods, |index| {
                index.get_name() == name
                    && arguments_compatible(argument_types, index.get_type().argument_types())
            })
        })
        .unwrap_or_default()
    }

    /// The first variable called `name`, searching bases too.
    pub fn get_variable(self, name: &str) -> Variable {
        self.search(&|def| find(&def.variables, |index| index.get_name() == name))
            .unwrap_or_default()
    }

    /// Creates an instance with the first constructor that accepts `args`.
    ///
    /// The shape of the result follows that constructor's policy.
    pub fn create<'a>(self, args: impl IntoArgs<'a>) -> Option<UValue> {
        let sources = args.into_sources();
        self.constructors()
            .into_iter()
            .find(|constructor| constructor.check_sources(&sources).is_ok())
            .and_then(|constructor| constructor.create_from_sources(&sources).ok())
    }

    /// Constructs an instance in `mem` with the first constructor that
    /// accepts `args`, yielding a `*mut` pointer to it.
    ///
    /// # Safety
    ///
    /// `mem` must be valid for writes of [`Self::size`] bytes and aligned to
    /// [`Self::align`]. The instance must later be destroyed with
    /// [`Self::destroy_at`] or [`Destructor::destroy_at`].
    pub unsafe fn create_at<'a>(self, mem: *mut u8, args: impl IntoArgs<'a>) -> Option<UValue> {
        let sources = args.into_sources();
        let constructor = self
            .constructors()
            .into_iter()
            .find(|constructor| constructor.check_sources(&sources).is_ok())?;
        unsafe { constructor.create_at_from_sources(mem, &sources) }.ok()
    }

    /// Drops the instance living at `mem` in place.
    ///
    /// Returns `false` when no destructor is registered.
    ///
    /// # Safety
    ///
    /// `mem` must hold a live instance of this class, e.g. one produced by
    /// [`Self::create_at`]. The instance must not be used afterwards.
    pub unsafe fn destroy_at(self, mem: *mut u8) -> bool {
        let destructor = self.get_destructor();
        if !destructor.is_valid() {
            return false;
        }
        unsafe { destructor.destroy_at(mem) };
        true
    }
}
