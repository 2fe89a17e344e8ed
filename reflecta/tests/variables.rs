use parking_lot::RwLock;
use reflecta::{
    BindOpts, Error, ErrorCode, RefWrapperMut, TypeRegistry, UValue, Variable, VariablePolicy,
};
use reflecta_testhelpers::{IPanic, test};

#[test]
fn writable_variables() -> Result<(), IPanic> {
    static LIMIT: RwLock<i64> = RwLock::new(10);

    let registry = TypeRegistry::new();
    let limit = Variable::new(&registry, "limit", &LIMIT)?;
    assert_eq!(limit.get_name(), "limit");
    assert!(!limit.is_readonly());
    assert!(limit.get_type().data_type() == registry.resolve::<i64>());

    assert_eq!(limit.get().get_as::<i64>(), Ok(&10));
    limit.set(20_i32);
    assert_eq!(*LIMIT.read(), 20);
    limit.try_set(UValue::new(30_u32))?;
    assert_eq!(limit.get().get_as::<i64>(), Ok(&30));

    assert_eq!(
        limit.try_set(1.5_f64),
        Err(Error::ArgumentTypeMismatch { position: 0 })
    );
    assert_eq!(*LIMIT.read(), 30);

    assert!(limit.is_settable_with::<i8>());
    assert_eq!(limit.check_settable_error::<u64>(), ErrorCode::ArgumentTypeMismatch);
    assert!(limit.is_settable_with_args(5_i16));
    Ok(())
}

#[test]
fn readonly_variables() -> Result<(), IPanic> {
    static VERSION: u32 = 3;

    let registry = TypeRegistry::new();
    let version = Variable::readonly(&registry, "version", &VERSION)?;
    assert!(version.is_readonly());
    assert!(version.get_type().is_readonly());
    assert_eq!(version.get().get_as::<u32>(), Ok(&3));

    assert_eq!(version.try_set(4_u32), Err(Error::BadConstAccess));
    assert_eq!(version.check_settable_error::<u32>(), ErrorCode::BadConstAccess);
    assert_eq!(VERSION, 3);
    Ok(())
}

#[test]
#[should_panic(expected = "invalid write of variable version")]
fn unchecked_writes_of_readonly_variables_panic() {
    static VERSION: u32 = 3;

    let registry = TypeRegistry::new();
    let version = Variable::readonly(&registry, "version", &VERSION).unwrap();
    version.set(4_u32);
}

#[test]
fn pointer_policies() -> Result<(), IPanic> {
    static COUNTER: RwLock<u64> = RwLock::new(0);

    let registry = TypeRegistry::new();
    let opts = BindOpts::new().policy(VariablePolicy::AsPointer)?;
    let counter = Variable::with_opts(&registry, "counter", &COUNTER, opts)?;
    let pointer = *counter.get().get_as::<*mut u64>()?;
    assert_eq!(pointer, COUNTER.data_ptr());

    let opts = BindOpts::new().policy(VariablePolicy::AsReferenceWrapper)?;
    let counter = Variable::with_opts(&registry, "counter", &COUNTER, opts)?;
    let wrapper = *counter.get().get_as::<RefWrapperMut<u64>>()?;
    assert_eq!(wrapper.as_ptr(), COUNTER.data_ptr());
    assert_eq!(
        counter.get().deref_value().err(),
        Some(Error::UnsupportedOperation { operation: "deref" })
    );

    counter.set(7_u8);
    assert_eq!(*COUNTER.read(), 7);
    Ok(())
}
