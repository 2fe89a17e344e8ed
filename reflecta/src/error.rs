use core::fmt;

/// Errors reported by checked calls, typed value access and cast failures.
///
/// Every checked operation (`try_invoke`, `try_get`, `try_set`,
/// `try_create`, ...) reports one of these instead of performing the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The number of supplied arguments differs from the entity's arity.
    #[error("arity mismatch: expected {expected} arguments, got {actual}")]
    ArityMismatch {
        /// The arity of the entity.
        expected: usize,
        /// The number of supplied arguments.
        actual: usize,
    },

    /// An argument cannot be converted to the parameter type at `position`.
    #[error("argument type mismatch at position {position}")]
    ArgumentTypeMismatch {
        /// Zero-based position of the offending argument.
        position: usize,
    },

    /// The instance is not (and does not derive from) the owner type.
    #[error("instance type mismatch")]
    InstanceTypeMismatch,

    /// The instance could not be reached, e.g. a null pointer was supplied
    /// or the getter was called with an unrelated type.
    #[error("bad instance cast")]
    BadInstanceCast,

    /// Mutable access was requested through a const access path.
    #[error("bad const access")]
    BadConstAccess,

    /// Typed access to a [`crate::UValue`] that is empty or holds another type.
    #[error("bad uvalue access")]
    BadUValueAccess,

    /// The held type does not support the requested operation.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation {
        /// The name of the operation (`"eq"`, `"deref"`, `"parse"`, ...).
        operation: &'static str,
    },

    /// Stream-in of a textual value failed.
    #[error("failed to parse a value of type {type_name}")]
    ParseFailed {
        /// Name of the type being parsed.
        type_name: &'static str,
    },
}

impl Error {
    /// The [`ErrorCode`] classifying this error.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Error::ArityMismatch { .. } => ErrorCode::ArityMismatch,
            Error::ArgumentTypeMismatch { .. } => ErrorCode::ArgumentTypeMismatch,
            Error::InstanceTypeMismatch => ErrorCode::InstanceTypeMismatch,
            Error::BadInstanceCast => ErrorCode::BadInstanceCast,
            Error::BadConstAccess => ErrorCode::BadConstAccess,
            Error::BadUValueAccess => ErrorCode::BadUValueAccess,
            Error::UnsupportedOperation { .. } => ErrorCode::UnsupportedOperation,
            Error::ParseFailed { .. } => ErrorCode::ParseFailed,
        }
    }

    pub(crate) const fn unsupported(operation: &'static str) -> Self {
        Error::UnsupportedOperation { operation }
    }
}

/// Result type used by checked operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Flat classification of an [`Error`], with a [`ErrorCode::NoError`]
/// sentinel for successful checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    /// The check passed.
    NoError,
    /// See [`Error::ArityMismatch`].
    ArityMismatch,
    /// See [`Error::ArgumentTypeMismatch`].
    ArgumentTypeMismatch,
    /// See [`Error::InstanceTypeMismatch`].
    InstanceTypeMismatch,
    /// See [`Error::BadInstanceCast`].
    BadInstanceCast,
    /// See [`Error::BadConstAccess`].
    BadConstAccess,
    /// See [`Error::BadUValueAccess`].
    BadUValueAccess,
    /// See [`Error::UnsupportedOperation`].
    UnsupportedOperation,
    /// See [`Error::ParseFailed`].
    ParseFailed,
}

impl ErrorCode {
    /// Classifies the outcome of a check.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ErrorCode::NoError,
            Err(err) => err.code(),
        }
    }

    /// Returns `true` for [`ErrorCode::NoError`].
    pub const fn is_ok(self) -> bool {
        matches!(self, ErrorCode::NoError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::NoError => "no error",
            ErrorCode::ArityMismatch => "arity mismatch",
            ErrorCode::ArgumentTypeMismatch => "argument type mismatch",
            ErrorCode::InstanceTypeMismatch => "instance type mismatch",
            ErrorCode::BadInstanceCast => "bad instance cast",
            ErrorCode::BadConstAccess => "bad const access",
            ErrorCode::BadUValueAccess => "bad uvalue access",
            ErrorCode::UnsupportedOperation => "unsupported operation",
            ErrorCode::ParseFailed => "parse failed",
        };
        f.write_str(name)
    }
}

/// Errors raised while building handles or filling in descriptors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// A policy was set twice on the same [`crate::BindOpts`].
    #[error("a policy has already been set")]
    PolicyAlreadySet,

    /// The chosen policy cannot be honoured for the entity's type.
    #[error("policy {policy} cannot be applied to {type_name}")]
    PolicyMismatch {
        /// Name of the rejected policy.
        policy: &'static str,
        /// Name of the type the policy was applied to.
        type_name: &'static str,
    },

    /// More argument names were supplied than the entity has parameters.
    #[error("{provided} argument names supplied for an entity of arity {arity}")]
    TooManyArgumentNames {
        /// Number of supplied names.
        provided: usize,
        /// Arity of the entity.
        arity: usize,
    },

    /// The entity belongs to another type than the one it is added to.
    #[error("{entity} is owned by {owner}, not by {target}")]
    OwnerMismatch {
        /// Name of the entity.
        entity: String,
        /// Name of the owner type.
        owner: &'static str,
        /// Name of the type the entity was added to.
        target: &'static str,
    },

    /// A class was required.
    #[error("{type_name} is not a class")]
    NotAClass {
        /// Name of the offending type.
        type_name: &'static str,
    },

    /// Adding the base would make a class derive from itself.
    #[error("{derived} cannot derive from {base}: the relation would be cyclic")]
    CyclicBase {
        /// Name of the derived class.
        derived: &'static str,
        /// Name of the base class.
        base: &'static str,
    },

    /// The handle is empty.
    #[error("an empty handle cannot be registered")]
    EmptyHandle,
}
