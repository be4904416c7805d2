//! Error types for registration, synthesis and invocation.

use std::fmt;

use thiserror::Error;

/// Errors raised by the value API when a generic value cannot become a
/// concrete one.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Type mismatch during conversion
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    /// Attempted to convert null to a non-nullable type
    #[error("null cannot be converted to {target_type}")]
    NullReference { target_type: &'static str },

    /// A class was paired with a Rust value of another type
    #[error("class '{class}' does not describe values of type {actual}")]
    ClassMismatch { class: String, actual: &'static str },

    /// The value's base chain disagrees with the class hierarchy
    #[error("base chain of {actual} does not match class '{class}'")]
    BaseChainMismatch { class: String, actual: &'static str },

    /// Abstract classes cannot be instantiated
    #[error("class '{class}' is abstract and cannot be instantiated")]
    AbstractClass { class: String },
}

/// Where in a call a value failed to marshal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPosition {
    /// The receiver of a property or method call
    Target,
    /// A positional argument
    Argument(usize),
    /// The value assigned by a property injector
    Value,
}

impl fmt::Display for ArgPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgPosition::Target => write!(f, "target"),
            ArgPosition::Argument(index) => write!(f, "argument {index}"),
            ArgPosition::Value => write!(f, "property value"),
        }
    }
}

/// Errors surfaced to the caller of an injector.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// A target or argument has the wrong dynamic type
    #[error("type mismatch for {position}: expected {expected}, got {actual}")]
    TypeMismatch {
        position: ArgPosition,
        expected: String,
        actual: String,
    },

    /// Argument count differs from the member's parameter count
    #[error("argument count mismatch: expected {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Virtual dispatch reached a slot the runtime class never implemented
    #[error("no implementation of '{method}' on class '{class}'")]
    AbstractMethod { method: String, class: String },

    /// A reference argument is the target object itself
    #[error("{position} is the target object itself")]
    AliasedTarget { position: ArgPosition },

    /// The underlying constructor, setter or method failed
    #[error(transparent)]
    TargetFailure(anyhow::Error),
}

impl InvokeError {
    /// Create a type mismatch error.
    pub fn mismatch(
        position: ArgPosition,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        InvokeError::TypeMismatch {
            position,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Report a failed value conversion at `position`.
    pub fn conversion(position: ArgPosition, error: ConversionError) -> Self {
        match error {
            ConversionError::TypeMismatch { expected, actual } => {
                InvokeError::mismatch(position, expected, actual)
            }
            ConversionError::NullReference { target_type } => {
                InvokeError::mismatch(position, target_type, "null")
            }
            other => InvokeError::mismatch(position, "convertible value", other.to_string()),
        }
    }

    /// Wrap a failure raised by a member body.
    pub fn target(error: impl Into<anyhow::Error>) -> Self {
        InvokeError::TargetFailure(error.into())
    }

    /// Check if this is a type mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, InvokeError::TypeMismatch { .. })
    }

    /// Get the failure raised by the member body, if that is what this is.
    pub fn target_failure(&self) -> Option<&anyhow::Error> {
        match self {
            InvokeError::TargetFailure(err) => Some(err),
            _ => None,
        }
    }
}

/// Why a member cannot be synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// The property has no setter
    ReadOnlyProperty,
    /// The declaring class is abstract
    AbstractClass,
    /// A non-virtual method without a body
    AbstractMethod,
    /// Value types have no vtable
    VirtualOnValueType,
    /// The declaring class has no vtable entry for the slot
    MissingVtableSlot,
    /// The body produces a different kind than the declaring class
    KindMismatch,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnsupportedReason::ReadOnlyProperty => "property has no setter",
            UnsupportedReason::AbstractClass => "declaring class is abstract",
            UnsupportedReason::AbstractMethod => "non-virtual method has no body",
            UnsupportedReason::VirtualOnValueType => "value types cannot dispatch virtually",
            UnsupportedReason::MissingVtableSlot => "declaring class has no vtable slot",
            UnsupportedReason::KindMismatch => "body does not produce the declaring kind",
        };
        f.write_str(text)
    }
}

/// Errors raised while synthesizing an injector.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// The descriptor cannot be compiled into an injector
    #[error("unsupported member '{member}': {reason}")]
    UnsupportedMember {
        member: String,
        reason: UnsupportedReason,
    },
}

impl SynthesisError {
    /// Create an unsupported member error.
    pub fn unsupported(member: impl Into<String>, reason: UnsupportedReason) -> Self {
        SynthesisError::UnsupportedMember {
            member: member.into(),
            reason,
        }
    }

    /// Get the reason the member was rejected.
    pub fn reason(&self) -> UnsupportedReason {
        match self {
            SynthesisError::UnsupportedMember { reason, .. } => *reason,
        }
    }
}

/// Errors raised by [`ClassBuilder::build`](crate::ClassBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Base class is sealed
    #[error("class '{class}' cannot extend sealed class '{base}'")]
    SealedBase { class: String, base: String },

    /// Base class is not a reference type
    #[error("class '{class}' cannot extend value type '{base}'")]
    ValueTypeBase { class: String, base: String },

    /// Abstract method registered on a concrete class
    #[error("abstract method '{method}' declared on concrete class '{class}'")]
    AbstractMethodOnConcreteClass { class: String, method: String },

    /// A concrete class leaves an inherited abstract slot empty
    #[error("concrete class '{class}' does not implement abstract method '{method}'")]
    UnimplementedAbstract { class: String, method: String },

    /// Member declared twice with the same signature
    #[error("duplicate member '{member}' on class '{class}'")]
    DuplicateMember { class: String, member: String },

    /// Class marked both abstract and sealed
    #[error("class '{class}' cannot be both abstract and sealed")]
    AbstractSealed { class: String },
}
