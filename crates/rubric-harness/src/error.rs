use rubric_model::Visibility;
use thiserror::Error;

/// Outcome of a verification step: the value, or a terminal failure that
/// aborts the current check.
pub type Verify<T> = std::result::Result<T, Failure>;

/// The harness's terminal-failure taxonomy.
///
/// Every variant is a structural or contract violation detected by the
/// harness itself. Exceptions raised by the subject under test travel as
/// [`rubric_model::Thrown`] and are only folded into this channel by the
/// invocation bridge's expect-success mode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Failure {
    #[error("expected to find a type named `{0}` but did not")]
    TypeNotFound(String),

    #[error("expected `{name}` to be {expected}, but it was {actual}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("cannot get the superclass of `{0}`")]
    NoSuperclass(String),

    #[error("expected the {kind} `{owner}` to define a method with the signature `{signature}`")]
    MethodNotFound {
        kind: &'static str,
        owner: String,
        signature: String,
    },

    #[error("expected `{owner}.{name}` to be {required} but it is not")]
    VisibilityMismatch {
        owner: String,
        name: String,
        required: Visibility,
    },

    #[error("expected `{owner}.{name}` to be static but it is not")]
    StaticityMismatch { owner: String, name: String },

    #[error("expected `{owner}.{name}` to return `{expected}` but it returns `{actual}`")]
    ReturnTypeMismatch {
        owner: String,
        name: String,
        expected: String,
        actual: String,
    },

    #[error("expected `{owner}.{name}` to throw exactly `{expected}`{qualifier} but it {actual}")]
    ExceptionSetMismatch {
        owner: String,
        name: String,
        expected: String,
        qualifier: &'static str,
        actual: String,
    },

    #[error("attempted to call `{name}` on `{owner}` before requiring it")]
    UnregisteredMethod { owner: String, name: String },

    #[error("couldn't find a method matching `{name}` on `{owner}` for args `{args}`")]
    NoMatchingOverload {
        owner: String,
        name: String,
        args: String,
    },

    /// Raised when two candidates tie for the best score. This is misuse of
    /// the harness, not a defect in the subject under test: the registered
    /// constraints are underspecified relative to the call being made.
    #[error("ambiguous match: more than one best match for the call to `{name}({args})`")]
    AmbiguousOverload { name: String, args: String },

    #[error("could not find a constructor on `{owner}` that matches `{args}`")]
    NoMatchingConstructor { owner: String, args: String },

    #[error("could not instantiate `{owner}` with {detail}")]
    ConstructionFailed { owner: String, detail: String },

    #[error("expected `{owner}.{name}` to not throw an exception, but it threw `{thrown}`")]
    UnexpectedTargetException {
        owner: String,
        name: String,
        thrown: String,
    },

    #[error("expected the `{child}` class to implement `{parent}` but it does not")]
    NotASubtype { child: String, parent: String },

    #[error("expected `{owner}.{name}` to throw a `{expected}` but it threw `{actual}`")]
    ExpectedExceptionMismatch {
        owner: String,
        name: String,
        expected: String,
        actual: String,
    },

    #[error("expected `{owner}.{name}` to throw a `{expected}` but it threw nothing")]
    ExpectedExceptionMissing {
        owner: String,
        name: String,
        expected: String,
    },

    #[error("expected `{owner}.{field}` to be private or protected, but it is {actual}")]
    UnencapsulatedField {
        owner: String,
        field: String,
        actual: Visibility,
    },

    #[error("expected `{name}` to be a checked exception, but {reason}")]
    NotACheckedException { name: String, reason: String },

    #[error("invalid constraint: {0}")]
    InvalidSpec(String),
}

/// Adapter for the external reporting collaborator: a grading script that
/// wants "signal terminal failure with message" semantics instead of a
/// `Result` converts outcomes at this seam.
pub mod report {
    use super::Verify;

    /// Unwrap a verification outcome, aborting the current check with the
    /// formatted failure message. This is the one place the harness turns a
    /// terminal failure into a test-runner abort.
    pub fn require<T>(outcome: Verify<T>) -> T {
        match outcome {
            Ok(value) => value,
            Err(failure) => panic!("{failure}"),
        }
    }
}
