use thiserror::Error;

/// Errors returned by tree operations.
///
/// Everything except [`TreeError::Structural`] is recoverable: the operation was rejected and the
/// tree is exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A key or selector could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The key is not stored in the tree.
    #[error("Key not found in tree: {0}")]
    NotFound(String),

    /// The key is already stored in the tree.
    #[error("Duplicate key found in tree: {0}")]
    DuplicateKey(String),

    /// The tree failed validation. Only raised by [`crate::Validator`].
    #[error("Tree structure is broken: {0}")]
    Structural(#[from] StructuralViolation),
}

/// Invariant a tree was found to break during validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralViolation {
    #[error("cycle detected at key {0}")]
    CycleDetected(String),

    #[error("key {0} and its child are both red")]
    RedRed(String),

    #[error("key {0} is out of order")]
    OrderViolation(String),

    #[error("black height mismatch below key {0}")]
    BlackHeightMismatch(String),

    #[error("child of key {0} does not point back to it")]
    ParentMismatch(String),

    #[error("node count mismatch, expected {expected} but found {actual}")]
    NodeCountMismatch { expected: usize, actual: usize },

    #[error("root is not black")]
    RootNotBlack,

    #[error("nil terminator is not a keyless black leaf")]
    CorruptNil,
}
