/// Errors that can occur with tree operations.
///
/// Every operation either completes its mutation or fails before any link is
/// rewired, so a returned error never leaves a tree partially modified.
#[derive(Debug, PartialEq, Eq)]
pub enum TreeError {
    /// An equal key is already present; inserts do not update in place.
    DuplicateKey,
    /// The child required for the requested rotation direction is absent.
    MissingChild,
    /// The operation needs at least one node but the tree is empty.
    EmptyTree,
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "key already present in tree"),
            Self::MissingChild => write!(f, "rotation pivot is missing the required child"),
            Self::EmptyTree => write!(f, "operation requires a non-empty tree"),
        }
    }
}

impl std::error::Error for TreeError {}
