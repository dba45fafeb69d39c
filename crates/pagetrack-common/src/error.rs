use thiserror::Error;

/// Rejected router input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Navigation path must not be empty")]
    EmptyPath,
}
