use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("tree capacity exceeded: {leaves} leaves do not fit a tree of height {height}")]
    CapacityExceeded { leaves: usize, height: usize },

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl RegistryError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
