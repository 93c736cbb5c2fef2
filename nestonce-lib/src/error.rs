use thiserror::Error;

/// Errors raised while building, flattening or printing a style tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NestingError {
    #[error("failed to parse stylesheet: {0}")]
    Parse(String),

    #[error("failed to print stylesheet: {0}")]
    Print(String),

    #[error("expected a rule node, found {0}")]
    NotARule(&'static str),

    #[error("{0} node cannot hold children")]
    NotAContainer(&'static str),

    #[error("node is not attached to a container")]
    Detached,
}
