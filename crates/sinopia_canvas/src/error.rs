//! Evaluation errors.

use sinopia_carton::String;
use sinopia_tempera::ReactiveError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("invalid expression: {message} in \"{expression}\"")]
    Syntax { expression: String, message: String },

    #[error("{0} is not defined")]
    Reference(String),

    #[error("{0}")]
    Type(String),

    /// A value thrown by template code.
    #[error("{0}")]
    Thrown(String),

    #[error("unsupported in templates: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Reactive(#[from] ReactiveError),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }
}

impl From<EvalError> for ReactiveError {
    fn from(error: EvalError) -> Self {
        match error {
            EvalError::Reactive(error) => error,
            EvalError::Thrown(msg) => ReactiveError::Thrown(msg),
            other => ReactiveError::Evaluation(String::from(other.to_string())),
        }
    }
}
