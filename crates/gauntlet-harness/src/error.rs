use std::any::Any;
use std::time::Duration;

use thiserror::Error;

use crate::phase::Phase;

/// Error type returned by consumer callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by consumer callbacks.
pub type ConsumerResult<T> = Result<T, BoxError>;

/// A malformed or missing phase parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("the parameter map for '{phase}' must contain a '{field}' field.")]
    Missing { phase: Phase, field: &'static str },

    #[error("the value of '{field}' must be an '{expected}'.")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("the value of '{field}' cannot be empty.")]
    Empty { field: &'static str },

    #[error("the value '{field}' must contain the sequence '{placeholder}'")]
    MissingPlaceholder {
        field: &'static str,
        placeholder: &'static str,
    },

    #[error("the value of '{field}' must be greater than 0.")]
    NotPositive { field: &'static str },

    #[error("the value of '{field}' cannot exceed {max}.")]
    TooLarge { field: &'static str, max: u64 },
}

/// Consumer callback that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerStage {
    GenerateTestData,
    ComponentUnderTest,
    Verify,
    Reset,
}

impl std::fmt::Display for ConsumerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumerStage::GenerateTestData => write!(f, "generate_test_data"),
            ConsumerStage::ComponentUnderTest => write!(f, "component_under_test"),
            ConsumerStage::Verify => write!(f, "verify"),
            ConsumerStage::Reset => write!(f, "reset"),
        }
    }
}

/// Harness errors.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("{stage} failed: {source}")]
    Consumer {
        stage: ConsumerStage,
        source: BoxError,
    },

    #[error("check failed: {0}")]
    CheckFailed(String),

    #[error("{context} panicked: {message}")]
    Panicked { context: String, message: String },

    #[error("{context} was cancelled before completing")]
    Cancelled { context: String },

    #[error("{user} did not finish within {after:?}")]
    TimedOut { user: String, after: Duration },

    #[error("invalid harness configuration: {0}")]
    Config(String),
}

impl HarnessError {
    /// Wrap an error raised by a consumer callback.
    ///
    /// Harness errors the consumer propagated with `?` (failed checks,
    /// contract violations) are passed through unchanged.
    pub fn consumer(stage: ConsumerStage, err: BoxError) -> Self {
        match err.downcast::<HarnessError>() {
            Ok(inner) => *inner,
            Err(source) => HarnessError::Consumer { stage, source },
        }
    }

    pub(crate) fn from_join(context: impl Into<String>, err: tokio::task::JoinError) -> Self {
        let context = context.into();
        if err.is_panic() {
            HarnessError::Panicked {
                context,
                message: panic_message(err.into_panic()),
            }
        } else {
            HarnessError::Cancelled { context }
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, HarnessError::Contract(_))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Convenience type alias for harness results.
pub type HarnessResult<T> = Result<T, HarnessError>;
