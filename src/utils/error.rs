//! Errors raised while planning or reconciling swap.
//!
//! None of these are fatal to the process; the worst outcome is that swap
//! configuration for this run did not complete, which the caller reports so
//! the operator can retry.

use std::{borrow::Cow, io, path::PathBuf};

use thiserror::Error;

use crate::reconcile::ReconcileStep;

/// A type alias for handling errors related to swap planning.
pub type SwapResult<T> = std::result::Result<T, SwapError>;

#[derive(Debug, Error)]
pub enum SwapError {
    /// Malformed or out-of-range input. Nothing on the host was changed.
    #[error("Invalid swap size: {0}")]
    Validation(Cow<'static, str>),

    /// A step of the reconciliation failed. Any partially created swap file
    /// was removed before this was returned.
    #[error("Step {} ({step}) failed: {reason}", .step.number())]
    Resource {
        step: ReconcileStep,
        reason: Cow<'static, str>,
    },

    /// The run lock is held by someone else or could not be created.
    #[error("Unable to take the run lock at '{}': {reason}", .path.display())]
    Lock {
        path: PathBuf,
        reason: Cow<'static, str>,
    },

    /// A mount table line that could not be safely understood. The line is
    /// left untouched.
    #[error("Mount table line {line_no} was left as is since it could not be parsed: '{line}'")]
    State { line_no: usize, line: String },

    /// The host could not be queried for memory, swap or disk state.
    #[error("Unable to read host state: {0}")]
    Host(Cow<'static, str>),

    /// The run needs privileges the process does not have.
    #[error("Insufficient privileges: {0}")]
    Permission(Cow<'static, str>),

    /// Asking the operator for input failed.
    #[error("Unable to prompt for input: {0}")]
    Prompt(Cow<'static, str>),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SwapError {
    /// Create a new [`SwapError::Validation`].
    pub fn validation<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        SwapError::Validation(reason.into())
    }

    /// Create a new [`SwapError::Resource`] for the given step.
    pub fn resource<R: Into<Cow<'static, str>>>(step: ReconcileStep, reason: R) -> Self {
        SwapError::Resource {
            step,
            reason: reason.into(),
        }
    }

    /// Create a new [`SwapError::Host`].
    pub fn host<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        SwapError::Host(reason.into())
    }

    /// Returns the failed step, if this error came out of a reconciliation.
    pub fn step(&self) -> Option<ReconcileStep> {
        match self {
            SwapError::Resource { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Whether the error happened before anything on the host was touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, SwapError::Validation(_))
    }
}
