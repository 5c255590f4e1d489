// core/src/workflow/error.rs

use thiserror::Error;

/// Errors raised by the pipeline runner itself, as opposed to handler errors.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Step already defined: {step_name}")]
  DuplicateStep { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  /// The run ended without leaving the result its caller expects in the context.
  #[error("Pipeline '{pipeline}' finished without a result")]
  Incomplete { pipeline: String },
}

pub type WorkflowResult<T, E = WorkflowError> = std::result::Result<T, E>;
