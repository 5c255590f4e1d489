// core/src/workflow/mod.rs

//! A small step-pipeline runner used to execute multi-step business
//! transactions (checkout) as a sequence of named, traced steps.
//!
//! Each step has `on` handlers and optional `after` hooks. Handlers receive a
//! clone of the shared [`ContextData`] and return [`PipelineControl`] to
//! continue or halt. Steps marked optional are best-effort: a failing handler
//! is logged and the pipeline moves on.

pub mod context_data;
pub mod control;
pub mod error;
pub mod pipeline;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use error::WorkflowError;
pub use pipeline::{Handler, Pipeline, StepDef};
