// core/src/workflow/pipeline.rs

//! `Pipeline<TData, Err>`: ordered named steps, their handlers, and `run()`.

use super::context_data::ContextData;
use super::control::{PipelineControl, PipelineResult};
use super::error::{WorkflowError, WorkflowResult};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// A step handler: takes a clone of the shared context, resolves to a flow signal.
///
/// Handlers must drop any context guard before awaiting.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  /// Optional steps may have no handlers, and a failing handler only logs.
  pub optional: bool,
}

pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: fmt::Display + From<WorkflowError> + Send + 'static,
{
  name: String,
  steps: Vec<StepDef>,
  on: HashMap<String, Vec<Handler<TData, Err>>>,
  after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: fmt::Display + From<WorkflowError> + Send + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, in execution order.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool)]) -> WorkflowResult<Self> {
    let mut pipeline = Self {
      name: name.into(),
      steps: Vec::with_capacity(step_defs.len()),
      on: HashMap::new(),
      after: HashMap::new(),
    };
    for (step_name, optional) in step_defs {
      pipeline.ensure_step_not_exists(step_name)?;
      pipeline.steps.push(StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
      });
    }
    Ok(pipeline)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn steps(&self) -> &[StepDef] {
    &self.steps
  }

  fn ensure_step_exists(&self, step_name: &str) -> WorkflowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      Ok(())
    } else {
      Err(WorkflowError::StepNotFound {
        step_name: step_name.to_string(),
      })
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) -> WorkflowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      Err(WorkflowError::DuplicateStep {
        step_name: step_name.to_string(),
      })
    } else {
      Ok(())
    }
  }

  /// Registers the main handler(s) of a step.
  pub fn on<F, Fut, UserErr>(&mut self, step_name: &str, handler_fn: F) -> WorkflowResult<()>
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + 'static,
  {
    self.ensure_step_exists(step_name)?;
    let handler = Self::wrap(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
    Ok(())
  }

  /// Registers a hook that runs after all `on` handlers of a step succeeded.
  pub fn after<F, Fut, UserErr>(&mut self, step_name: &str, handler_fn: F) -> WorkflowResult<()>
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + 'static,
  {
    self.ensure_step_exists(step_name)?;
    let handler = Self::wrap(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
    Ok(())
  }

  fn wrap<F, Fut, UserErr>(handler_fn: F) -> Handler<TData, Err>
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + 'static,
  {
    Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    })
  }

  /// Runs every step in order against `ctx_data`.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    debug!(pipeline = %self.name, num_steps = self.steps.len(), "Pipeline execution starting.");

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let step_span = info_span!(
        "pipeline_step",
        pipeline = %self.name,
        step_name = %step_def.name,
        step_index,
        optional = step_def.optional
      );
      let control = self.run_step(step_def, ctx_data.clone()).instrument(step_span).await?;
      if control == PipelineControl::Stop {
        info!(pipeline = %self.name, step_name = %step_def.name, "Pipeline stopped by a handler.");
        return Ok(PipelineResult::Stopped);
      }
    }

    debug!(pipeline = %self.name, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef, ctx_data: ContextData<TData>) -> Result<PipelineControl, Err> {
    let on_handlers = self.on.get(&step_def.name).map(Vec::as_slice).unwrap_or(&[]);
    let after_handlers = self.after.get(&step_def.name).map(Vec::as_slice).unwrap_or(&[]);

    if on_handlers.is_empty() {
      if step_def.optional {
        debug!("Optional step has no handlers, skipping.");
        return Ok(PipelineControl::Continue);
      }
      error!("Non-optional step has no handlers.");
      return Err(Err::from(WorkflowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for handler_fn in on_handlers.iter().chain(after_handlers.iter()) {
      match handler_fn(ctx_data.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
        Err(e) if step_def.optional => {
          warn!(error = %e, "Optional step failed, continuing.");
          return Ok(PipelineControl::Continue);
        }
        Err(e) => {
          error!(error = %e, "Step handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PipelineControl::Continue)
  }
}

impl<TData, Err> fmt::Debug for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: fmt::Display + From<WorkflowError> + Send + 'static,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipeline")
      .field("name", &self.name)
      .field("steps", &self.steps)
      .finish()
  }
}
