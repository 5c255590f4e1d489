// tests/workflow_tests.rs
mod common;

use common::setup_tracing;
use ticketing_core::fulfillment::CHECKOUT_STEPS;
use ticketing_core::workflow::{ContextData, Pipeline, PipelineControl, PipelineResult, WorkflowError};

#[derive(Clone, Debug, Default)]
struct TestContext {
  steps_executed: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum TestError {
  #[error("workflow: {0}")]
  Workflow(#[from] WorkflowError),
  #[error("handler failed: {0}")]
  Handler(String),
}

type TestPipeline = Pipeline<TestContext, TestError>;

fn record(name: &'static str) -> impl Fn(ContextData<TestContext>) -> std::future::Ready<Result<PipelineControl, TestError>> {
  move |ctx| {
    ctx.write().steps_executed.push(name.to_string());
    std::future::ready(Ok(PipelineControl::Continue))
  }
}

fn executed(ctx: &ContextData<TestContext>) -> Vec<String> {
  ctx.read().steps_executed.clone()
}

#[tokio::test]
async fn test_steps_run_in_order_with_after_hooks() {
  setup_tracing();
  let mut p = TestPipeline::new("ordered", &[("a", false), ("b", false), ("c", false)]).unwrap();
  p.on("a", record("a")).unwrap();
  p.after("a", record("a.after")).unwrap();
  p.on("b", record("b")).unwrap();
  p.on("c", record("c")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  let result = p.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  assert_eq!(executed(&ctx), vec!["a", "a.after", "b", "c"]);
}

#[tokio::test]
async fn test_stop_halts_the_run() {
  setup_tracing();
  let mut p = TestPipeline::new("stopping", &[("a", false), ("halt", false), ("c", false)]).unwrap();
  p.on("a", record("a")).unwrap();
  p.on("halt", |ctx: ContextData<TestContext>| async move {
    ctx.write().steps_executed.push("halt".to_string());
    Ok::<_, TestError>(PipelineControl::Stop)
  })
  .unwrap();
  p.on("c", record("c")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(p.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert_eq!(executed(&ctx), vec!["a", "halt"]);
}

#[tokio::test]
async fn test_required_step_error_propagates() {
  setup_tracing();
  let mut p = TestPipeline::new("failing", &[("a", false), ("bad", false), ("c", false)]).unwrap();
  p.on("a", record("a")).unwrap();
  p.on("bad", |_ctx: ContextData<TestContext>| async move {
    Err::<PipelineControl, _>(TestError::Handler("boom".to_string()))
  })
  .unwrap();
  p.after("bad", record("bad.after")).unwrap();
  p.on("c", record("c")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  let err = p.run(ctx.clone()).await.unwrap_err();
  assert!(matches!(err, TestError::Handler(ref m) if m == "boom"));
  assert_eq!(executed(&ctx), vec!["a"]);
}

#[tokio::test]
async fn test_optional_step_failure_is_logged_and_skipped() {
  setup_tracing();
  let mut p = TestPipeline::new("best_effort", &[("a", false), ("notify", true), ("c", false)]).unwrap();
  p.on("a", record("a")).unwrap();
  p.on("notify", |_ctx: ContextData<TestContext>| async move {
    Err::<PipelineControl, _>(TestError::Handler("mail server down".to_string()))
  })
  .unwrap();
  p.on("c", record("c")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(p.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(executed(&ctx), vec!["a", "c"]);
}

#[tokio::test]
async fn test_missing_handlers() {
  setup_tracing();
  let mut p = TestPipeline::new("gaps", &[("a", false), ("optional", true), ("required", false)]).unwrap();
  p.on("a", record("a")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  let err = p.run(ctx.clone()).await.unwrap_err();
  assert!(matches!(
    err,
    TestError::Workflow(WorkflowError::HandlerMissing { ref step_name }) if step_name == "required"
  ));
  assert_eq!(executed(&ctx), vec!["a"]);
}

#[tokio::test]
async fn test_step_definition_errors() {
  setup_tracing();
  assert!(matches!(
    TestPipeline::new("dup", &[("a", false), ("a", true)]),
    Err(WorkflowError::DuplicateStep { .. })
  ));

  let mut p = TestPipeline::new("edit", &[("a", false), ("c", false)]).unwrap();
  assert!(matches!(p.on("zzz", record("zzz")), Err(WorkflowError::StepNotFound { .. })));
  assert!(matches!(p.after("zzz", record("zzz")), Err(WorkflowError::StepNotFound { .. })));
  let names: Vec<&str> = p.steps().iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, vec!["a", "c"]);
}

#[tokio::test]
async fn test_checkout_pipeline_layout() {
  let h = common::Harness::new();
  let pipeline = h.fulfillment.checkout_pipeline();
  assert_eq!(pipeline.name(), "checkout");

  let layout: Vec<(&str, bool)> = pipeline.steps().iter().map(|s| (s.name.as_str(), s.optional)).collect();
  assert_eq!(layout, CHECKOUT_STEPS.to_vec());
  assert_eq!(
    layout.iter().filter(|(_, optional)| *optional).map(|(n, _)| *n).collect::<Vec<_>>(),
    vec!["announce_purchase", "push_updates"]
  );
}
