//! End-to-end pipeline tests against scripted model and database doubles.

mod fixtures;

use fixtures::{
    ANALYSIS_RESPONSE, DATEDIFF_RESPONSE, GOOD_RESPONSE, GOOD_SQL, HALLUCINATED_RESPONSE,
    REFUSAL_RESPONSE, SCHEMA_DOC,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tabletalk_catalog::{MockAdapter, QueryRows};
use tabletalk_core::SchemaDoc;
use tabletalk_engine::{AskRequest, Pipeline, PipelineError, EMPTY_RESULT_ANALYSIS};
use tabletalk_llm::{Example, ExampleSet, ScriptedModel};

fn sales_doc() -> SchemaDoc {
    let parsed = tabletalk_doc::parse_str(SCHEMA_DOC, "fixture.md");
    assert!(
        parsed.diagnostics.is_empty(),
        "fixture doc should parse cleanly: {:?}",
        parsed.diagnostics
    );
    parsed.doc
}

fn category_rows() -> QueryRows {
    QueryRows::new(
        vec!["category".to_string(), "avg_price".to_string()],
        vec![
            vec![Some("Chairs".to_string()), Some("1450.00".to_string())],
            vec![Some("Desks".to_string()), Some("1280.50".to_string())],
            vec![Some("Lamps".to_string()), Some("349.99".to_string())],
        ],
    )
}

#[tokio::test]
async fn test_ask_happy_path() {
    let model = Arc::new(ScriptedModel::new([GOOD_RESPONSE, ANALYSIS_RESPONSE]));
    let adapter = Arc::new(MockAdapter::new());
    adapter.respond_with("avg_price", category_rows()).await;

    let pipeline = Pipeline::new(sales_doc(), model.clone(), adapter.clone());
    let outcome = pipeline
        .ask(&AskRequest::question("What is the average price per category?"))
        .await
        .unwrap();

    assert_eq!(outcome.sql, GOOD_SQL);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.rows.as_ref().map(QueryRows::row_count), Some(3));
    assert_eq!(outcome.analysis.as_deref(), Some(ANALYSIS_RESPONSE));

    // The executed statement is the one EXPLAIN vetted.
    let calls = adapter.calls().await;
    assert_eq!(calls[0], format!("explain {GOOD_SQL}"));
    assert_eq!(calls[1], format!("run_query {GOOD_SQL}"));
}

#[tokio::test]
async fn test_grounding_failure_consumes_attempt() {
    let model = Arc::new(ScriptedModel::new([HALLUCINATED_RESPONSE, GOOD_RESPONSE]));
    let adapter = Arc::new(MockAdapter::new());

    let pipeline = Pipeline::new(sales_doc(), model.clone(), adapter.clone());
    let generated = pipeline
        .generate_sql(&AskRequest::question("What is the average price per category?"))
        .await
        .unwrap();

    assert_eq!(generated.sql, GOOD_SQL);
    assert_eq!(generated.attempts, 2);

    let prompts = model.prompts().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Your previous query was rejected."));
    assert!(prompts[1].contains("orders"));

    // The hallucinated statement never reached the database.
    let calls = adapter.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], format!("explain {GOOD_SQL}"));
}

#[tokio::test]
async fn test_explain_failure_triggers_repair_prompt() {
    let model = Arc::new(ScriptedModel::new([DATEDIFF_RESPONSE, GOOD_RESPONSE]));
    let adapter = Arc::new(MockAdapter::new());
    adapter
        .fail_explain_when("DATEDIFF", "function datediff(date, date) does not exist")
        .await;

    let pipeline = Pipeline::new(sales_doc(), model.clone(), adapter.clone());
    let generated = pipeline
        .generate_sql(&AskRequest::question("How long between orders?"))
        .await
        .unwrap();

    assert_eq!(generated.sql, GOOD_SQL);
    assert_eq!(generated.attempts, 2);

    let prompts = model.prompts().await;
    assert!(prompts[1].contains("Failed SQL:"));
    assert!(prompts[1].contains("DATEDIFF(order_date, order_date)"));
    assert!(prompts[1].contains("function datediff(date, date) does not exist"));
}

#[tokio::test]
async fn test_refusal_is_surfaced() {
    let model = Arc::new(ScriptedModel::single(REFUSAL_RESPONSE));
    let adapter = Arc::new(MockAdapter::new());

    let pipeline = Pipeline::new(sales_doc(), model, adapter.clone());
    let err = pipeline
        .generate_sql(&AskRequest::question("What is our churn rate?"))
        .await
        .unwrap_err();

    match err {
        PipelineError::Refused { message } => assert_eq!(message, REFUSAL_RESPONSE),
        other => panic!("expected refusal, got {other:?}"),
    }

    // A refusal is terminal; nothing was sent to the database.
    assert!(adapter.calls().await.is_empty());
}

#[tokio::test]
async fn test_retries_exhausted_reports_last_error() {
    let model = Arc::new(ScriptedModel::new([
        HALLUCINATED_RESPONSE,
        HALLUCINATED_RESPONSE,
        HALLUCINATED_RESPONSE,
    ]));
    let adapter = Arc::new(MockAdapter::new());

    let pipeline = Pipeline::new(sales_doc(), model.clone(), adapter);
    let err = pipeline
        .generate_sql(&AskRequest::question("Revenue by region?"))
        .await
        .unwrap_err();

    match err {
        PipelineError::RetriesExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("orders"));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(model.prompts().await.len(), 3);
}

#[tokio::test]
async fn test_no_execute_still_vets_but_skips_run() {
    let model = Arc::new(ScriptedModel::single(GOOD_RESPONSE));
    let adapter = Arc::new(MockAdapter::new());

    let pipeline =
        Pipeline::new(sales_doc(), model, adapter.clone()).with_execution(false);
    let outcome = pipeline
        .ask(&AskRequest::question("What is the average price per category?"))
        .await
        .unwrap();

    assert_eq!(outcome.sql, GOOD_SQL);
    assert!(outcome.rows.is_none());
    assert!(outcome.analysis.is_none());

    let calls = adapter.calls().await;
    assert!(calls.iter().any(|c| c.starts_with("explain ")));
    assert!(!calls.iter().any(|c| c.starts_with("run_query ")));
}

#[tokio::test]
async fn test_empty_result_skips_analysis_model_call() {
    // One scripted response: if analysis asked the model, ask would fail.
    let model = Arc::new(ScriptedModel::single(GOOD_RESPONSE));
    let adapter = Arc::new(MockAdapter::new());

    let pipeline = Pipeline::new(sales_doc(), model.clone(), adapter);
    let outcome = pipeline
        .ask(&AskRequest::question("What is the average price per category?"))
        .await
        .unwrap();

    assert_eq!(outcome.rows.as_ref().map(QueryRows::row_count), Some(0));
    assert_eq!(outcome.analysis.as_deref(), Some(EMPTY_RESULT_ANALYSIS));
    assert_eq!(model.remaining().await, 0);
}

#[tokio::test]
async fn test_examples_and_user_feedback_shape_the_prompt() {
    let model = Arc::new(ScriptedModel::single(GOOD_RESPONSE));
    let adapter = Arc::new(MockAdapter::new());

    let corpus = ExampleSet::from_examples(vec![Example::new(
        "How many orders were placed?",
        "SELECT COUNT(*) FROM ssa_order_data;",
    )]);
    let pipeline = Pipeline::new(sales_doc(), model.clone(), adapter).with_examples(corpus);

    let req = AskRequest::question("What is the average price per category?").with_refinement(
        "SELECT mrp FROM ssa_category_data",
        "I wanted one row per category, not raw prices",
    );
    pipeline.generate_sql(&req).await.unwrap();

    let prompts = model.prompts().await;
    assert!(prompts[0].contains("Examples:"));
    assert!(prompts[0].contains("How many orders were placed?"));
    assert!(prompts[0].contains("Previous SQL: SELECT mrp FROM ssa_category_data"));
    assert!(prompts[0].contains("one row per category"));
    assert!(prompts[0].contains("Table: ssa_order_data"));
}

#[tokio::test]
async fn test_record_good_example_appends_to_corpus() {
    let path = std::env::temp_dir().join(format!(
        "tabletalk-engine-feedback-{}.txt",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let pipeline = Pipeline::new(
        sales_doc(),
        Arc::new(ScriptedModel::single(GOOD_RESPONSE)),
        Arc::new(MockAdapter::new()),
    )
    .with_examples_path(&path);

    pipeline
        .record_good_example("What is the average price per category?", GOOD_SQL)
        .unwrap();

    let corpus = ExampleSet::load(&path).unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(
        corpus.examples()[0].question,
        "What is the average price per category?"
    );

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_health_check_fails_fast() {
    let pipeline = Pipeline::new(
        sales_doc(),
        Arc::new(ScriptedModel::unhealthy()),
        Arc::new(MockAdapter::new()),
    );
    assert!(pipeline.health_check().await.is_err());

    let pipeline = Pipeline::new(
        sales_doc(),
        Arc::new(ScriptedModel::single(GOOD_RESPONSE)),
        Arc::new(MockAdapter::new().with_connection_failure()),
    );
    assert!(pipeline.health_check().await.is_err());
}
