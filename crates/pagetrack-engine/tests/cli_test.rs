use async_trait::async_trait;
use pagetrack_engine::cli::{
    CliError, FileOptions, OutputHandlers, ScriptSummary, execute_line, run_file,
};
use pagetrack_engine::collector::{Collector, DispatchError};
use pagetrack_engine::config::TrackerConfig;
use pagetrack_engine::protocol::EventKind;
use pagetrack_engine::session::SessionContext;
use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

#[derive(Default)]
struct MockCollector {
    posts: Mutex<Vec<(EventKind, Value)>>,
}

#[async_trait]
impl Collector for MockCollector {
    async fn post(&self, kind: EventKind, body: Value) -> Result<(), DispatchError> {
        self.posts.lock().unwrap().push((kind, body));
        Ok(())
    }

    async fn ping(&self) -> Result<(), DispatchError> {
        Ok(())
    }
}

fn start(collector: Arc<MockCollector>) -> SessionContext {
    SessionContext::builder(TrackerConfig::default())
        .collector(collector)
        .start("/")
        .expect("Failed to start")
}

#[tokio::test]
async fn test_goto_and_where() {
    let mut context = start(Arc::new(MockCollector::default()));

    let out = execute_line(&mut context, "goto /products").await.unwrap();
    assert_eq!(out, "Now on /products");

    let out = execute_line(&mut context, "where").await.unwrap();
    assert_eq!(out, "Path: /products (stored: /products)");
}

#[tokio::test]
async fn test_event_command_submits_custom_event() {
    let collector = Arc::new(MockCollector::default());
    let mut context = start(collector.clone());

    let out = execute_line(&mut context, "event signup plan=pro")
        .await
        .unwrap();
    assert_eq!(out, "Sent 'signup' from /");

    let posts = collector.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, EventKind::Events);
    assert_eq!(posts[0].1["details"]["data"], "plan=pro");
}

#[tokio::test]
async fn test_event_without_type_is_rejected() {
    let collector = Arc::new(MockCollector::default());
    let mut context = start(collector.clone());

    let err = execute_line(&mut context, "event").await.unwrap_err();
    assert_eq!(err, "Please enter an event type");
    assert!(collector.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_end_session_clears_stored_page() {
    let mut context = start(Arc::new(MockCollector::default()));

    execute_line(&mut context, "end-session").await.unwrap();
    let out = execute_line(&mut context, "where").await.unwrap();
    assert_eq!(out, "Path: / (stored: -)");
}

#[tokio::test]
async fn test_unknown_command() {
    let mut context = start(Arc::new(MockCollector::default()));
    let err = execute_line(&mut context, "scan").await.unwrap_err();
    assert_eq!(err, "Unknown command: scan");
}

fn ignore(_: &str) {}

const SILENT: OutputHandlers = OutputHandlers {
    out: ignore,
    err: ignore,
};

fn script() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create script");
    write!(
        file,
        "# visit a couple of pages\n\
         \n\
         goto /products\n\
         event signup plan=pro\n\
         \n\
         scan\n\
         # still here after the bad line?\n\
         goto /checkout\n"
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_script_stops_at_first_failing_line() {
    let collector = Arc::new(MockCollector::default());
    let mut context = start(collector.clone());
    let file = script();

    let err = run_file(
        &mut context,
        SILENT,
        file.path(),
        FileOptions {
            stop_on_error: true,
        },
    )
    .await
    .unwrap_err();

    match err {
        CliError::Line {
            number,
            line,
            message,
        } => {
            assert_eq!(number, 6);
            assert_eq!(line, "scan");
            assert_eq!(message, "Unknown command: scan");
        }
        other => panic!("Unexpected error: {}", other),
    }
    assert_eq!(context.current_path(), "/products");
    let posts = collector.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, EventKind::Events);
}

#[tokio::test]
async fn test_script_continues_past_failures_when_asked() {
    let mut context = start(Arc::new(MockCollector::default()));
    let file = script();

    let summary = run_file(
        &mut context,
        SILENT,
        file.path(),
        FileOptions {
            stop_on_error: false,
        },
    )
    .await
    .expect("Script should finish");

    assert_eq!(
        summary,
        ScriptSummary {
            executed: 4,
            failed: 1,
        }
    );
    assert_eq!(context.current_path(), "/checkout");
}

#[tokio::test]
async fn test_missing_script_is_reported() {
    let mut context = start(Arc::new(MockCollector::default()));
    let dir = tempfile::tempdir().unwrap();

    let err = run_file(
        &mut context,
        SILENT,
        dir.path().join("missing.txt"),
        FileOptions {
            stop_on_error: false,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::Script { .. }));
}
