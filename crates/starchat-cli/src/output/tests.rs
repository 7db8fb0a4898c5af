// Tests for output formatting of decision-table results

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use starchat_core::StrictMode;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, false, Box::new(buffer.clone()));
    (writer, buffer)
}

fn sample_table() -> DecisionTable {
    let state = |name: &str, analyzer: &str, queries: Vec<&str>| {
        json!({"document": {
            "state": name,
            "analyzer": analyzer,
            "queries": queries,
            "bubble": "",
            "action": "",
            "version": 0,
            "success_value": "",
            "failure_value": "",
            "execution_order": 1,
            "action_input": {},
            "max_state_count": 0
        }})
    };
    let document = json!({
        "hits": [
            state("greeting", r#"reinforcementConjunction(search("greeting"), keyword("hi"))"#, vec!["hello"]),
            state("fallback", "", vec![]),
        ],
        "total": 2,
        "max_score": 0.0
    });
    DecisionTable::from_document(document, "4.2", StrictMode::Strict).unwrap()
}

#[test]
fn test_summary_counts() {
    let summary = TableSummary::from_table(&sample_table(), false);
    assert_eq!(summary.version, "4.2");
    assert_eq!(summary.dialect.as_deref(), Some("v4"));
    assert_eq!(summary.total, 2);
    assert_eq!(summary.with_keywords, 1);
    assert_eq!(
        summary.states[0],
        StateSummary {
            name: "greeting".to_string(),
            keywords: true,
            queries: 1,
            analyzer: None,
        }
    );
}

#[test]
fn test_summary_human_rendering() {
    let summary = TableSummary::from_table(&sample_table(), false);
    let rendered = OutputFormat::Human.format_table_summary(&summary).unwrap();

    assert!(rendered.starts_with("Decision table (version 4.2, v4 keys): 2 states, 1 with keywords"));
    assert!(rendered.contains("STATE     KEYWORDS  QUERIES"));
    assert!(rendered.contains("greeting  yes       1"));
    assert!(rendered.contains("fallback  no        0"));
    assert!(!rendered.contains("ANALYZER"));
}

#[test]
fn test_summary_json_skips_missing_analyzers() {
    let summary = TableSummary::from_table(&sample_table(), false);
    let rendered = OutputFormat::Json.format_table_summary(&summary).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert!(value["states"][0].get("analyzer").is_none());

    let summary = TableSummary::from_table(&sample_table(), true);
    let rendered = OutputFormat::Json.format_table_summary(&summary).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(
        value["states"][0]["analyzer"],
        json!(r#"reinforcementConjunction(search("greeting"), keyword("hi"))"#)
    );
}

#[test]
fn test_render_table_alignment() {
    let rows = vec![
        vec!["a".to_string(), "long value".to_string()],
        vec!["bbb".to_string(), "x".to_string()],
    ];
    assert_eq!(
        render_table(&["K", "V"], &rows),
        "K    V\na    long value\nbbb  x"
    );
}

#[test]
fn test_messages_only_in_human_format() {
    let (mut human, human_buffer) = writer(OutputFormat::Human);
    human.info("loading").unwrap();
    human.warning("careful").unwrap();
    human.success("done").unwrap();
    assert_eq!(
        human_buffer.contents(),
        "INFO: loading\nWARNING: careful\ndone\n"
    );

    let (mut json, json_buffer) = writer(OutputFormat::Json);
    json.info("loading").unwrap();
    json.warning("careful").unwrap();
    json.data(&json!({"total": 2})).unwrap();
    assert_eq!(json_buffer.contents(), "{\"total\":2}\n");
}

#[test]
fn test_yaml_data() {
    let (mut yaml, buffer) = writer(OutputFormat::Yaml);
    yaml.data(&json!({"states": ["greeting"]})).unwrap();
    assert_eq!(buffer.contents(), "states:\n- greeting\n\n");
}

#[test]
fn test_quiet_suppresses_info() {
    let buffer = SharedBuffer::default();
    let mut quiet = OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(buffer.clone()));
    quiet.info("hidden").unwrap();
    quiet.success("hidden").unwrap();
    quiet.error("shown").unwrap();
    assert_eq!(buffer.contents(), "ERROR: shown\n");
    assert!(quiet.spinner("working").is_none());
}
