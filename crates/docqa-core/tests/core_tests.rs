use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docqa_core::config::{Config, Settings};
use docqa_core::data_processor::{ChunkingConfig, DataProcessor};
use docqa_core::types::{AskRequest, ChatMessage, PipelineEvent, Role};

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("report.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor.process_directory(dir, "s1").expect("process");

    assert_eq!(chunks.len(), 1, "one small paragraph becomes one chunk");
    assert_eq!(chunks[0].text, "Short text");
    assert_eq!(chunks[0].session_id, "s1");
    assert_eq!(chunks[0].document_id, "report");
    assert_eq!(chunks[0].id, "s1:report:0");
}

#[test]
fn paragraphs_become_separate_chunks_with_unique_ids() {
    let processor = DataProcessor::new();
    let chunks = processor.chunk_document("alpha bravo\n\n\n\ncharlie delta\n\necho", "doc", "s1");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["alpha bravo", "charlie delta", "echo"]);
    let ids: std::collections::HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
}

#[test]
fn same_file_name_in_different_folders_keeps_ids_unique() {
    let tmp = TempDir::new().unwrap();
    for quarter in ["q1", "q2"] {
        fs::create_dir(tmp.path().join(quarter)).unwrap();
        fs::write(tmp.path().join(quarter).join("report.txt"), format!("{quarter} revenue grew")).unwrap();
    }

    let chunks = DataProcessor::new().process_directory(tmp.path(), "s1").expect("process");
    let ids: std::collections::HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(ids.len(), 2, "chunk ids collide: {ids:?}");
    let docs: Vec<&str> = chunks.iter().map(|c| c.document_id.as_str()).collect();
    assert_eq!(docs, vec!["q1/report", "q2/report"]);
    assert_eq!(chunks[0].id, "s1:q1/report:0");
}

#[test]
fn crlf_paragraph_breaks_are_honoured() {
    let processor = DataProcessor::new();
    let chunks = processor.chunk_document("para one\r\nstill one\r\n\r\npara two\r\n", "doc", "s1");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["para one\nstill one", "para two"]);
}

#[test]
fn oversized_paragraph_is_split_with_overlap() {
    let processor = DataProcessor::with_config(ChunkingConfig { max_tokens: 10, overlap_percent: 0.5, words_per_chunk: 10 });
    let words: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
    let chunks = processor.chunk_document(&words.join(" "), "doc", "s1");
    assert!(chunks.len() >= 3);
    assert!(chunks[0].text.starts_with("w0 "));
    // second window starts halfway through the first
    assert!(chunks[1].text.starts_with("w5 "));
    assert!(chunks.last().unwrap().text.ends_with("w24"));
}

#[test]
fn settings_defaults_validate() {
    let settings = Settings::default();
    settings.validate().expect("defaults are valid");
    assert!((settings.pipeline.rrf_k - 60.0).abs() < f64::EPSILON);
    assert_eq!(settings.pipeline.max_queries, 5);
    assert_eq!(settings.pipeline.lexical_pool, 10);
    assert_eq!(settings.pipeline.context_top_k, 10);
    assert_eq!(settings.pipeline.stage_timeout_secs, 30);
}

#[test]
fn config_merges_toml_file_over_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[pipeline]\nrrf_k = 40.0\n\n[data]\ntable_name = \"t\"\n").unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[pipeline]\nvector_top_k = 3\n").unwrap();

    let config = Config::load_from(tmp.path(), "test").expect("load");
    let settings = config.settings().expect("settings");
    assert!((settings.pipeline.rrf_k - 40.0).abs() < f64::EPSILON);
    assert_eq!(settings.pipeline.vector_top_k, 3);
    assert_eq!(settings.data.table_name, "t");
    assert_eq!(settings.pipeline.max_queries, 5);
    let k: f64 = config.get("pipeline.rrf_k").expect("get");
    assert!((k - 40.0).abs() < f64::EPSILON);
}

#[test]
fn config_rejects_invalid_limits() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[pipeline]\ncontext_top_k = 0\n").unwrap();
    assert!(Config::load_from(tmp.path(), "test").is_err());
}

#[test]
fn zero_lexical_pool_is_rejected() {
    let mut settings = Settings::default();
    settings.pipeline.lexical_pool = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn latest_user_query_skips_blank_and_non_user_messages() {
    let request = AskRequest::new("s1", vec![
        ChatMessage::user("first question"),
        ChatMessage::assistant("an answer"),
        ChatMessage::user("   "),
        ChatMessage::new(Role::Tool, "tool output"),
    ]);
    assert_eq!(request.latest_user_query(), Some("first question"));
    assert_eq!(AskRequest::new("s1", vec![]).latest_user_query(), None);
}

#[test]
fn events_serialize_to_wire_shapes() {
    let json = |e: &PipelineEvent| serde_json::to_string(e).unwrap();
    assert_eq!(json(&PipelineEvent::progress("Searching")), r#"{"message":"Searching"}"#);
    assert_eq!(json(&PipelineEvent::Queries { queries: vec!["a".into()] }), r#"{"queries":["a"]}"#);
    assert_eq!(json(&PipelineEvent::content("tok")), r#"{"chunk":"tok"}"#);
    assert_eq!(json(&PipelineEvent::error("bad")), r#"{"error":"bad"}"#);
}

#[test]
fn request_deserializes_camel_case_with_tool_role() {
    let request: AskRequest = serde_json::from_str(
        r#"{"sessionId":"s1","messages":[{"role":"user","content":"hi"},{"role":"tool","content":"x"}]}"#,
    ).unwrap();
    assert_eq!(request.session_id, "s1");
    assert_eq!(request.messages[1].role, Role::Tool);
}
