use std::path::PathBuf;

use iflow_generator::{
    docs::{DocFormat, bpml::Activity, parse_bpml_file},
    document_bpml_file,
    error::Error,
};

fn data_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(file)
}

#[test]
fn test_parse_sample_process() {
    let process = parse_bpml_file(data_path("sample_process.bpml")).unwrap();

    assert_eq!(process.name, "EDI_Inbound_850");
    assert_eq!(process.rules.len(), 1);

    let summary = process.summary();
    assert_eq!(summary.operations, 4);
    assert_eq!(
        summary.participants,
        vec!["HTTPClientAdapter".to_string(), "SMTP_SEND_ADAPTER".to_string(), "TranslationService".to_string()]
    );

    let participants = process.participants();
    assert_eq!(participants["TranslationService"], vec!["Translate 850".to_string(), "Log Fault".to_string()]);

    let Activity::Sequence { activities, .. } = &process.activities[0] else {
        panic!("expected the main sequence");
    };
    assert!(matches!(&activities[2], Activity::OnFault { code: Some(code), .. } if code == "*"));
}

#[test]
fn test_document_as_markdown() {
    let markdown = document_bpml_file(data_path("sample_process.bpml"), DocFormat::Markdown).unwrap();

    assert!(markdown.starts_with("# Business Process `EDI_Inbound_850`"));
    assert!(markdown.contains("## Overview"));
    assert!(markdown.contains("## Participants"));
    assert!(markdown.contains("## Activity Outline"));
    assert!(markdown.contains("## Rules"));
    assert!(markdown.contains("- `TranslationService`: used by `Translate 850`, `Log Fault`"));
    assert!(markdown.contains("- if not `IsTranslated` then `Report Error`"));
    assert!(markdown.contains("**Assign** `ErrorText` from `TranslationReport/Message/text()` (append)"));
    assert!(markdown.contains("| IsTranslated | `TranslationReport/Status = 'SUCCESS'` |"));
}

#[test]
fn test_document_as_json() {
    let json = document_bpml_file(data_path("sample_process.bpml"), DocFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["summary"]["name"], "EDI_Inbound_850");
    assert_eq!(value["summary"]["rules"], 1);
    assert_eq!(value["process"]["activities"][0]["kind"], "sequence");
    assert_eq!(value["process"]["activities"][0]["activities"][0]["kind"], "operation");
    assert_eq!(value["process"]["activities"][0]["activities"][0]["participant"], "TranslationService");
}

#[test]
fn test_document_missing_file() {
    let result = document_bpml_file(data_path("missing.bpml"), DocFormat::Markdown);
    assert!(matches!(result, Err(Error::IoError(_))));
}
