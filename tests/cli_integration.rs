// CLI integration tests for decode/default/check flows.
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::{Value, json};

const SCHOOL: &str = r#"{
    "records": [
        {"name": "Student", "policy": "immutable",
         "fields": [{"name": "name", "type": "str"}, {"name": "id", "type": "UUID"}]},
        {"name": "Classroom", "policy": "mutable",
         "fields": [{"name": "name", "type": "str"},
                    {"name": "students", "type": "list[Student]"},
                    {"name": "rooms", "type": "dict[str, int]"}]}
    ]
}"#;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_classy");
    Command::new(exe)
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn parse_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    parse_json(line)
}

fn write_schema(dir: &tempfile::TempDir, text: &str) -> String {
    let path = dir.path().join("school.json");
    std::fs::write(&path, text).expect("write schema");
    path.to_str().expect("utf8 path").to_string()
}

#[test]
fn decode_prints_the_canonical_projection() {
    let temp = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(&temp, SCHOOL);

    let decode = cmd()
        .args([
            "decode",
            "--schema",
            &schema,
            "--type",
            "Classroom",
            r#"{"rooms": {"A": 1}, "name": "Art", "students": [{"name": "Ana", "id": "67e5504410b1426f9247bb680e5fe0c8"}], "extra": true}"#,
        ])
        .output()
        .expect("decode");
    assert!(decode.status.success(), "stderr: {}", String::from_utf8_lossy(&decode.stderr));
    let text = String::from_utf8(decode.stdout).expect("utf8");
    assert_eq!(
        text.trim_end(),
        r#"{"name":"Art","students":[{"name":"Ana","id":"67e55044-10b1-426f-9247-bb680e5fe0c8"}],"rooms":{"A":1}}"#
    );
}

#[test]
fn decode_reads_files_and_stdin() {
    let temp = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(&temp, SCHOOL);
    let input = temp.path().join("class.json");
    std::fs::write(&input, r#"{"name": "Art", "students": [], "rooms": {}}"#).expect("write input");

    let from_file = cmd()
        .args(["decode", "--schema", &schema, "--type", "Classroom", "-f"])
        .arg(&input)
        .output()
        .expect("decode file");
    assert!(from_file.status.success());
    assert_eq!(parse_json_line(&from_file.stdout)["name"], "Art");

    let mut child = cmd()
        .args(["decode", "--schema", &schema, "--type", "Classroom", "-f", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(br#"{"name": "Music", "students": [], "rooms": {"B": 2}}"#)
        .expect("write stdin");
    let from_stdin = child.wait_with_output().expect("wait");
    assert!(from_stdin.status.success());
    assert_eq!(
        parse_json_line(&from_stdin.stdout),
        json!({"name": "Music", "students": [], "rooms": {"B": 2}})
    );
}

#[test]
fn decode_errors_are_json_on_stderr_with_exit_codes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(&temp, SCHOOL);

    let mismatch = cmd()
        .args([
            "decode",
            "--schema",
            &schema,
            "--type",
            "Classroom",
            r#"{"name": "Art", "students": [{"name": 3, "id": "x"}], "rooms": {}}"#,
        ])
        .output()
        .expect("decode");
    assert_eq!(mismatch.status.code(), Some(6));
    let err = parse_json_line(&mismatch.stderr);
    assert_eq!(err["error"]["kind"], "Mismatch");
    assert_eq!(err["error"]["field"], "students[0].name");

    let missing = cmd()
        .args(["decode", "--schema", &schema, "--type", "Classroom", r#"{"name": "Art"}"#])
        .output()
        .expect("decode");
    assert_eq!(missing.status.code(), Some(8));
    assert_eq!(parse_json_line(&missing.stderr)["error"]["kind"], "Argument");

    let malformed = cmd()
        .args(["decode", "--schema", &schema, "--type", "Classroom", r#"{"name": "#])
        .output()
        .expect("decode");
    assert_eq!(malformed.status.code(), Some(4));
    let err = parse_json_line(&malformed.stderr);
    assert_eq!(err["error"]["kind"], "Json");
    assert!(err["error"]["hint"].as_str().unwrap().contains("context: Classroom"));

    let unknown = cmd()
        .args(["decode", "--schema", &schema, "--type", "Principal", "{}"])
        .output()
        .expect("decode");
    assert_eq!(unknown.status.code(), Some(2));
    let err = parse_json_line(&unknown.stderr);
    assert!(err["error"]["hint"].as_str().unwrap().contains("Student"));
}

#[test]
fn default_synthesizes_zero_values() {
    let temp = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(&temp, SCHOOL);

    let output = cmd()
        .args(["default", "--schema", &schema, "--type", "Classroom"])
        .output()
        .expect("default");
    assert!(output.status.success());
    assert_eq!(
        parse_json_line(&output.stdout),
        json!({"name": "", "students": [], "rooms": {}})
    );

    let first = cmd()
        .args(["default", "--schema", &schema, "--type", "Student"])
        .output()
        .expect("default");
    let second = cmd()
        .args(["default", "--schema", &schema, "--type", "Student"])
        .output()
        .expect("default");
    let first = parse_json_line(&first.stdout);
    let second = parse_json_line(&second.stdout);
    assert_eq!(first["name"], "");
    assert_ne!(first["id"], second["id"]);
}

#[test]
fn check_reports_ok_and_invalid_documents() {
    let temp = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(&temp, SCHOOL);

    let ok = cmd()
        .args(["check", "--schema", &schema, "--json"])
        .output()
        .expect("check");
    assert!(ok.status.success());
    let report = parse_json(std::str::from_utf8(&ok.stdout).expect("utf8"));
    assert_eq!(report["status"], "ok");
    assert_eq!(report["record_count"], 2);

    let broken = write_schema(
        &temp,
        r#"{"records": [
            {"name": "Loop", "policy": "immutable", "fields": [{"name": "next", "type": "Loop"}]},
            {"name": "Bare", "fields": [{"name": "xs", "type": "list"}]}
        ]}"#,
    );
    let invalid = cmd()
        .args(["check", "--schema", &broken, "--json"])
        .output()
        .expect("check");
    assert_eq!(invalid.status.code(), Some(5));
    let report = parse_json(std::str::from_utf8(&invalid.stdout).expect("utf8"));
    assert_eq!(report["status"], "invalid");
    let codes: Vec<&str> = report["issues"]
        .as_array()
        .expect("issues")
        .iter()
        .map(|issue| issue["code"].as_str().expect("code"))
        .collect();
    assert_eq!(codes, ["recursive-default", "missing-policy", "invalid-type"]);

    let human = cmd()
        .args(["check", "--schema", &broken])
        .output()
        .expect("check");
    assert_eq!(human.status.code(), Some(5));
    let text = String::from_utf8_lossy(&human.stdout);
    assert!(text.starts_with("invalid:"));
    assert!(text.contains("[missing-policy] Bare"));
}

#[test]
fn missing_schema_file_is_an_io_error() {
    let output = cmd()
        .args(["default", "--schema", "/definitely/not/here.json", "--type", "Student"])
        .output()
        .expect("default");
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(parse_json_line(&output.stderr)["error"]["kind"], "Io");
}

#[test]
fn usage_errors_exit_two_with_a_hint() {
    let output = cmd().args(["decode", "--type", "Student"]).output().expect("decode");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert_eq!(err["error"]["hint"], "Try `classy decode --help`.");
}

#[test]
fn completion_scripts_name_the_binary() {
    let output = cmd().args(["completion", "bash"]).output().expect("completion");
    assert!(output.status.success());
    let script = String::from_utf8_lossy(&output.stdout);
    assert!(script.contains("classy"));
}
