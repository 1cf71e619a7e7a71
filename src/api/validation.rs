//! Purpose: Provide a stable, serializable schema check report model.
//! Exports: `SchemaReport`, `SchemaStatus`, `SchemaIssue`, `check_document`.
//! Role: Eager counterpart of the lazy per-call checks; backs `classy check`.
//! Invariants: Reports are additive-only; each record contributes at most one issue per code.
//! Invariants: Checking never constructs anything the caller can observe.
use std::path::PathBuf;

use serde_json::{Value as JsonValue, json};

use crate::core::registry::{Registry, SchemaDocument};
use crate::core::schema::fields_of;
use crate::core::synth;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaStatus {
    Ok,
    Invalid,
}

impl SchemaStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Invalid => "invalid",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaIssue {
    pub code: String,
    pub record: String,
    pub field: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaReport {
    pub path: Option<PathBuf>,
    pub status: SchemaStatus,
    pub record_count: usize,
    pub issues: Vec<SchemaIssue>,
    pub issue_count: usize,
    pub remediation_hints: Vec<String>,
}

impl SchemaReport {
    pub fn ok(record_count: usize) -> Self {
        Self {
            path: None,
            status: SchemaStatus::Ok,
            record_count,
            issues: Vec::new(),
            issue_count: 0,
            remediation_hints: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn set_issues(mut self, issues: Vec<SchemaIssue>) -> Self {
        self.issue_count = issues.len();
        self.remediation_hints = remediation_hints(&issues);
        self.issues = issues;
        self.status = if self.issue_count == 0 {
            SchemaStatus::Ok
        } else {
            SchemaStatus::Invalid
        };
        self
    }

    pub fn to_json(&self) -> JsonValue {
        let issues: Vec<JsonValue> = self
            .issues
            .iter()
            .map(|issue| {
                let mut entry = json!({
                    "code": issue.code,
                    "record": issue.record,
                    "message": issue.message,
                });
                if let (Some(field), Some(map)) = (&issue.field, entry.as_object_mut()) {
                    map.insert("field".to_string(), JsonValue::String(field.clone()));
                }
                entry
            })
            .collect();
        let mut out = json!({
            "status": self.status.label(),
            "record_count": self.record_count,
            "issue_count": self.issue_count,
            "issues": issues,
        });
        if let Some(map) = out.as_object_mut() {
            if let Some(path) = &self.path {
                map.insert("path".to_string(), JsonValue::String(path.display().to_string()));
            }
            if !self.remediation_hints.is_empty() {
                map.insert("remediation_hints".to_string(), json!(self.remediation_hints));
            }
        }
        out
    }
}

/// Loads `doc` and checks every record the way decode/default would, eagerly.
pub fn check_document(doc: &SchemaDocument) -> SchemaReport {
    let (registry, rejected) = Registry::load_document(doc);
    let mut issues: Vec<SchemaIssue> = rejected
        .into_iter()
        .map(|rejected| SchemaIssue {
            code: rejected.reason.code().to_string(),
            record: rejected.record,
            field: rejected.error.field().map(str::to_string),
            message: rejected.error.message().unwrap_or("rejected").to_string(),
        })
        .collect();
    issues.extend(check_registry(&registry));
    SchemaReport::ok(doc.records.len()).set_issues(issues)
}

fn check_registry(registry: &Registry) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    for schema in registry.schemas() {
        let name = schema.name().to_string();
        let mut flagged = false;
        if let Err(err) = schema.require_policy() {
            issues.push(issue("missing-policy", &name, &err));
            flagged = true;
        }
        if let Err(err) = fields_of(schema, registry) {
            issues.push(issue("invalid-type", &name, &err));
            flagged = true;
        }
        if flagged {
            continue;
        }
        // Nested failures belong to the nested record; only cycles are reported here.
        match synth::default_record(schema, registry) {
            Err(err) if err.cycle().is_some() => {
                issues.push(issue("recursive-default", &name, &err));
            }
            _ => {}
        }
    }
    issues
}

fn issue(code: &str, record: &str, err: &crate::core::error::Error) -> SchemaIssue {
    SchemaIssue {
        code: code.to_string(),
        record: record.to_string(),
        field: err.field().map(str::to_string),
        message: err.message().unwrap_or("invalid").to_string(),
    }
}

fn remediation_hints(issues: &[SchemaIssue]) -> Vec<String> {
    let mut hints = Vec::new();
    let mut push = |code: &str, hint: &str| {
        if issues.iter().any(|issue| issue.code == code) && !hints.iter().any(|h: &String| h == hint) {
            hints.push(hint.to_string());
        }
    };
    push("missing-policy", "Add \"policy\": \"mutable\" or \"immutable\" to each record.");
    push("invalid-type", "Use scalar names, list[T], tuple[...], set[T], dict[K, V], or declared record names.");
    push("unknown-parent", "Declare parent records before the records that extend them.");
    push("recursive-default", "Break record cycles with a list, set, or dict field.");
    hints
}
