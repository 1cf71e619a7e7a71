//! Purpose: Hold top-level CLI command dispatch for `classy`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Records are printed as their `to_dict` projection; errors propagate unchanged.
//! Invariants: `check` exits with the Schema exit code whenever the report has issues.

use super::*;

use classy::api::{
    SchemaDocument, SchemaReport, SchemaStatus, check_document, default_record, from_json,
};

pub(super) fn dispatch_command(command: Command, output: OutputMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "classy", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Decode {
            schema,
            type_name,
            data,
            file,
        } => {
            let registry = load_registry(&schema)?;
            let record_type = registry.require(&type_name)?;
            let text = read_input(data, file.as_deref())?;
            let record = from_json(&record_type, &text, &registry)?;
            emit_json(Value::Object(record.to_dict()), output);
            Ok(RunOutcome::ok())
        }
        Command::Synth { schema, type_name } => {
            let registry = load_registry(&schema)?;
            let record_type = registry.require(&type_name)?;
            let record = default_record(&record_type, &registry)?;
            emit_json(Value::Object(record.to_dict()), output);
            Ok(RunOutcome::ok())
        }
        Command::Check { schema, json } => {
            let document = SchemaDocument::from_path(&schema)?;
            let report = check_document(&document).with_path(&schema);
            if json {
                emit_json(report.to_json(), output);
            } else {
                emit_check_human(&report, output.color);
            }
            let exit_code = match report.status {
                SchemaStatus::Ok => 0,
                SchemaStatus::Invalid => to_exit_code(ErrorKind::Schema),
            };
            Ok(RunOutcome::with_code(exit_code))
        }
    }
}

fn emit_check_human(report: &SchemaReport, color_mode: ColorMode) {
    let use_color = color_mode.use_color(io::stdout().is_terminal());
    let path = report
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "schema".to_string());
    match report.status {
        SchemaStatus::Ok => {
            println!(
                "{} {path}: {} record type(s)",
                colorize_label("ok:", use_color, AnsiColor::Green),
                report.record_count
            );
        }
        SchemaStatus::Invalid => {
            println!(
                "{} {path}: {} issue(s) in {} record type(s)",
                colorize_label("invalid:", use_color, AnsiColor::Red),
                report.issue_count,
                report.record_count
            );
            for issue in &report.issues {
                let location = match &issue.field {
                    Some(field) => format!("{}.{field}", issue.record),
                    None => issue.record.clone(),
                };
                println!("  [{}] {location}: {}", issue.code, issue.message);
            }
            for hint in &report.remediation_hints {
                println!("{} {hint}", colorize_label("hint:", use_color, AnsiColor::Yellow));
            }
        }
    }
}
