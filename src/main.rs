//! Purpose: `classy` CLI entry point: decode, default, and check records from a schema document.
//! Role: Binary crate root; parses args, installs logging, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (JSON, or a human summary for `check`).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All decoding and default synthesis goes through `classy::api`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::error::ErrorKind as ClapErrorKind;
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod color_json;
mod command_dispatch;

use classy::api::{Error, ErrorKind, Registry, to_exit_code};
use color_json::colorize_json;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing(cli.verbose);
    let color_mode = cli.color;
    let output = OutputMode {
        color: color_mode,
        pretty: cli.pretty,
    };

    command_dispatch::dispatch_command(cli.command, output)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

/// `-v` forces debug and `-vv` trace; otherwise `RUST_LOG` applies, defaulting to warn.
fn init_tracing(verbose: u8) {
    let env_filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "classy",
    version,
    about = "Decode, default, and check value-object records declared in a JSON schema",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Record types come from a schema document:
  {"records": [{"name": "Student", "policy": "immutable",
                "fields": [{"name": "name", "type": "str"}]}]}
"#,
    after_help = r#"EXAMPLES
  $ classy check --schema school.json
  $ classy decode --schema school.json --type Student '{"name": "Sarah"}'
  $ classy default --schema school.json --type Classroom --pretty
  $ cat class.json | classy decode --schema school.json --type Classroom -f -

LEARN MORE
  $ classy <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pretty: bool,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Log to stderr: -v debug, -vv trace (default: RUST_LOG or warn)"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct OutputMode {
    color: ColorMode,
    pretty: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Decode JSON into a record and print its canonical form",
        after_help = r#"EXAMPLES
  $ classy decode --schema school.json --type Student '{"name": "Sarah", "age": 21}'
  $ classy decode --schema school.json --type Classroom -f class.json

NOTES
  - Unknown input keys are ignored; missing declared fields fail.
  - Input is read from stdin when neither DATA nor --file is given."#
    )]
    Decode {
        #[arg(long, help = "Schema document (JSON)", value_hint = ValueHint::FilePath)]
        schema: PathBuf,
        #[arg(long = "type", value_name = "NAME", help = "Record type to decode as")]
        type_name: String,
        #[arg(help = "Inline JSON object", conflicts_with = "file")]
        data: Option<String>,
        #[arg(
            short = 'f',
            long = "file",
            value_name = "FILE",
            help = "Read JSON from FILE, or stdin with '-'",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
    },
    #[command(
        about = "Print a synthesized default record",
        after_help = r#"EXAMPLES
  $ classy default --schema school.json --type Student

NOTES
  - Containers default empty; ids, dates, and times are fresh per call."#
    )]
    #[command(name = "default")]
    Synth {
        #[arg(long, help = "Schema document (JSON)", value_hint = ValueHint::FilePath)]
        schema: PathBuf,
        #[arg(long = "type", value_name = "NAME", help = "Record type to synthesize")]
        type_name: String,
    },
    #[command(
        about = "Check every record type in a schema document",
        after_help = r#"EXAMPLES
  $ classy check --schema school.json
  $ classy check --schema school.json --json

NOTES
  - Reports missing policies, bad field types, unknown parents, and recursive defaults."#
    )]
    Check {
        #[arg(long, help = "Schema document (JSON)", value_hint = ValueHint::FilePath)]
        schema: PathBuf,
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_registry(path: &Path) -> Result<Registry, Error> {
    Registry::from_path(path).map_err(|err| {
        if err.hint().is_some() {
            err
        } else {
            err.with_hint(format!("Check the schema document at {}.", path.display()))
        }
    })
}

fn read_input(data: Option<String>, file: Option<&str>) -> Result<String, Error> {
    if let Some(data) = data {
        return Ok(data);
    }
    match file {
        Some("-") => read_stdin(),
        Some(path) => fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read {path}"))
                .with_source(err)
        }),
        None if io::stdin().is_terminal() => Err(Error::new(ErrorKind::Usage)
            .with_message("no input provided")
            .with_hint("Pass a JSON object, use --file FILE, or pipe JSON on stdin.")),
        None => read_stdin(),
    }
}

fn read_stdin() -> Result<String, Error> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read stdin")
            .with_source(err)
    })?;
    Ok(text)
}

fn emit_json(value: Value, output: OutputMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = output.color.use_color(is_tty);
    let pretty = output.pretty || is_tty || use_color;
    let json = if pretty {
        if use_color {
            colorize_json(&value, true)
        } else {
            serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
        }
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
    Green,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Schema => "invalid type declaration",
        ErrorKind::MissingPolicy => "missing mutability policy",
        ErrorKind::PolicyConflict => "conflicting mutability policy",
        ErrorKind::Parse => "invalid scalar text",
        ErrorKind::NotImplemented => "operation not implemented for this record type",
        ErrorKind::Frozen => "record is immutable",
        ErrorKind::Argument => "invalid record arguments",
        ErrorKind::Mismatch => "value does not match its declared type",
        ErrorKind::Json => "invalid json",
        ErrorKind::Usage => "usage error",
        ErrorKind::Io => "i/o error",
        ErrorKind::Internal => "internal error",
    }
    .to_string()
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));
    if let Some(field) = err.field() {
        lines.push(format!(
            "{} {field}",
            colorize_label("field:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check that the file exists and is readable.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Re-run with -v for details, and report the issue if it persists.")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);
    let Some(usage) = usage else {
        return "Try `classy --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let subcommand = tokens
        .iter()
        .skip_while(|token| **token != "classy")
        .nth(1)
        .filter(|token| !token.starts_with(['-', '<', '[']));
    match subcommand {
        Some(name) => format!("Try `classy {name} --help`."),
        None => "Try `classy --help`.".to_string(),
    }
}
