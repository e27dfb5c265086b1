//! Running gettext command line tools and reading their diagnostics.
//!
//! Tools report problems on stderr as `<file>:<line>[:<col>]: <message>`.
//! Lines indented with whitespace continue the previous message. Anything
//! else is logged and kept as unrecognized output.

use std::process::Command;

use encoding_rs::WINDOWS_1252;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::error::Error;

lazy_static! {
    static ref DIAGNOSTIC_REGEX: Regex = Regex::new(r"^(.*?):([0-9]+)(?::([0-9]+))?: (.*)$").unwrap();
}

/// One diagnostic reported by a gettext tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GettextError {
    pub file: String,
    pub line: usize,
    pub column: Option<usize>,
    /// Message text; continuation lines are joined with `\n`.
    pub message: String,
}

/// Raw result of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stderr: String,
}

/// Parsed result of running a gettext tool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolReport {
    pub exit_code: i32,
    pub errors: Vec<GettextError>,
    /// Stderr messages that did not match the diagnostic pattern.
    pub unrecognized: Vec<String>,
}

impl ToolReport {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes command lines on behalf of the catalog.
pub trait ToolRunner {
    /// Runs `command_line` to completion and returns its exit code and
    /// stderr. Fails only if the command could not be run at all.
    fn run(&self, command_line: &str) -> Result<ToolOutput, Error>;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, command_line: &str) -> Result<ToolOutput, Error> {
        let args = split_command_line(command_line);
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| Error::ExternalTool("empty command line".to_string()))?;
        debug!(command = command_line, "executing");

        let output = Command::new(program)
            .args(rest)
            .env("OUTPUT_CHARSET", "UTF-8")
            .output()
            .map_err(|e| Error::ExternalTool(format!("cannot execute program {program}: {e}")))?;

        // Tools may echo msgids in the catalog's charset
        let stderr = match String::from_utf8(output.stderr) {
            Ok(text) => text,
            Err(e) => WINDOWS_1252.decode(e.as_bytes()).0.into_owned(),
        };
        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            debug!(command = command_line, exit_code, "command failed");
        }
        Ok(ToolOutput { exit_code, stderr })
    }
}

/// Quotes one argument for a command line understood by
/// [`SystemToolRunner`].
///
/// ```rust
/// use transcat::tools::quote_arg;
/// assert_eq!(quote_arg(r#"my "file".po"#), r#""my \"file\".po""#);
/// ```
pub fn quote_arg(arg: &str) -> String {
    let escaped = arg.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Splits a command line on whitespace, honoring double quotes and
/// backslash escapes as produced by [`quote_arg`].
fn split_command_line(command_line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quoted = false;
    let mut chars = command_line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                quoted = !quoted;
                in_arg = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            c => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

/// Parses gettext tool stderr into diagnostics and unrecognized messages.
pub fn parse_gettext_output(stderr: &str) -> (Vec<GettextError>, Vec<String>) {
    enum Last {
        None,
        Error,
        Unrecognized,
    }

    let mut errors: Vec<GettextError> = Vec::new();
    let mut unrecognized: Vec<String> = Vec::new();
    let mut last = Last::None;

    for line in stderr.lines() {
        trace!(line, "tool stderr");
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            let continuation = line.trim();
            let target = match last {
                Last::Error => errors.last_mut().map(|e| &mut e.message),
                Last::Unrecognized => unrecognized.last_mut(),
                Last::None => None,
            };
            match target {
                Some(message) => {
                    message.push('\n');
                    message.push_str(continuation);
                }
                None => {
                    unrecognized.push(continuation.to_string());
                    last = Last::Unrecognized;
                }
            }
            continue;
        }

        match DIAGNOSTIC_REGEX.captures(line) {
            Some(caps) => {
                let Ok(line_no) = caps[2].parse() else {
                    unrecognized.push(line.to_string());
                    last = Last::Unrecognized;
                    continue;
                };
                errors.push(GettextError {
                    file: caps[1].to_string(),
                    line: line_no,
                    column: caps.get(3).and_then(|m| m.as_str().parse().ok()),
                    message: caps[4].to_string(),
                });
                last = Last::Error;
            }
            None => {
                unrecognized.push(line.to_string());
                last = Last::Unrecognized;
            }
        }
    }

    for message in &unrecognized {
        warn!(output = message.as_str(), "unrecognized gettext tool output");
    }
    (errors, unrecognized)
}

/// Runs a gettext tool and parses its diagnostics.
pub fn execute_gettext(runner: &dyn ToolRunner, command_line: &str) -> Result<ToolReport, Error> {
    let output = runner.run(command_line)?;
    let (errors, unrecognized) = parse_gettext_output(&output.stderr);
    Ok(ToolReport {
        exit_code: output.exit_code,
        errors,
        unrecognized,
    })
}
