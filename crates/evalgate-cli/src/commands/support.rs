use std::io::{self, Write};

use anyhow::Result;

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub(super) fn print_text(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}

/// Surfaces a warning as a workflow command annotation on stderr, keeping
/// stdout for the JSON or markdown document.
pub(super) fn emit_workflow_warning(message: &str) -> Result<()> {
    write_workflow_command(&mut io::stderr().lock(), "warning", message)
}

pub(super) fn emit_workflow_error(message: &str) -> Result<()> {
    write_workflow_command(&mut io::stderr().lock(), "error", message)
}

pub(super) fn write_workflow_command(
    out: &mut impl Write,
    command: &str,
    message: &str,
) -> Result<()> {
    writeln!(out, "::{command}::{}", escape_workflow_data(message))?;
    Ok(())
}

pub(super) fn escape_workflow_data(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub(super) fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
