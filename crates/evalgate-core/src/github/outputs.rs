//! Step outputs (`GITHUB_OUTPUT`) and the job summary (`GITHUB_STEP_SUMMARY`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use uuid::Uuid;

use crate::error::Result;

/// Formats one `name=value` entry; multi-line values use a random heredoc delimiter.
#[must_use]
pub fn format_output_entry(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{name}={value}\n");
    }
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

pub fn append_outputs(path: &Path, entries: &[(String, String)]) -> Result<()> {
    let mut body = String::new();
    for (name, value) in entries {
        body.push_str(&format_output_entry(name, value));
    }
    append(path, &body)
}

pub fn append_step_summary(path: &Path, markdown: &str) -> Result<()> {
    let mut body = markdown.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    append(path, &body)
}

fn append(path: &Path, body: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(body.as_bytes())?;
    file.flush()?;
    Ok(())
}
