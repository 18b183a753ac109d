//! Edit command: round-trip an entry (or one property) through `$EDITOR`.

use std::process::Command;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use punch_store::EntryStore;

pub fn run(
    store: &mut EntryStore,
    stamp: &str,
    property: Option<&str>,
    now: NaiveDateTime,
) -> Result<()> {
    let (_key, entry) = store.get_entry(stamp)?;

    match property {
        Some(name) => {
            let current = entry.property(name).unwrap_or(serde_json::Value::Null);
            let edited = edit_in_editor(&serde_json::to_string_pretty(&current)?)?;
            // A quoted JSON string unwraps to its text; anything else is
            // taken literally.
            let value = match serde_json::from_str::<serde_json::Value>(edited.trim()) {
                Ok(serde_json::Value::String(text)) => text,
                Ok(other) => other.to_string(),
                Err(_) => edited.trim().to_string(),
            };
            store.set_property(stamp, name, &value, None, now)?;
        }
        None => {
            let edited = edit_in_editor(&serde_json::to_string_pretty(&entry)?)?;
            let value: serde_json::Value =
                serde_json::from_str(&edited).context("error parsing json")?;
            store.replace_entry(stamp, value)?;
        }
    }
    Ok(())
}

/// Writes `source` to a temp file, opens it in `$EDITOR`, and reads the
/// result back.
fn edit_in_editor(source: &str) -> Result<String> {
    let file = tempfile::Builder::new()
        .prefix("punch-")
        .suffix(".json")
        .tempfile()
        .context("failed to create edit buffer")?;
    std::fs::write(file.path(), source)?;

    let (program, args) = editor_command();
    let status = Command::new(&program)
        .args(&args)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor: {program}"))?;
    anyhow::ensure!(status.success(), "non-zero exit code from $EDITOR");

    Ok(std::fs::read_to_string(file.path())?)
}

/// `$EDITOR` may carry arguments ("code -w"); split on whitespace.
fn editor_command() -> (String, Vec<String>) {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let mut parts = editor.split_whitespace().map(str::to_string);
    let program = parts.next().unwrap_or_else(|| "vi".to_string());
    (program, parts.collect())
}
