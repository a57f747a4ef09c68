use crate::error::{DaybookError, Result};
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Gets the editor command from environment.
/// Checks $EDITOR, then $VISUAL, then falls back to common editors.
pub fn get_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    for fallback in &["vim", "vi", "nano"] {
        if Command::new("which")
            .arg(fallback)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
        {
            return Ok((*fallback).to_string());
        }
    }

    Err(DaybookError::Api(
        "No editor found. Set $EDITOR environment variable.".to_string(),
    ))
}

/// Opens a file in the user's editor and waits for it to close.
pub fn open_in_editor<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let editor = get_editor()?;
    let path = file_path.as_ref();

    let status = Command::new(&editor)
        .arg(path)
        .status()
        .map_err(|e| DaybookError::Api(format!("Failed to launch editor '{}': {}", editor, e)))?;

    if !status.success() {
        return Err(DaybookError::Api(format!(
            "Editor '{}' exited with non-zero status",
            editor
        )));
    }

    fs::read_to_string(path).map_err(DaybookError::Io)
}

/// Opens the editor on a scratch copy of a document and returns the edited
/// text. The scratch file is removed afterwards.
pub fn edit_document(initial: &str) -> Result<String> {
    let temp_file = env::temp_dir().join("daybook-edit.md");
    fs::write(&temp_file, initial).map_err(DaybookError::Io)?;

    let result = open_in_editor(&temp_file);
    let _ = fs::remove_file(&temp_file);
    result
}
