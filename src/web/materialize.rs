// Writing generated scripts to disk, behind a swappable validation stage

use std::fs;
use std::io;
use std::path::Path;

use label_forge_types::GeneratedScript;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Trust boundary between the completion service and the filesystem.
pub trait ScriptValidator: Send + Sync {
    fn validate(&self, script: &GeneratedScript) -> Result<(), ValidationError>;
}

/// Accepts whatever the service returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ScriptValidator for AcceptAll {
    fn validate(&self, _script: &GeneratedScript) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Rejects blank output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonEmptyValidator;

impl ScriptValidator for NonEmptyValidator {
    fn validate(&self, script: &GeneratedScript) -> Result<(), ValidationError> {
        if script.as_str().trim().is_empty() {
            Err(ValidationError("completion service returned an empty script".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Overwrite `dest` with the script text, byte for byte.
pub fn materialize(script: &GeneratedScript, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, script.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_round_trips_text() {
        let dest = std::env::temp_dir().join(format!(
            "label_forge_materialize_{}/apply_label.py",
            std::process::id()
        ));
        let text = "```python\nimport bpy\nprint('héllo')\n```\n\n";
        materialize(&GeneratedScript(text.to_string()), &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), text);

        // second write replaces, never appends
        materialize(&GeneratedScript("x".to_string()), &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "x");

        fs::remove_dir_all(dest.parent().unwrap()).ok();
    }

    #[test]
    fn test_accept_all_takes_anything() {
        assert!(AcceptAll.validate(&GeneratedScript(String::new())).is_ok());
    }

    #[test]
    fn test_non_empty_validator() {
        assert!(NonEmptyValidator
            .validate(&GeneratedScript("import bpy".to_string()))
            .is_ok());
        assert!(NonEmptyValidator
            .validate(&GeneratedScript(" \n\t".to_string()))
            .is_err());
    }
}
