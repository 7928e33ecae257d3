use crate::error::ConversionError;
use crate::format::DocumentFormat;
use serde_yaml::Value as YamlValue;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A defaults file that has been read and checked to be a YAML mapping.
#[derive(Debug, Clone)]
pub struct DefaultsFile {
    pub path: PathBuf,
}

impl DefaultsFile {
    /// Directory the file lives in; relative filter names are also searched there.
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub fn load_defaults(path: &Path, output: DocumentFormat) -> Result<DefaultsFile, ConversionError> {
    let invalid = |reason: String| ConversionError::InvalidDefaultsFile {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => invalid("file not found".to_string()),
        ErrorKind::PermissionDenied => invalid("permission denied".to_string()),
        _ => invalid(format!("failed to read: {err}")),
    })?;

    let document: YamlValue =
        serde_yaml::from_str(&text).map_err(|err| invalid(format!("YAML parse error: {err}")))?;

    let Some(mapping) = document.as_mapping() else {
        return Err(invalid("must be a YAML mapping of options".to_string()));
    };

    if let Some(declared) = mapping.get("to").and_then(|value| value.as_str())
        && !declared_matches(declared, output)
    {
        warn!(
            defaults_file = %path.display(),
            declared,
            requested = output.as_str(),
            "defaults file declares a different output format; using requested format"
        );
    }

    let path = std::path::absolute(path)
        .map_err(|err| invalid(format!("cannot resolve path: {err}")))?;
    Ok(DefaultsFile { path })
}

fn declared_matches(declared: &str, output: DocumentFormat) -> bool {
    match DocumentFormat::from_token(declared) {
        Ok(format) => format == output || declared == output.writer(),
        Err(_) => declared == output.writer(),
    }
}
