use crate::defaults::{DefaultsFile, load_defaults};
use crate::error::ConversionError;
use crate::format::DocumentFormat;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum Source {
    Content(String),
    File(PathBuf),
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Content(_) => "content",
            Source::File(_) => "file",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::Content(_) => "content".to_string(),
            Source::File(path) => format!("path:{}", path.display()),
        }
    }
}

/// A fully validated conversion, ready for filter resolution and invocation.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: Source,
    pub input_format: DocumentFormat,
    pub reader: &'static str,
    pub output_file: PathBuf,
    pub output_format: DocumentFormat,
    pub reference_doc: Option<PathBuf>,
    pub filters: Vec<String>,
    pub defaults: Option<DefaultsFile>,
}

impl ConversionRequest {
    pub fn output_dir(&self) -> &Path {
        self.output_file.parent().unwrap_or(Path::new("."))
    }
}

/// Arguments shared by both tools once the source has been settled.
struct Options {
    output_file: String,
    reference_doc: Option<String>,
    filters: Vec<String>,
    defaults_file: Option<String>,
}

pub fn create_request(args: &Value) -> Result<ConversionRequest, ConversionError> {
    let obj = arguments(args)?;
    if obj.contains_key("input_file") {
        return Err(ConversionError::invalid_input(
            "create_file takes content, not input_file",
        ));
    }

    let content = parse_string(obj, "content")?
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ConversionError::missing_input("content must not be empty"))?;
    let input_format = parse_string(obj, "input_format")?
        .ok_or_else(|| ConversionError::invalid_input("input_format is required"))?;
    let input_format = DocumentFormat::from_token(&input_format)?;

    let options = parse_options(obj)?;
    let output_format = output_format(&options.output_file)?;
    let reader = input_format.check_readable(true)?;

    finish(Source::Content(content), input_format, reader, output_format, options)
}

pub fn convert_request(args: &Value) -> Result<ConversionRequest, ConversionError> {
    let obj = arguments(args)?;
    if obj.contains_key("content") {
        return Err(ConversionError::invalid_input(
            "convert_file takes input_file, not content",
        ));
    }

    let input_file = parse_string(obj, "input_file")?
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| ConversionError::missing_input("input_file is required"))?;
    let input_path = Path::new(&input_file);
    match fs::metadata(input_path) {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => {
            return Err(ConversionError::missing_input(format!(
                "input file is not a regular file: {input_file}"
            )));
        }
        Err(_) => {
            return Err(ConversionError::missing_input(format!(
                "input file not found: {input_file}"
            )));
        }
    }

    let input_format = match parse_string(obj, "input_format")? {
        Some(token) => DocumentFormat::from_token(&token)?,
        None => DocumentFormat::from_path(input_path)?,
    };

    let options = parse_options(obj)?;
    let output_format = output_format(&options.output_file)?;
    let reader = input_format.check_readable(false)?;

    let input_path = std::path::absolute(input_path).map_err(|err| {
        ConversionError::missing_input(format!("cannot resolve input file {input_file}: {err}"))
    })?;
    finish(Source::File(input_path), input_format, reader, output_format, options)
}

fn finish(
    source: Source,
    input_format: DocumentFormat,
    reader: &'static str,
    output_format: DocumentFormat,
    options: Options,
) -> Result<ConversionRequest, ConversionError> {
    let reference_doc = match options.reference_doc {
        Some(path) => Some(check_reference_doc(&path, output_format)?),
        None => None,
    };

    let defaults = match options.defaults_file {
        Some(path) => Some(load_defaults(Path::new(&path), output_format)?),
        None => None,
    };

    let output_file = check_output_file(&options.output_file)?;

    Ok(ConversionRequest {
        source,
        input_format,
        reader,
        output_file,
        output_format,
        reference_doc,
        filters: options.filters,
        defaults,
    })
}

fn arguments(args: &Value) -> Result<&Map<String, Value>, ConversionError> {
    args.as_object()
        .ok_or_else(|| ConversionError::invalid_input("arguments must be an object"))
}

fn parse_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, ConversionError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ConversionError::invalid_input(format!("{key} must be a string"))),
    }
}

fn parse_optional_path(
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ConversionError> {
    Ok(parse_string(obj, key)?.filter(|value| !value.trim().is_empty()))
}

fn parse_filters(obj: &Map<String, Value>) -> Result<Vec<String>, ConversionError> {
    let Some(value) = obj.get("filters").filter(|value| !value.is_null()) else {
        return Ok(Vec::new());
    };
    let Some(items) = value.as_array() else {
        return Err(ConversionError::invalid_input(
            "filters must be a list of strings",
        ));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ConversionError::invalid_input("each filter must be a string"))
        })
        .collect()
}

fn parse_options(obj: &Map<String, Value>) -> Result<Options, ConversionError> {
    let output_file = parse_string(obj, "output_file")?
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| ConversionError::invalid_input("output_file is required"))?;
    Ok(Options {
        output_file,
        reference_doc: parse_optional_path(obj, "reference_doc")?,
        filters: parse_filters(obj)?,
        defaults_file: parse_optional_path(obj, "defaults_file")?,
    })
}

fn output_format(output_file: &str) -> Result<DocumentFormat, ConversionError> {
    DocumentFormat::from_path(Path::new(output_file))
}

fn check_reference_doc(path: &str, output: DocumentFormat) -> Result<PathBuf, ConversionError> {
    if !output.accepts_reference_doc() {
        return Err(ConversionError::UnsupportedFormat(format!(
            "reference_doc ({path}) is only supported for docx output, not {output}"
        )));
    }
    let reference = Path::new(path);
    if !reference.is_file() {
        return Err(ConversionError::MissingReferenceDoc {
            path: reference.to_path_buf(),
        });
    }
    std::path::absolute(reference).map_err(|_| ConversionError::MissingReferenceDoc {
        path: reference.to_path_buf(),
    })
}

fn check_output_file(output_file: &str) -> Result<PathBuf, ConversionError> {
    let path = std::path::absolute(output_file).map_err(|err| ConversionError::IoFailure {
        path: PathBuf::from(output_file),
        reason: err.to_string(),
    })?;
    if path.is_dir() {
        return Err(ConversionError::IoFailure {
            path,
            reason: "output path is a directory".to_string(),
        });
    }
    let Some(dir) = path.parent().filter(|dir| dir.is_dir()) else {
        return Err(ConversionError::IoFailure {
            reason: "output directory does not exist".to_string(),
            path,
        });
    };
    if let Err(reason) = check_writable(dir, &path) {
        return Err(ConversionError::IoFailure { path, reason });
    }
    Ok(path)
}

#[cfg(unix)]
fn check_writable(dir: &Path, file: &Path) -> Result<(), String> {
    use rustix::fs::{Access, access};

    access(dir, Access::WRITE_OK | Access::EXEC_OK)
        .map_err(|err| format!("output directory {} is not writable: {err}", dir.display()))?;
    if file.exists() {
        access(file, Access::WRITE_OK)
            .map_err(|err| format!("existing output file is not writable: {err}"))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_writable(_dir: &Path, file: &Path) -> Result<(), String> {
    match fs::metadata(file) {
        Ok(metadata) if metadata.permissions().readonly() => {
            Err("existing output file is read-only".to_string())
        }
        _ => Ok(()),
    }
}
