use crate::config::Config;
use crate::error::ConversionError;
use crate::filters::{FilterSearch, ResolvedFilter, resolve_filters};
use crate::pandoc::{self, ConversionOutput};
use crate::request::ConversionRequest;
use serde_json::json;
use std::path::{Path, PathBuf};

pub mod convert_file;
pub mod create_file;

pub fn error_result(
    kind: &'static str,
    message: impl Into<String>,
    source: Option<&str>,
) -> serde_json::Value {
    let message = message.into();
    let text = format!("Error: {message}");
    build_error(kind, message, text, source, None)
}

/// Error result for a rejected request, before any formats are known.
pub fn rejected(err: &ConversionError) -> serde_json::Value {
    error_result(err.kind(), err.to_string(), None)
}

fn build_error(
    kind: &'static str,
    message: String,
    text: String,
    source: Option<&str>,
    diagnostics: Option<&str>,
) -> serde_json::Value {
    let mut error = json!({
        "kind": kind,
        "message": message,
    });

    if let Some(obj) = error.as_object_mut() {
        if let Some(source) = source {
            obj.insert("source".to_string(), json!(source));
        }
        if let Some(diagnostics) = diagnostics {
            obj.insert("diagnostics".to_string(), json!(diagnostics));
        }
    }

    json!({
        "content": [{"type": "text", "text": text}],
        "structuredContent": {"error": error},
        "isError": true
    })
}

/// Resolves filters and runs the converter for an already validated request.
fn execute(request: &ConversionRequest, config: &Config, verb: &str) -> serde_json::Value {
    let search = FilterSearch {
        working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        defaults_dir: request
            .defaults
            .as_ref()
            .and_then(|defaults| defaults.dir())
            .map(Path::to_path_buf),
        user_filter_dir: config.user_filter_dir.clone(),
    };

    let outcome = resolve_filters(&request.filters, &search).and_then(|filters| {
        pandoc::run(&config.pandoc, request, &filters).map(|output| (filters, output))
    });

    match outcome {
        Ok((filters, output)) => success_result(request, &filters, &output, verb),
        Err(err) => {
            let source = request.source.describe();
            build_error(
                err.kind(),
                err.to_string(),
                describe_failure(&err, request),
                Some(source.as_str()),
                err.diagnostics(),
            )
        }
    }
}

fn describe_failure(err: &ConversionError, request: &ConversionRequest) -> String {
    let mut details = err.to_string();
    let prefix = if err.is_converter_missing() {
        "Pandoc executable not found while converting"
    } else if err.is_filter_error() {
        "Filter error during conversion"
    } else if let Some(defaults) = &request.defaults
        && details.contains("defaults")
    {
        details.push_str(&format!(" (defaults file: {})", defaults.path.display()));
        "Defaults file error during conversion"
    } else {
        "Error converting"
    };
    format!(
        "Error: {prefix} {} from {} to {}: {details}",
        request.source.label(),
        request.input_format,
        request.output_format
    )
}

fn success_result(
    request: &ConversionRequest,
    filters: &[ResolvedFilter],
    output: &ConversionOutput,
    verb: &str,
) -> serde_json::Value {
    let path = request.output_file.display().to_string();
    let uri = format!("file://{path}");
    let filter_names: Vec<String> = filters.iter().map(ResolvedFilter::file_name).collect();
    let defaults_name = request.defaults.as_ref().map(|defaults| defaults.file_name());

    let mut message = format!("File successfully {verb}");
    if !filter_names.is_empty() {
        message.push_str(&format!(" with filters: {}", filter_names.join(", ")));
    }
    if let Some(name) = &defaults_name {
        message.push_str(&format!(" using defaults file: {name}"));
    }
    message.push_str(&format!(" and saved to: {path}"));

    let name = request
        .output_file
        .file_name()
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    json!({
        "content": [
            {"type": "text", "text": message},
            {
                "type": "resource_link",
                "uri": uri,
                "name": name,
                "mimeType": request.output_format.mime_type()
            }
        ],
        "structuredContent": {
            "success": true,
            "output_file": path,
            "uri": uri,
            "input_format": request.input_format.as_str(),
            "output_format": request.output_format.as_str(),
            "bytes_len": output.bytes_len,
            "filters": filter_names,
            "defaults_file": defaults_name
        },
        "isError": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DocumentFormat;
    use crate::mcp::errors;
    use crate::request::Source;

    fn request() -> ConversionRequest {
        ConversionRequest {
            source: Source::Content("x".to_string()),
            input_format: DocumentFormat::Markdown,
            reader: "markdown",
            output_file: PathBuf::from("/out/report.docx"),
            output_format: DocumentFormat::Docx,
            reference_doc: None,
            filters: Vec::new(),
            defaults: None,
        }
    }

    #[test]
    fn error_result_shape() {
        let result = error_result(
            errors::MISSING_INPUT,
            "input file not found: /a.md",
            Some("path:/a.md"),
        );
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["structuredContent"]["error"]["kind"], json!("missing_input"));
        assert_eq!(result["structuredContent"]["error"]["source"], json!("path:/a.md"));
        assert_eq!(result["content"][0]["text"], json!("Error: input file not found: /a.md"));
        assert!(result["structuredContent"]["error"].get("diagnostics").is_none());
    }

    #[test]
    fn filter_failures_are_labelled() {
        let err = ConversionError::FilterNotFound {
            filter: "toc.lua".to_string(),
            searched: vec![PathBuf::from("/w/toc.lua")],
        };
        let text = describe_failure(&err, &request());
        assert!(text.starts_with(
            "Error: Filter error during conversion content from markdown to docx"
        ));
        assert!(text.contains("toc.lua"));
    }

    #[test]
    fn converter_failures_are_labelled() {
        let err = ConversionError::ConversionFailed {
            message: "pandoc exited with exit status: 1: boom".to_string(),
            diagnostics: "boom\n".to_string(),
        };
        let text = describe_failure(&err, &request());
        assert_eq!(
            text,
            "Error: Error converting content from markdown to docx: \
             pandoc exited with exit status: 1: boom"
        );
    }

    #[test]
    fn missing_converter_is_labelled() {
        let err = ConversionError::ConverterNotFound {
            path: PathBuf::from("/usr/local/bin/pandoc"),
        };
        let text = describe_failure(&err, &request());
        assert!(text.starts_with(
            "Error: Pandoc executable not found while converting content from markdown to docx"
        ));
        assert!(text.contains("please ensure pandoc is installed"));
    }

    #[test]
    fn success_message_mentions_filters_and_defaults() {
        let mut request = request();
        request.defaults = Some(crate::defaults::DefaultsFile {
            path: PathBuf::from("/cfg/house.yaml"),
        });
        let filters = vec![ResolvedFilter {
            name: "lua/toc.lua".to_string(),
            path: PathBuf::from("/home/me/.pandoc/filters/toc.lua"),
        }];
        let output = ConversionOutput { bytes_len: 42 };
        let result = success_result(&request, &filters, &output, "created");
        assert_eq!(
            result["content"][0]["text"],
            json!(
                "File successfully created with filters: toc.lua \
                 using defaults file: house.yaml and saved to: /out/report.docx"
            )
        );
        assert_eq!(result["structuredContent"]["bytes_len"], json!(42));
        assert_eq!(result["structuredContent"]["filters"], json!(["toc.lua"]));
        assert_eq!(result["content"][1]["uri"], json!("file:///out/report.docx"));
        assert_eq!(result["isError"], json!(false));
    }
}
