use crate::format::DocumentFormat;
use serde_json::json;

pub const TOOL_CREATE_FILE: &str = "pandoc.create_file";
pub const TOOL_CONVERT_FILE: &str = "pandoc.convert_file";

pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// JSON-RPC error code for a request naming an unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Exposed to the converter (and its filters) for every call.
pub const OUTPUT_DIR_ENV: &str = "PANDOC_OUTPUT_DIR";

pub const PDF_ENGINE_ARG: &str = "--pdf-engine=xelatex";
pub const PDF_ENGINE: &str = "xelatex";
pub const PDF_MARGIN_ARGS: [&str; 2] = ["-V", "geometry:margin=1in"];

pub fn create_file_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "content": { "type": "string", "minLength": 1 },
            "input_format": { "type": "string", "enum": DocumentFormat::TOKENS },
            "output_file": { "type": "string", "minLength": 1 },
            "reference_doc": { "type": "string" },
            "filters": {
                "type": "array",
                "items": { "type": "string" }
            },
            "defaults_file": { "type": "string" }
        },
        "required": ["content", "input_format", "output_file"],
        "additionalProperties": false
    })
}

pub fn convert_file_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "input_file": { "type": "string", "minLength": 1 },
            "input_format": { "type": "string", "enum": DocumentFormat::TOKENS },
            "output_file": { "type": "string", "minLength": 1 },
            "reference_doc": { "type": "string" },
            "filters": {
                "type": "array",
                "items": { "type": "string" }
            },
            "defaults_file": { "type": "string" }
        },
        "required": ["input_file", "output_file"],
        "additionalProperties": false
    })
}
