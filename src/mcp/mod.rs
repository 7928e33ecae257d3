use serde_json::json;

pub mod contracts;
pub mod errors;

pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![
        json!({
            "name": contracts::TOOL_CREATE_FILE,
            "description": "Create a document file from markdown, HTML or other text content. \
                The output format is inferred from the output_file extension \
                (.txt, .md, .html, .docx, .odt, .pdf, .epub, .tex, .rst, .ipynb).",
            "inputSchema": contracts::create_file_schema()
        }),
        json!({
            "name": contracts::TOOL_CONVERT_FILE,
            "description": "Convert an existing document to another format. \
                Formats are inferred from the file extensions unless input_format is given.",
            "inputSchema": contracts::convert_file_schema()
        }),
    ]
}
