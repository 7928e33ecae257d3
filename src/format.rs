use crate::error::ConversionError;
use std::fmt;
use std::path::Path;

/// Every document format the server accepts, on either side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Plain,
    Markdown,
    Html,
    Docx,
    Odt,
    Pdf,
    Epub,
    Latex,
    Rst,
    Ipynb,
}

impl DocumentFormat {
    /// Tokens accepted for `input_format`, aliases included.
    pub const TOKENS: [&'static str; 15] = [
        "txt", "plain", "md", "markdown", "html", "htm", "docx", "doc", "odt", "pdf", "epub",
        "latex", "tex", "rst", "ipynb",
    ];

    pub const EXTENSIONS: [&'static str; 14] = [
        "txt", "md", "markdown", "html", "htm", "docx", "doc", "odt", "pdf", "epub", "latex",
        "tex", "rst", "ipynb",
    ];

    pub fn from_token(token: &str) -> Result<Self, ConversionError> {
        let format = match token.trim().to_ascii_lowercase().as_str() {
            "txt" | "plain" => DocumentFormat::Plain,
            "md" | "markdown" => DocumentFormat::Markdown,
            "html" | "htm" => DocumentFormat::Html,
            "docx" | "doc" => DocumentFormat::Docx,
            "odt" => DocumentFormat::Odt,
            "pdf" => DocumentFormat::Pdf,
            "epub" => DocumentFormat::Epub,
            "latex" | "tex" => DocumentFormat::Latex,
            "rst" => DocumentFormat::Rst,
            "ipynb" => DocumentFormat::Ipynb,
            _ => {
                return Err(ConversionError::UnsupportedFormat(format!(
                    "unsupported format: '{token}'. Supported formats: {}",
                    Self::TOKENS.join(", ")
                )));
            }
        };
        Ok(format)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConversionError> {
        let extension = path
            .extension()
            .and_then(|value| value.to_str())
            .map(|value| value.to_ascii_lowercase());
        let Some(extension) = extension.filter(|ext| Self::EXTENSIONS.contains(&ext.as_str()))
        else {
            let shown = path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string());
            return Err(ConversionError::UnsupportedFormat(format!(
                "unsupported file extension '{shown}' for {}. Supported extensions: {}",
                path.display(),
                Self::EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        };
        Self::from_token(&extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Plain => "txt",
            DocumentFormat::Markdown => "markdown",
            DocumentFormat::Html => "html",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Odt => "odt",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Epub => "epub",
            DocumentFormat::Latex => "latex",
            DocumentFormat::Rst => "rst",
            DocumentFormat::Ipynb => "ipynb",
        }
    }

    /// Converter reader name, `None` when the format can only be produced.
    ///
    /// The converter has no plain-text reader, so plain text goes through the
    /// markdown reader.
    pub fn reader(&self) -> Option<&'static str> {
        match self {
            DocumentFormat::Plain | DocumentFormat::Markdown => Some("markdown"),
            DocumentFormat::Pdf => None,
            other => Some(other.as_str()),
        }
    }

    /// Converter writer name. PDF is written by the LaTeX writer and handed to
    /// the PDF engine.
    pub fn writer(&self) -> &'static str {
        match self {
            DocumentFormat::Plain => "plain",
            DocumentFormat::Pdf => "latex",
            other => other.as_str(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Plain => "text/plain",
            DocumentFormat::Markdown => "text/markdown",
            DocumentFormat::Html => "text/html",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Odt => "application/vnd.oasis.opendocument.text",
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Epub => "application/epub+zip",
            DocumentFormat::Latex => "application/x-latex",
            DocumentFormat::Rst => "text/x-rst",
            DocumentFormat::Ipynb => "application/x-ipynb+json",
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            DocumentFormat::Docx | DocumentFormat::Odt | DocumentFormat::Pdf | DocumentFormat::Epub
        )
    }

    pub fn accepts_reference_doc(&self) -> bool {
        matches!(self, DocumentFormat::Docx)
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, DocumentFormat::Pdf)
    }

    /// Checks that this format can be the source of a conversion.
    pub fn check_readable(&self, inline: bool) -> Result<&'static str, ConversionError> {
        let Some(reader) = self.reader() else {
            return Err(ConversionError::UnsupportedFormat(format!(
                "{} is not supported as an input format",
                self.as_str()
            )));
        };
        if inline && self.is_binary() {
            return Err(ConversionError::UnsupportedFormat(format!(
                "{} is a binary format and cannot be supplied as text content",
                self.as_str()
            )));
        }
        Ok(reader)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::errors;

    const ALL: [DocumentFormat; 10] = [
        DocumentFormat::Plain,
        DocumentFormat::Markdown,
        DocumentFormat::Html,
        DocumentFormat::Docx,
        DocumentFormat::Odt,
        DocumentFormat::Pdf,
        DocumentFormat::Epub,
        DocumentFormat::Latex,
        DocumentFormat::Rst,
        DocumentFormat::Ipynb,
    ];

    #[test]
    fn aliases_map_to_canonical_formats() {
        assert_eq!(DocumentFormat::from_token("md").unwrap(), DocumentFormat::Markdown);
        assert_eq!(DocumentFormat::from_token("HTM").unwrap(), DocumentFormat::Html);
        assert_eq!(DocumentFormat::from_token("doc").unwrap(), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_token("tex").unwrap(), DocumentFormat::Latex);
        assert_eq!(DocumentFormat::from_token("plain").unwrap(), DocumentFormat::Plain);
    }

    #[test]
    fn every_token_parses() {
        for token in DocumentFormat::TOKENS {
            assert!(DocumentFormat::from_token(token).is_ok(), "{token}");
        }
        for format in ALL {
            assert_eq!(DocumentFormat::from_token(format.as_str()).unwrap(), format);
        }
    }

    #[test]
    fn unknown_token_is_unsupported() {
        let err = DocumentFormat::from_token("xlsx").expect_err("error");
        assert_eq!(err.kind(), errors::UNSUPPORTED_FORMAT);
        assert!(err.to_string().contains("xlsx"));
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        let format = DocumentFormat::from_path(Path::new("/tmp/Report.DOCX")).unwrap();
        assert_eq!(format, DocumentFormat::Docx);
        let format = DocumentFormat::from_path(Path::new("notes.markdown")).unwrap();
        assert_eq!(format, DocumentFormat::Markdown);
    }

    #[test]
    fn unknown_extension_names_the_path() {
        let err = DocumentFormat::from_path(Path::new("/tmp/sheet.xlsx")).expect_err("error");
        assert_eq!(err.kind(), errors::UNSUPPORTED_FORMAT);
        assert!(err.to_string().contains("/tmp/sheet.xlsx"));

        let err = DocumentFormat::from_path(Path::new("/tmp/no-extension")).expect_err("error");
        assert!(err.to_string().contains("(none)"));
    }

    #[test]
    fn pdf_is_write_only() {
        let err = DocumentFormat::Pdf.check_readable(false).expect_err("error");
        assert_eq!(err.kind(), errors::UNSUPPORTED_FORMAT);
        assert_eq!(DocumentFormat::Pdf.writer(), "latex");
    }

    #[test]
    fn binary_formats_cannot_be_inline_content() {
        assert!(DocumentFormat::Docx.check_readable(true).is_err());
        assert_eq!(DocumentFormat::Docx.check_readable(false).unwrap(), "docx");
        assert_eq!(DocumentFormat::Plain.check_readable(true).unwrap(), "markdown");
    }

    #[test]
    fn only_docx_takes_a_reference_doc() {
        let accepting: Vec<_> = ALL
            .into_iter()
            .filter(DocumentFormat::accepts_reference_doc)
            .collect();
        assert_eq!(accepting, vec![DocumentFormat::Docx]);
    }
}
