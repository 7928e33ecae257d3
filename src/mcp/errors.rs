pub const INVALID_INPUT: &str = "invalid_input";
pub const MISSING_INPUT: &str = "missing_input";
pub const UNSUPPORTED_FORMAT: &str = "unsupported_format";
pub const MISSING_REFERENCE_DOC: &str = "missing_reference_doc";
pub const INVALID_DEFAULTS_FILE: &str = "invalid_defaults_file";
pub const FILTER_NOT_FOUND: &str = "filter_not_found";
pub const FILTER_NOT_EXECUTABLE: &str = "filter_not_executable";
pub const CONVERSION_FAILED: &str = "conversion_failed";
pub const IO_FAILURE: &str = "io_failure";
