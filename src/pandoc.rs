use crate::error::ConversionError;
use crate::filters::ResolvedFilter;
use crate::mcp::contracts::{OUTPUT_DIR_ENV, PDF_ENGINE, PDF_ENGINE_ARG, PDF_MARGIN_ARGS};
use crate::request::{ConversionRequest, Source};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub bytes_len: u64,
}

fn flag(name: &str, value: impl AsRef<OsStr>) -> OsString {
    let mut arg = OsString::from(name);
    arg.push(value);
    arg
}

/// Converter arguments for `request`; the input file, if any, comes last.
pub fn build_args(request: &ConversionRequest, filters: &[ResolvedFilter]) -> Vec<OsString> {
    let mut args = vec![
        flag("--from=", request.reader),
        flag("--to=", request.output_format.writer()),
        flag("--output=", &request.output_file),
    ];

    if request.output_format.accepts_reference_doc()
        && let Some(reference) = &request.reference_doc
    {
        args.push(flag("--reference-doc=", reference));
    }

    for filter in filters {
        args.push(flag("--filter=", &filter.path));
    }

    if let Some(defaults) = &request.defaults {
        args.push(flag("--defaults=", &defaults.path));
    }

    if request.output_format.is_pdf() {
        args.push(OsString::from(PDF_ENGINE_ARG));
        args.extend(PDF_MARGIN_ARGS.into_iter().map(OsString::from));
    }

    if let Source::File(path) = &request.source {
        args.push(path.clone().into_os_string());
    }

    args
}

/// Runs the converter once. The output directory reaches the child through
/// its own environment only, so concurrent calls never share it.
pub fn run(
    pandoc: &Path,
    request: &ConversionRequest,
    filters: &[ResolvedFilter],
) -> Result<ConversionOutput, ConversionError> {
    if request.output_format.is_pdf() && which::which(PDF_ENGINE).is_err() {
        warn!(engine = PDF_ENGINE, "pdf engine not found on PATH; conversion will likely fail");
    }

    let args = build_args(request, filters);
    debug!(pandoc = %pandoc.display(), ?args, "invoking converter");

    let mut command = Command::new(pandoc);
    command
        .args(&args)
        .env(OUTPUT_DIR_ENV, request.output_dir())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    match &request.source {
        Source::Content(_) => command.stdin(Stdio::piped()),
        Source::File(_) => command.stdin(Stdio::null()),
    };

    let started = Instant::now();
    let mut child = command.spawn().map_err(|err| spawn_failure(pandoc, &err))?;

    let feeder = match (&request.source, child.stdin.take()) {
        (Source::Content(content), Some(mut stdin)) => {
            let content = content.clone();
            Some(thread::spawn(move || stdin.write_all(content.as_bytes())))
        }
        _ => None,
    };

    let output = child
        .wait_with_output()
        .map_err(|err| spawn_failure(pandoc, &err))?;
    let fed = feeder.map(|handle| handle.join());
    debug!(
        status = %output.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "converter finished"
    );

    if !output.status.success() {
        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        if diagnostics.trim().is_empty() {
            diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        }
        return Err(ConversionError::ConversionFailed {
            message: format!(
                "{} exited with {}: {}",
                pandoc.display(),
                output.status,
                diagnostics.trim()
            ),
            diagnostics,
        });
    }

    match fed {
        Some(Ok(Err(err))) if err.kind() != ErrorKind::BrokenPipe => {
            return Err(stdin_failure(pandoc, err.to_string()));
        }
        Some(Err(_)) => {
            return Err(stdin_failure(pandoc, "content writer panicked".to_string()));
        }
        _ => {}
    }

    let metadata = fs::metadata(&request.output_file).map_err(|err| ConversionError::IoFailure {
        path: request.output_file.clone(),
        reason: format!("converter reported success but output is missing: {err}"),
    })?;
    Ok(ConversionOutput {
        bytes_len: metadata.len(),
    })
}

fn spawn_failure(pandoc: &Path, err: &std::io::Error) -> ConversionError {
    if err.kind() == ErrorKind::NotFound {
        return ConversionError::ConverterNotFound {
            path: pandoc.to_path_buf(),
        };
    }
    ConversionError::ConversionFailed {
        message: format!("failed to run {}: {err}", pandoc.display()),
        diagnostics: err.to_string(),
    }
}

fn stdin_failure(pandoc: &Path, reason: String) -> ConversionError {
    ConversionError::ConversionFailed {
        message: format!("failed to send content to {}: {reason}", pandoc.display()),
        diagnostics: reason,
    }
}
