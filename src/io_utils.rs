use std::fmt;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

fn io_suggestion(err: &io::Error) -> &'static str {
    use io::ErrorKind::*;
    match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        WriteZero => "Disk may be full. Free up space and try again.",
        Other if err.raw_os_error() == Some(28) => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        io_suggestion(err)
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        source: Some(Box::new(err)),
    }
}

/// Input does not carry a compressed glider extension.
pub fn extension_error(path: &Path) -> CliError {
    CliError {
        msg: format!(
            "Invalid file extension for '{}'. Expected a compressed file such as .dcd or .mcg.",
            path.display()
        ),
        source: None,
    }
}

/// Convert a library error into a CLI error with a hint.
pub fn dbd_cli_error(context: &str, err: crate::DbdError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for a [`crate::DbdError`] variant.
pub fn cli_hint(err: &crate::DbdError) -> String {
    use crate::DbdError::*;
    match err {
        OpenFailure { path, source } => format_io_error("opening", path, source),
        TruncatedStream { .. } => format!("{err}. File appears truncated or corrupted."),
        UnsupportedByteWidth { .. } | SensorIndexOutOfRange { .. } => {
            format!("{err}. The sensor table does not match the file.")
        }
        DecompressionFailure { .. } => format!("{err}. Verify the file is intact."),
        Io(io) => format!("{io}. {}", io_suggestion(io)),
    }
}
