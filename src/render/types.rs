use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no such file: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("source mismatch: {0}")]
    SourceMismatch(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },
    #[error("failed to process markup: {0}")]
    Markup(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("{stderr}\nYou will need to run wkhtmltoimage within a \"virtual\" X server.")]
    NoDisplay { stderr: String },
    #[error("wkhtmltoimage reported an error:\n{stderr}")]
    Reported { stderr: String },
    #[error(
        "wkhtmltoimage exited with non-zero code {}. error:\n{stderr}{}",
        describe_exit(.exit_code),
        hint_suffix(.hint)
    )]
    Process {
        exit_code: Option<i32>,
        stderr: String,
        hint: Option<String>,
    },
    #[error("command produced no output: {command}")]
    EmptyOutput { command: String },
}

impl RenderError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn source_mismatch(message: impl Into<String>) -> Self {
        Self::SourceMismatch(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_option(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the rendering process or its pipes.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::NoDisplay { .. }
                | Self::Reported { .. }
                | Self::Process { .. }
                | Self::EmptyOutput { .. }
                | Self::NotFound { .. }
        )
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "(terminated by signal)".to_string(), |code| code.to_string())
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_deref()
        .map(|hint| format!("\n\n{hint}"))
        .unwrap_or_default()
}

/// Result of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Image bytes captured from stdout.
    Bytes(Vec<u8>),
    /// The binary wrote the image to this path.
    File(PathBuf),
}

impl Rendered {
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::File(_) => None,
        }
    }
}
