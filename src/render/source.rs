use std::{
    fmt,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};

use super::types::RenderError;

/// Declared kind of a raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    String,
    File,
    Url,
}

impl FromStr for SourceKind {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "string" => Ok(Self::String),
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            other => Err(RenderError::source_mismatch(format!(
                "unknown source kind `{other}`"
            ))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::File => "file",
            Self::Url => "url",
        })
    }
}

/// Input handed to the rendering binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Inline markup, piped through stdin.
    String(String),
    File(PathBuf),
    Files(Vec<PathBuf>),
    /// Contents drained from an open handle, piped through stdin.
    Handle(String),
    Url(String),
    Urls(Vec<String>),
}

impl Source {
    pub fn string(markup: impl Into<String>) -> Self {
        Self::String(markup.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let path = path.into();
        ensure_exists(&path)?;
        Ok(Self::File(path))
    }

    pub fn files<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Result<Self, RenderError> {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(RenderError::source_mismatch("file list must not be empty"));
        }
        for path in &paths {
            ensure_exists(path)?;
        }
        Ok(Self::Files(paths))
    }

    pub fn reader(mut reader: impl Read) -> Result<Self, RenderError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(Self::Handle(content))
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn urls<U: Into<String>>(urls: impl IntoIterator<Item = U>) -> Result<Self, RenderError> {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.is_empty() {
            return Err(RenderError::source_mismatch("url list must not be empty"));
        }
        Ok(Self::Urls(urls))
    }

    /// Classify `input` according to `kind`.
    pub fn new(input: impl Into<String>, kind: SourceKind) -> Result<Self, RenderError> {
        let input = input.into();
        match kind {
            SourceKind::String => Ok(Self::String(input)),
            SourceKind::File => Self::file(input),
            SourceKind::Url => Ok(Self::Url(input)),
        }
    }

    /// Classify several inputs of the same kind; a single input collapses
    /// to its scalar variant.
    pub fn many(inputs: Vec<String>, kind: SourceKind) -> Result<Self, RenderError> {
        match (kind, inputs.len()) {
            (_, 0) => Err(RenderError::source_mismatch("no input given")),
            (_, 1) => {
                let input = inputs.into_iter().next().unwrap_or_default();
                Self::new(input, kind)
            }
            (SourceKind::File, _) => Self::files(inputs),
            (SourceKind::Url, _) => Self::urls(inputs),
            (SourceKind::String, _) => Err(RenderError::source_mismatch(
                "only one inline document can be rendered at a time",
            )),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_) | Self::Files(_))
    }

    pub fn is_file_handle(&self) -> bool {
        matches!(self, Self::Handle(_))
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_) | Self::Urls(_))
    }

    /// Whether the document travels through stdin.
    pub fn is_piped(&self) -> bool {
        matches!(self, Self::String(_) | Self::Handle(_))
    }

    /// Markup held in memory, if any.
    pub fn markup(&self) -> Option<&str> {
        match self {
            Self::String(markup) | Self::Handle(markup) => Some(markup),
            _ => None,
        }
    }

    /// Tokens naming this source on the command line.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::String(_) | Self::Handle(_) => vec!["-".to_string()],
            Self::File(path) => vec![path.display().to_string()],
            Self::Files(paths) => paths.iter().map(|path| path.display().to_string()).collect(),
            Self::Url(url) => vec![url.clone()],
            Self::Urls(urls) => urls.clone(),
        }
    }
}

fn ensure_exists(path: &Path) -> Result<(), RenderError> {
    if path.exists() {
        Ok(())
    } else {
        Err(RenderError::not_found(path))
    }
}
