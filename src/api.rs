//! One-call conversions for the common cases.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::render::{ImgKit, Options, RenderError, Rendered, Source, Toolchain, ToolchainBuilder};

/// Everything besides the source and output that shapes a conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub options: Options,
    pub toc: Options,
    pub cover: Option<String>,
    pub cover_first: bool,
    pub css: Vec<PathBuf>,
    /// Falls back to the process-wide toolchain when unset.
    pub toolchain: Option<Toolchain>,
}

impl ConvertOptions {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    fn into_kit(self, source: Source) -> Result<ImgKit, RenderError> {
        let mut builder = ImgKit::builder(source)
            .options(self.options)
            .toc(self.toc)
            .cover_first(self.cover_first)
            .stylesheets(self.css);
        if let Some(cover) = self.cover {
            builder = builder.cover(cover);
        }
        if let Some(toolchain) = self.toolchain {
            builder = builder.toolchain(toolchain);
        }
        builder.build()
    }
}

pub async fn from_url(
    url: impl Into<String>,
    output: Option<&Path>,
    convert: ConvertOptions,
) -> Result<Rendered, RenderError> {
    convert.into_kit(Source::url(url))?.to_image(output).await
}

pub async fn from_urls<U: Into<String>>(
    urls: impl IntoIterator<Item = U>,
    output: Option<&Path>,
    convert: ConvertOptions,
) -> Result<Rendered, RenderError> {
    convert.into_kit(Source::urls(urls)?)?.to_image(output).await
}

pub async fn from_file(
    path: impl Into<PathBuf>,
    output: Option<&Path>,
    convert: ConvertOptions,
) -> Result<Rendered, RenderError> {
    convert.into_kit(Source::file(path)?)?.to_image(output).await
}

pub async fn from_files<P: Into<PathBuf>>(
    paths: impl IntoIterator<Item = P>,
    output: Option<&Path>,
    convert: ConvertOptions,
) -> Result<Rendered, RenderError> {
    convert.into_kit(Source::files(paths)?)?.to_image(output).await
}

/// Drain `reader` and pipe its contents to the binary.
pub async fn from_reader(
    mut reader: impl AsyncRead + Unpin,
    output: Option<&Path>,
    convert: ConvertOptions,
) -> Result<Rendered, RenderError> {
    let mut content = String::new();
    reader.read_to_string(&mut content).await?;
    convert
        .into_kit(Source::Handle(content))?
        .to_image(output)
        .await
}

pub async fn from_string(
    markup: impl Into<String>,
    output: Option<&Path>,
    convert: ConvertOptions,
) -> Result<Rendered, RenderError> {
    convert.into_kit(Source::string(markup))?.to_image(output).await
}

/// Start a toolchain configuration; unset parts are resolved from `PATH`.
pub fn config() -> ToolchainBuilder {
    Toolchain::builder()
}
