use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{
    command::{CommandParts, build_command},
    markup::{inject_stylesheets, scan_meta_options},
    options::Options,
    source::Source,
    toolchain::{Toolchain, default_toolchain},
    types::{RenderError, Rendered},
};

/// One conversion request: a source plus everything that shapes its
/// command line.
#[derive(Debug, Clone)]
pub struct ImgKit {
    source: Source,
    options: Options,
    toc: Options,
    cover: Option<String>,
    cover_first: bool,
    css: Vec<PathBuf>,
    toolchain: Toolchain,
}

#[derive(Debug)]
pub struct ImgKitBuilder {
    source: Source,
    options: Options,
    toc: Options,
    cover: Option<String>,
    cover_first: bool,
    css: Vec<PathBuf>,
    toolchain: Option<Toolchain>,
}

impl ImgKit {
    pub fn builder(source: Source) -> ImgKitBuilder {
        ImgKitBuilder {
            source,
            options: Options::new(),
            toc: Options::new(),
            cover: None,
            cover_first: false,
            css: Vec::new(),
            toolchain: None,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Options after meta tags and explicit options were folded together.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn stylesheets(&self) -> &[PathBuf] {
        &self.css
    }

    /// The full argv for writing to `output`, or to stdout when `None`.
    pub fn command(&self, output: Option<&Path>) -> Result<Vec<String>, RenderError> {
        let source = self.prepared_source()?;
        self.command_for(&source, output)
    }

    /// Run the rendering binary and collect the image.
    pub async fn to_image(&self, output: Option<&Path>) -> Result<Rendered, RenderError> {
        let source = self.prepared_source_async().await?;
        let args = self.command_for(&source, output)?;
        debug!(
            target = "webshot::render::kit",
            op = "kit::to_image",
            argv = ?args,
            "Launching rendering binary"
        );
        let stdin = source.markup().map(str::as_bytes);
        super::process::run(&args, stdin, output).await
    }

    fn command_for(&self, source: &Source, output: Option<&Path>) -> Result<Vec<String>, RenderError> {
        build_command(
            CommandParts {
                toolchain: &self.toolchain,
                options: &self.options,
                toc: &self.toc,
                cover: self.cover.as_deref(),
                cover_first: self.cover_first,
                source,
            },
            output,
        )
    }

    fn prepared_source(&self) -> Result<Cow<'_, Source>, RenderError> {
        if self.css.is_empty() {
            return Ok(Cow::Borrowed(&self.source));
        }
        self.ensure_injectable()?;
        let stylesheets = self
            .css
            .iter()
            .map(|path| read_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        let document = match &self.source {
            Source::File(path) => Cow::Owned(read_file(path)?),
            other => Cow::Borrowed(other.markup().unwrap_or_default()),
        };
        self.with_stylesheets(&document, &stylesheets)
    }

    async fn prepared_source_async(&self) -> Result<Cow<'_, Source>, RenderError> {
        if self.css.is_empty() {
            return Ok(Cow::Borrowed(&self.source));
        }
        self.ensure_injectable()?;
        let mut stylesheets = Vec::with_capacity(self.css.len());
        for path in &self.css {
            stylesheets.push(read_file_async(path).await?);
        }
        let document = match &self.source {
            Source::File(path) => Cow::Owned(read_file_async(path).await?),
            other => Cow::Borrowed(other.markup().unwrap_or_default()),
        };
        self.with_stylesheets(&document, &stylesheets)
    }

    fn ensure_injectable(&self) -> Result<(), RenderError> {
        match &self.source {
            Source::String(_) | Source::Handle(_) | Source::File(_) => Ok(()),
            _ => Err(RenderError::source_mismatch(
                "CSS files can be added only to a single file or string",
            )),
        }
    }

    fn with_stylesheets(
        &self,
        document: &str,
        stylesheets: &[String],
    ) -> Result<Cow<'_, Source>, RenderError> {
        let markup = inject_stylesheets(document, stylesheets)?;
        Ok(Cow::Owned(Source::String(markup)))
    }
}

impl ImgKitBuilder {
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn toc(mut self, toc: Options) -> Self {
        self.toc = toc;
        self
    }

    pub fn cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn cover_first(mut self, cover_first: bool) -> Self {
        self.cover_first = cover_first;
        self
    }

    pub fn css(mut self, path: impl Into<PathBuf>) -> Self {
        self.css.push(path.into());
        self
    }

    pub fn stylesheets<P: Into<PathBuf>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.css.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    /// Resolve the toolchain and fold meta-tag options under the explicit ones.
    pub fn build(self) -> Result<ImgKit, RenderError> {
        let toolchain = match self.toolchain {
            Some(toolchain) => toolchain,
            None => default_toolchain()?.clone(),
        };

        let mut options = match self.source.markup() {
            Some(markup) => scan_meta_options(markup, toolchain.meta_tag_prefix())?,
            None => Options::new(),
        };
        options.merge(self.options);

        Ok(ImgKit {
            source: self.source,
            options,
            toc: self.toc,
            cover: self.cover,
            cover_first: self.cover_first,
            css: self.css,
            toolchain,
        })
    }
}

fn read_file(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|err| map_read_error(path, err))
}

async fn read_file_async(path: &Path) -> Result<String, RenderError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| map_read_error(path, err))
}

fn map_read_error(path: &Path, err: std::io::Error) -> RenderError {
    if err.kind() == std::io::ErrorKind::NotFound {
        RenderError::not_found(path)
    } else {
        RenderError::Io(err)
    }
}
