//! Turn parsed command-line requests into conversion jobs.

use std::io::Read;

use tracing::debug;
use url::Url;

use crate::{
    config::{InputKind, RenderSettings, RequestArgs},
    render::{ImgKit, OptionValue, Options, Source, SourceKind, Toolchain},
};

use super::error::AppError;

const URL_SCHEMES: [&str; 3] = ["http", "https", "file"];

/// Resolve the toolchain described by the render settings.
pub fn toolchain(settings: &RenderSettings) -> Result<Toolchain, AppError> {
    let mut builder = Toolchain::builder().meta_tag_prefix(settings.meta_tag_prefix.clone());
    if let Some(binary) = settings.binary.as_ref() {
        builder = builder.binary(binary);
    }
    if let Some(xvfb) = settings.xvfb_binary.as_ref() {
        builder = builder.xvfb(xvfb);
    }
    Ok(builder.build()?)
}

/// Build the kit for `request`. `stdin` is drained only when `--stdin` was given.
pub fn build_kit(
    request: &RequestArgs,
    toolchain: Option<Toolchain>,
    stdin: impl Read,
) -> Result<ImgKit, AppError> {
    let source = resolve_source(request, stdin)?;
    debug!(
        target = "webshot::application::convert",
        source = source_label(&source),
        css = request.css.len(),
        "Resolved conversion source"
    );

    let mut builder = ImgKit::builder(source)
        .options(request_options(request))
        .toc(toc_options(&request.toc))
        .cover_first(request.cover_first)
        .stylesheets(request.css.iter().cloned());
    if let Some(cover) = request.cover.as_ref() {
        builder = builder.cover(cover.clone());
    }
    if let Some(toolchain) = toolchain {
        builder = builder.toolchain(toolchain);
    }
    Ok(builder.build()?)
}

pub fn resolve_source(request: &RequestArgs, stdin: impl Read) -> Result<Source, AppError> {
    if request.stdin {
        return Ok(Source::reader(stdin)?);
    }
    if request.inputs.is_empty() {
        return Err(AppError::validation(
            "nothing to render: pass at least one INPUT or --stdin",
        ));
    }

    let kind = match request.kind {
        InputKind::String => SourceKind::String,
        InputKind::File => SourceKind::File,
        InputKind::Url => SourceKind::Url,
        InputKind::Auto => detect_kind(&request.inputs)?,
    };
    Ok(Source::many(request.inputs.clone(), kind)?)
}

fn detect_kind(inputs: &[String]) -> Result<SourceKind, AppError> {
    let urls = inputs.iter().filter(|input| looks_like_url(input)).count();
    match urls {
        0 => Ok(SourceKind::File),
        n if n == inputs.len() => Ok(SourceKind::Url),
        _ => Err(AppError::validation(
            "cannot mix URLs and files in one request; pass --kind explicitly",
        )),
    }
}

fn looks_like_url(input: &str) -> bool {
    Url::parse(input)
        .map(|url| URL_SCHEMES.contains(&url.scheme()))
        .unwrap_or(false)
}

/// `-O` options first, then bare flags, then repeatable pairs.
pub fn request_options(request: &RequestArgs) -> Options {
    let mut options: Options = request
        .options
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    for flag in &request.flags {
        options.insert(flag, OptionValue::Flag);
    }
    for (key, name, value) in &request.pairs {
        options.push_pair(key, name.as_str(), value.as_str());
    }
    options
}

/// `KEY=VALUE` entries carry a value, a bare `KEY` is a flag.
pub fn toc_options(entries: &[String]) -> Options {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key, OptionValue::from(value)),
            None => (entry.as_str(), OptionValue::Flag),
        })
        .collect()
}

fn source_label(source: &Source) -> &'static str {
    match source {
        Source::String(_) => "string",
        Source::File(_) => "file",
        Source::Files(_) => "files",
        Source::Handle(_) => "stdin",
        Source::Url(_) => "url",
        Source::Urls(_) => "urls",
    }
}
