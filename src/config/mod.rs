//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::render::DEFAULT_META_TAG_PREFIX;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "webshot";
const ENV_PREFIX: &str = "WEBSHOT";

/// Command-line arguments for the webshot binary.
#[derive(Debug, Parser)]
#[command(
    name = "webshot",
    version,
    about = "Render HTML strings, files and URLs to images with wkhtmltoimage"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "WEBSHOT_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render the input and write the image to --output or stdout.
    Render(RequestArgs),
    /// Print the wkhtmltoimage command line as a JSON array without running it.
    #[command(name = "command")]
    PrintCommand(RequestArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Path to the wkhtmltoimage executable.
    #[arg(long = "binary", value_name = "PATH", value_hint = ValueHint::ExecutablePath, global = true)]
    pub binary: Option<PathBuf>,

    /// Path to the xvfb-run executable.
    #[arg(long = "xvfb-binary", value_name = "PATH", value_hint = ValueHint::ExecutablePath, global = true)]
    pub xvfb_binary: Option<PathBuf>,

    /// Prefix of `<meta name=...>` tags that carry options.
    #[arg(long = "meta-tag-prefix", value_name = "PREFIX", global = true)]
    pub meta_tag_prefix: Option<String>,
}

/// How positional inputs are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InputKind {
    /// URLs with an http, https or file scheme are URLs, anything else a file.
    #[default]
    Auto,
    String,
    File,
    Url,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RequestArgs {
    /// Files, URLs or (with --kind string) inline markup.
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    #[arg(long, value_enum, default_value_t = InputKind::Auto)]
    pub kind: InputKind,

    /// Read the document from stdin.
    #[arg(long, conflicts_with = "inputs")]
    pub stdin: bool,

    /// Write the image here instead of stdout.
    #[arg(short, long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Option passed to wkhtmltoimage; an empty value drops the option.
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// Option passed without a value.
    #[arg(long = "flag", value_name = "KEY")]
    pub flags: Vec<String>,

    /// Repeatable option taking two values, e.g. `cookie=name=value`.
    #[arg(long = "pair", value_name = "KEY=NAME=VALUE", value_parser = parse_pair)]
    pub pairs: Vec<(String, String, String)>,

    /// Table-of-contents option; `KEY` alone passes a bare flag.
    #[arg(long = "toc", value_name = "KEY[=VALUE]")]
    pub toc: Vec<String>,

    /// Cover page path or URL.
    #[arg(long, value_name = "PAGE")]
    pub cover: Option<String>,

    /// Put the cover block before the table of contents.
    #[arg(long = "cover-first")]
    pub cover_first: bool,

    /// Stylesheet to inject into the document head.
    #[arg(long = "css", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub css: Vec<PathBuf>,
}

impl Command {
    pub fn request(&self) -> &RequestArgs {
        match self {
            Command::Render(args) | Command::PrintCommand(args) => args,
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.trim_start_matches('-').is_empty() {
        return Err(format!("missing option name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_pair(raw: &str) -> Result<(String, String, String), String> {
    let (key, rest) = parse_key_value(raw)?;
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=NAME=VALUE, got `{raw}`"))?;
    if name.is_empty() || value.is_empty() {
        return Err(format!("pair name and value must not be empty in `{raw}`"));
    }
    Ok((key, name.to_string(), value.to_string()))
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// `None` means search `PATH`.
    pub binary: Option<PathBuf>,
    pub xvfb_binary: Option<PathBuf>,
    pub meta_tag_prefix: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.binary.as_ref() {
            self.render.binary = Some(path.clone());
        }
        if let Some(path) = overrides.xvfb_binary.as_ref() {
            self.render.xvfb_binary = Some(path.clone());
        }
        if let Some(prefix) = overrides.meta_tag_prefix.as_ref() {
            self.render.meta_tag_prefix = Some(prefix.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, render } = raw;

        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;

        Ok(Self { logging, render })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let binary = non_empty_path(render.binary, "render.binary")?;
    let xvfb_binary = non_empty_path(render.xvfb_binary, "render.xvfb_binary")?;

    let meta_tag_prefix = render
        .meta_tag_prefix
        .unwrap_or_else(|| DEFAULT_META_TAG_PREFIX.to_string());
    if meta_tag_prefix.trim().is_empty() {
        return Err(LoadError::invalid(
            "render.meta_tag_prefix",
            "prefix must not be empty",
        ));
    }

    Ok(RenderSettings {
        binary,
        xvfb_binary,
        meta_tag_prefix,
    })
}

fn non_empty_path(path: Option<PathBuf>, key: &'static str) -> Result<Option<PathBuf>, LoadError> {
    match path {
        Some(path) if path.as_os_str().is_empty() => {
            Err(LoadError::invalid(key, "path must not be empty"))
        }
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    binary: Option<PathBuf>,
    xvfb_binary: Option<PathBuf>,
    meta_tag_prefix: Option<String>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
