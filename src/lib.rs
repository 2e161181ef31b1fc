//! Render HTML strings, files and URLs to images with `wkhtmltoimage`.

pub mod api;
pub mod application;
pub mod config;
pub mod infra;
pub mod render;

pub use api::{
    ConvertOptions, config as toolchain_config, from_file, from_files, from_reader, from_string,
    from_url, from_urls,
};
pub use render::{
    ImgKit, OptionValue, Options, RenderError, Rendered, Source, SourceKind, Toolchain,
};
