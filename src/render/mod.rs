//! HTML-to-image conversion through an external `wkhtmltoimage` binary.
//!
//! A request is a [`Source`] plus [`Options`]; [`ImgKit`] folds meta-tag
//! options out of in-memory markup, injects stylesheets, builds the
//! argument vector and awaits the child process.

mod command;
mod kit;
mod markup;
mod options;
mod process;
mod source;
mod toolchain;
mod types;

pub use command::{CommandParts, STDIO_TOKEN, build_command};
pub use kit::{ImgKit, ImgKitBuilder};
pub use markup::{inject_stylesheets, scan_meta_options, style_block};
pub use options::{OptionValue, Options, canonical_key};
pub use process::classify_failure;
pub use source::{Source, SourceKind};
pub use toolchain::{
    DEFAULT_BINARY_NAME, DEFAULT_META_TAG_PREFIX, DEFAULT_XVFB_NAME, Toolchain, ToolchainBuilder,
    configure, default_toolchain,
};
pub use types::{RenderError, Rendered};
