use std::{
    env,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use once_cell::sync::OnceCell;
use tracing::debug;

use super::types::RenderError;

pub const DEFAULT_BINARY_NAME: &str = "wkhtmltoimage";
pub const DEFAULT_XVFB_NAME: &str = "xvfb-run";
pub const DEFAULT_META_TAG_PREFIX: &str = "imgkit-";

/// Resolved external programs plus the meta-tag prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub(crate) binary: PathBuf,
    pub(crate) xvfb: Option<PathBuf>,
    pub(crate) meta_tag_prefix: String,
}

impl Toolchain {
    pub fn builder() -> ToolchainBuilder {
        ToolchainBuilder::default()
    }

    /// Resolve everything from `PATH` with the default prefix.
    pub fn from_env() -> Result<Self, RenderError> {
        Self::builder().build()
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn xvfb(&self) -> Option<&Path> {
        self.xvfb.as_deref()
    }

    pub fn meta_tag_prefix(&self) -> &str {
        &self.meta_tag_prefix
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolchainBuilder {
    binary: Option<PathBuf>,
    xvfb: Option<PathBuf>,
    meta_tag_prefix: Option<String>,
}

impl ToolchainBuilder {
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    pub fn xvfb(mut self, path: impl Into<PathBuf>) -> Self {
        self.xvfb = Some(path.into());
        self
    }

    pub fn meta_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.meta_tag_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Result<Toolchain, RenderError> {
        let binary = match self.binary {
            Some(path) => {
                if !path.is_file() {
                    return Err(RenderError::configuration(format!(
                        "no wkhtmltoimage executable found at `{}`; install wkhtmltopdf \
                         or pass the binary path explicitly",
                        path.display()
                    )));
                }
                path
            }
            None => find_in_path(DEFAULT_BINARY_NAME).ok_or_else(|| {
                RenderError::configuration(
                    "no wkhtmltoimage executable found on PATH; install wkhtmltopdf \
                     or pass the binary path explicitly",
                )
            })?,
        };

        let xvfb = match self.xvfb {
            Some(path) if !path.is_file() => {
                return Err(RenderError::configuration(format!(
                    "no xvfb-run executable found at `{}`",
                    path.display()
                )));
            }
            Some(path) => Some(path),
            None => find_in_path(DEFAULT_XVFB_NAME),
        };

        let meta_tag_prefix = self
            .meta_tag_prefix
            .unwrap_or_else(|| DEFAULT_META_TAG_PREFIX.to_string());
        if meta_tag_prefix.is_empty() {
            return Err(RenderError::configuration(
                "meta tag prefix must not be empty",
            ));
        }

        debug!(
            target = "webshot::render::toolchain",
            binary = %binary.display(),
            xvfb = ?xvfb,
            meta_tag_prefix = %meta_tag_prefix,
            "Resolved rendering toolchain"
        );

        Ok(Toolchain {
            binary,
            xvfb,
            meta_tag_prefix,
        })
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    find_in(&paths, name)
}

fn find_in(paths: &OsStr, name: &str) -> Option<PathBuf> {
    env::split_paths(paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

static DEFAULT_TOOLCHAIN: OnceCell<Toolchain> = OnceCell::new();

/// Install the process-wide toolchain. Fails if one is already in place.
pub fn configure(toolchain: Toolchain) -> Result<(), RenderError> {
    DEFAULT_TOOLCHAIN
        .set(toolchain)
        .map_err(|_| RenderError::configuration("toolchain already configured"))
}

/// The process-wide toolchain, resolved from `PATH` on first use.
pub fn default_toolchain() -> Result<&'static Toolchain, RenderError> {
    DEFAULT_TOOLCHAIN.get_or_try_init(Toolchain::from_env)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn explicit_binary_must_exist() {
        let err = Toolchain::builder()
            .binary("wrongpath")
            .build()
            .expect_err("missing binary");
        assert!(matches!(err, RenderError::Configuration { .. }));
    }

    #[test]
    fn custom_prefix_and_paths() {
        let dir = TempDir::new().expect("temp dir");
        let binary = dir.path().join("wkhtmltoimage");
        let xvfb = dir.path().join("xvfb-run");
        std::fs::write(&binary, "").expect("write binary");
        std::fs::write(&xvfb, "").expect("write xvfb");

        let toolchain = Toolchain::builder()
            .binary(&binary)
            .xvfb(&xvfb)
            .meta_tag_prefix("prefix-")
            .build()
            .expect("toolchain");

        assert_eq!(toolchain.binary(), binary.as_path());
        assert_eq!(toolchain.xvfb(), Some(xvfb.as_path()));
        assert_eq!(toolchain.meta_tag_prefix(), "prefix-");
    }

    #[test]
    fn default_prefix() {
        let dir = TempDir::new().expect("temp dir");
        let binary = dir.path().join("wkhtmltoimage");
        std::fs::write(&binary, "").expect("write binary");

        let toolchain = Toolchain::builder().binary(&binary).build().expect("toolchain");
        assert_eq!(toolchain.meta_tag_prefix(), DEFAULT_META_TAG_PREFIX);
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let binary = dir.path().join("wkhtmltoimage");
        std::fs::write(&binary, "").expect("write binary");

        let err = Toolchain::builder()
            .binary(&binary)
            .meta_tag_prefix("")
            .build()
            .expect_err("empty prefix");
        assert!(matches!(err, RenderError::Configuration { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn path_search_skips_non_executable_files() {
        use std::os::unix::fs::PermissionsExt;

        let stray = TempDir::new().expect("temp dir");
        let real = TempDir::new().expect("temp dir");
        std::fs::write(stray.path().join(DEFAULT_BINARY_NAME), "").expect("write stray");
        let binary = real.path().join(DEFAULT_BINARY_NAME);
        std::fs::write(&binary, "#!/bin/sh\n").expect("write binary");
        let mut perms = std::fs::metadata(&binary).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&binary, perms).expect("chmod binary");

        let paths = env::join_paths([stray.path(), real.path()]).expect("join paths");
        assert_eq!(find_in(&paths, DEFAULT_BINARY_NAME), Some(binary));

        let paths = env::join_paths([stray.path()]).expect("join paths");
        assert_eq!(find_in(&paths, DEFAULT_BINARY_NAME), None);
    }
}
