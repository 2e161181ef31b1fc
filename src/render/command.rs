use std::path::Path;

use super::{
    options::Options,
    source::Source,
    toolchain::Toolchain,
    types::RenderError,
};

/// Token that makes the binary read from stdin or write to stdout.
pub const STDIO_TOKEN: &str = "-";

const XVFB_KEY: &str = "xvfb";

/// Everything that contributes to one command line.
#[derive(Debug, Clone, Copy)]
pub struct CommandParts<'a> {
    pub toolchain: &'a Toolchain,
    pub options: &'a Options,
    pub toc: &'a Options,
    pub cover: Option<&'a str>,
    pub cover_first: bool,
    pub source: &'a Source,
}

/// Build the argv, binary first:
/// `[xvfb-run -a] binary [options] [toc] [cover] sources output`,
/// with cover ahead of toc when `cover_first` is set.
pub fn build_command(parts: CommandParts<'_>, output: Option<&Path>) -> Result<Vec<String>, RenderError> {
    let mut options = parts.options.clone();
    // the key's presence turns the wrapper on, whatever its value
    let wants_xvfb = options.remove(XVFB_KEY).is_some();

    let mut args = Vec::new();
    if wants_xvfb {
        let xvfb = parts.toolchain.xvfb().ok_or_else(|| {
            RenderError::configuration(
                "the xvfb option needs xvfb-run; install xvfb or configure its path",
            )
        })?;
        args.push(xvfb.display().to_string());
        // let xvfb-run pick a free server number so concurrent runs do not collide
        args.push("-a".to_string());
    }

    args.push(parts.toolchain.binary().display().to_string());
    args.extend(options.to_args()?);

    let cover = parts.cover.filter(|cover| !cover.is_empty());
    if parts.cover_first {
        push_cover(&mut args, cover);
        push_toc(&mut args, parts.toc)?;
    } else {
        push_toc(&mut args, parts.toc)?;
        push_cover(&mut args, cover);
    }

    args.extend(parts.source.to_args());
    args.push(match output {
        Some(path) => path.display().to_string(),
        None => STDIO_TOKEN.to_string(),
    });

    Ok(args)
}

fn push_toc(args: &mut Vec<String>, toc: &Options) -> Result<(), RenderError> {
    if toc.is_empty() {
        return Ok(());
    }
    args.push("toc".to_string());
    args.extend(toc.to_args()?);
    Ok(())
}

fn push_cover(args: &mut Vec<String>, cover: Option<&str>) {
    if let Some(cover) = cover {
        args.push("cover".to_string());
        args.push(cover.to_string());
    }
}
