use std::{
    io::ErrorKind,
    path::Path,
    process::Stdio,
    time::Instant,
};

use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, info, warn};

use super::types::{RenderError, Rendered};

const QUIET_FLAG: &str = "--quiet";
const XVFB_HINT: &str = "You need to install xvfb (sudo apt-get install xvfb, yum install \
                         xorg-x11-server-Xvfb, etc), then add option: xvfb.";

/// Run `args` (program first), piping `stdin` in when given.
///
/// With `output` set the binary writes the image itself and the file is
/// checked afterwards; otherwise stdout is returned as the image bytes.
pub async fn run(
    args: &[String],
    stdin: Option<&[u8]>,
    output: Option<&Path>,
) -> Result<Rendered, RenderError> {
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| RenderError::configuration("empty command line"))?;
    let started_at = Instant::now();

    let mut child = Command::new(program)
        .args(rest)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| {
            warn!(
                target = "webshot::render::process",
                op = "process::run",
                result = "error",
                error_code = "spawn",
                program = %program,
                error = %err,
                "Failed to spawn rendering binary"
            );
            if err.kind() == ErrorKind::NotFound {
                RenderError::configuration(format!("cannot execute `{program}`: {err}"))
            } else {
                RenderError::Io(err)
            }
        })?;

    let feed = {
        let pipe = child.stdin.take();
        async move {
            let (Some(mut pipe), Some(bytes)) = (pipe, stdin) else {
                return Ok(());
            };
            pipe.write_all(bytes).await?;
            pipe.shutdown().await
        }
    };
    let (fed, collected) = tokio::join!(feed, child.wait_with_output());
    let output_data = collected?;
    match fed {
        // the binary may exit before draining stdin; its exit status tells the story
        Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
        Err(err) => return Err(RenderError::Io(err)),
        Ok(()) => {}
    }

    let mut stderr = String::from_utf8_lossy(&output_data.stderr).into_owned();
    if stderr.trim().is_empty() && output.is_some() {
        stderr = String::from_utf8_lossy(&output_data.stdout).into_owned();
    }
    let exit_code = output_data.status.code();
    let elapsed_ms = started_at.elapsed().as_millis() as u64;

    if let Err(err) = classify_failure(output_data.status.success(), exit_code, &stderr) {
        warn!(
            target = "webshot::render::process",
            op = "process::run",
            result = "error",
            elapsed_ms,
            exit_code = exit_code.map(i64::from).unwrap_or(-1),
            error_code = "render",
            stderr = %stderr,
            "Rendering binary failed"
        );
        return Err(err);
    }

    if !stderr.trim().is_empty() && !args.iter().any(|arg| arg == QUIET_FLAG) {
        debug!(
            target = "webshot::render::process",
            op = "process::run",
            stderr = %stderr.trim_end(),
            "Rendering binary diagnostics"
        );
    }

    let rendered = match output {
        None => Rendered::Bytes(output_data.stdout),
        Some(path) => {
            ensure_written(path, args).await?;
            Rendered::File(path.to_path_buf())
        }
    };

    info!(
        target = "webshot::render::process",
        op = "process::run",
        result = "ok",
        elapsed_ms,
        bytes = match &rendered {
            Rendered::Bytes(bytes) => bytes.len() as u64,
            Rendered::File(_) => 0,
        },
        "Rendered image via wkhtmltoimage"
    );

    Ok(rendered)
}

/// Map the exit status and captured stderr to a failure, if any.
pub fn classify_failure(
    success: bool,
    exit_code: Option<i32>,
    stderr: &str,
) -> Result<(), RenderError> {
    if stderr.contains("cannot connect to X server") {
        return Err(RenderError::NoDisplay {
            stderr: stderr.to_string(),
        });
    }
    if stderr.contains("Error") {
        return Err(RenderError::Reported {
            stderr: stderr.to_string(),
        });
    }
    if !success {
        let hint = stderr
            .contains("QXcbConnection")
            .then(|| XVFB_HINT.to_string());
        return Err(RenderError::Process {
            exit_code,
            stderr: stderr.to_string(),
            hint,
        });
    }
    Ok(())
}

async fn ensure_written(path: &Path, args: &[String]) -> Result<(), RenderError> {
    let empty = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len() == 0,
        Err(err) if err.kind() == ErrorKind::NotFound => true,
        Err(err) => return Err(RenderError::Io(err)),
    };
    if empty {
        return Err(RenderError::EmptyOutput {
            command: args.join(" "),
        });
    }
    Ok(())
}
