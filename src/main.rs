use std::{io, process, time::Instant};

use tokio::io::AsyncWriteExt;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use webshot::{
    Rendered,
    application::{convert, error::AppError},
    config::{self, RequestArgs},
    infra::telemetry,
    render,
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    render::configure(convert::toolchain(&settings.render)?)?;

    match cli_args.command {
        config::Command::Render(request) => run_render(request).await,
        config::Command::PrintCommand(request) => run_print_command(request).await,
    }
}

async fn run_render(request: RequestArgs) -> Result<(), AppError> {
    let kit = convert::build_kit(&request, None, io::stdin())?;
    let output = request.output.as_deref();
    let started = Instant::now();

    match kit.to_image(output).await? {
        Rendered::Bytes(bytes) => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&bytes)
                .await
                .map_err(|err| AppError::unexpected(format!("failed to write image: {err}")))?;
            stdout
                .flush()
                .await
                .map_err(|err| AppError::unexpected(format!("failed to write image: {err}")))?;
            info!(
                target = "webshot::render",
                bytes = bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Image written to stdout"
            );
        }
        Rendered::File(path) => {
            info!(
                target = "webshot::render",
                path = %path.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Image written"
            );
        }
    }
    Ok(())
}

async fn run_print_command(request: RequestArgs) -> Result<(), AppError> {
    let kit = convert::build_kit(&request, None, io::stdin())?;
    let argv = kit.command(request.output.as_deref())?;
    let json = serde_json::to_string(&argv)
        .map_err(|err| AppError::unexpected(format!("failed to encode command: {err}")))?;

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{json}\n").as_bytes())
        .await
        .map_err(|err| AppError::unexpected(format!("failed to write command: {err}")))?;
    stdout
        .flush()
        .await
        .map_err(|err| AppError::unexpected(format!("failed to write command: {err}")))?;
    Ok(())
}
