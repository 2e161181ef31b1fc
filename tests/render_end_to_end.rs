#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use webshot::{
    ConvertOptions, ImgKit, Options, RenderError, Rendered, Source, Toolchain, from_file,
    from_reader, from_string, from_url, from_urls,
};

/// Stand-in for wkhtmltoimage: echoes the document behind a `PNG` marker.
const FAKE_BINARY: &str = r#"#!/bin/sh
prev=""
out=""
for arg in "$@"; do
  prev="$out"
  out="$arg"
  case "$arg" in
    --crash) echo "segmentation fault" >&2; exit 3 ;;
    --no-display) echo "QXcbConnection: cannot connect to X server" >&2; exit 1 ;;
    --write-nothing) exit 0 ;;
  esac
done
case "$prev" in
  -) body=$(cat) ;;
  *wrong*) echo "Error: Failed loading page $prev" >&2; exit 1 ;;
  http*) body="url:$prev" ;;
  *) body=$(cat "$prev") ;;
esac
if [ "$out" = "-" ]; then
  printf 'PNG\n%s' "$body"
else
  printf 'PNG\n%s' "$body" > "$out"
fi
"#;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn write_fake_binary(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("wkhtmltoimage");
    fs::write(&path, FAKE_BINARY).expect("write fake binary");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake binary");
    path
}

fn convert_options(dir: &TempDir, options: Options) -> ConvertOptions {
    let toolchain = Toolchain::builder()
        .binary(write_fake_binary(dir))
        .build()
        .expect("toolchain");
    ConvertOptions {
        toolchain: Some(toolchain),
        ..ConvertOptions::new(options)
    }
}

#[tokio::test]
async fn string_source_is_piped_and_returned_as_bytes() {
    let dir = TempDir::new().expect("tempdir");
    let rendered = from_string("<h1>Oh Hai!</h1>", None, convert_options(&dir, Options::new()))
        .await
        .expect("render");

    assert_eq!(
        rendered.into_bytes().expect("bytes"),
        b"PNG\n<h1>Oh Hai!</h1>".to_vec()
    );
}

#[tokio::test]
async fn url_source_is_passed_as_argument() {
    let dir = TempDir::new().expect("tempdir");
    let rendered = from_url("http://ya.ru", None, convert_options(&dir, Options::new()))
        .await
        .expect("render");

    assert_eq!(
        rendered.into_bytes().expect("bytes"),
        b"PNG\nurl:http://ya.ru".to_vec()
    );
}

#[tokio::test]
async fn reader_source_is_piped() {
    let dir = TempDir::new().expect("tempdir");
    let html = tokio::fs::File::open(fixture("example.html"))
        .await
        .expect("open fixture");
    let rendered = from_reader(html, None, convert_options(&dir, Options::new()))
        .await
        .expect("render");

    let bytes = rendered.into_bytes().expect("bytes");
    assert!(String::from_utf8_lossy(&bytes).contains("Oh Hai!"));
}

#[tokio::test]
async fn output_path_is_written_by_the_binary() {
    let dir = TempDir::new().expect("tempdir");
    let output = dir.path().join("out.png");
    let rendered = from_file(
        fixture("example.html"),
        Some(&output),
        convert_options(&dir, Options::new()),
    )
    .await
    .expect("render");

    assert!(matches!(&rendered, Rendered::File(path) if path == &output));
    let written = fs::read_to_string(&output).expect("read output");
    assert!(written.starts_with("PNG\n"));
    assert!(written.contains("Oh Hai!"));
}

#[tokio::test]
async fn empty_output_file_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let output = dir.path().join("out.png");
    let options = Options::new().with("write-nothing", true);
    let err = from_string("<p>x</p>", Some(&output), convert_options(&dir, options))
        .await
        .expect_err("nothing written");

    assert!(matches!(err, RenderError::EmptyOutput { .. }));
}

#[tokio::test]
async fn error_in_stderr_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let err = from_urls(
        ["http://ya.ru", "http://wrong.example"],
        None,
        convert_options(&dir, Options::new()),
    )
    .await
    .expect_err("failed page");

    match err {
        RenderError::Reported { stderr } => assert!(stderr.contains("Failed loading page")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_zero_exit_carries_code() {
    let dir = TempDir::new().expect("tempdir");
    let options = Options::new().with("crash", true);
    let err = from_string("<p>x</p>", None, convert_options(&dir, options))
        .await
        .expect_err("crash");

    match err {
        RenderError::Process {
            exit_code, stderr, ..
        } => {
            assert_eq!(exit_code, Some(3));
            assert!(stderr.contains("segmentation fault"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_display_is_detected() {
    let dir = TempDir::new().expect("tempdir");
    let options = Options::new().with("no-display", true);
    let err = from_string("<p>x</p>", None, convert_options(&dir, options))
        .await
        .expect_err("no display");

    assert!(matches!(err, RenderError::NoDisplay { .. }));
}

#[tokio::test]
async fn stylesheets_are_injected_before_piping() {
    let dir = TempDir::new().expect("tempdir");
    let convert = ConvertOptions {
        css: vec![fixture("example.css")],
        ..convert_options(&dir, Options::new())
    };
    let rendered = from_file(fixture("example.html"), None, convert)
        .await
        .expect("render");

    let body = String::from_utf8(rendered.into_bytes().expect("bytes")).expect("utf8");
    assert!(body.contains("<style>body { font-size: 20px; }"));
    assert!(body.contains("Oh Hai!"));
}

#[tokio::test]
async fn stylesheets_on_urls_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let convert = ConvertOptions {
        css: vec![fixture("example.css")],
        ..convert_options(&dir, Options::new())
    };
    let err = from_url("http://ya.ru", None, convert)
        .await
        .expect_err("mismatch");

    assert!(matches!(err, RenderError::SourceMismatch(_)));
}

#[tokio::test]
async fn meta_tags_reach_the_command_line() {
    let dir = TempDir::new().expect("tempdir");
    let toolchain = Toolchain::builder()
        .binary(write_fake_binary(&dir))
        .build()
        .expect("toolchain");
    let markup = r#"<html><head><meta name="imgkit-quality" content="60"></head><body></body></html>"#;
    let kit = ImgKit::builder(Source::string(markup))
        .toolchain(toolchain)
        .build()
        .expect("kit");

    let argv = kit.command(None).expect("command");
    let at = argv.iter().position(|arg| arg == "--quality").expect("quality flag");
    assert_eq!(argv[at + 1], "60");

    let bytes = kit
        .to_image(None)
        .await
        .expect("render")
        .into_bytes()
        .expect("bytes");
    assert!(String::from_utf8_lossy(&bytes).contains("imgkit-quality"));
}
