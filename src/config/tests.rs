use std::path::Path;

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.render.meta_tag_prefix = Some("file-".to_string());

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        meta_tag_prefix: Some("cli-".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.render.meta_tag_prefix, "cli-");
}

#[test]
fn defaults_search_path_with_imgkit_prefix() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.render.binary.is_none());
    assert!(settings.render.xvfb_binary.is_none());
    assert_eq!(settings.render.meta_tag_prefix, "imgkit-");
    assert_eq!(settings.logging.level, LevelFilter::WARN);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn empty_prefix_and_paths_are_rejected() {
    let mut raw = RawSettings::default();
    raw.render.meta_tag_prefix = Some("  ".to_string());
    let err = Settings::from_raw(raw).expect_err("empty prefix");
    assert!(matches!(err, LoadError::Invalid { key: "render.meta_tag_prefix", .. }));

    let mut raw = RawSettings::default();
    raw.render.binary = Some(PathBuf::new());
    let err = Settings::from_raw(raw).expect_err("empty binary");
    assert!(matches!(err, LoadError::Invalid { key: "render.binary", .. }));
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "webshot",
        "render",
        "http://ya.ru",
        "http://google.com",
        "-o",
        "/tmp/out.png",
        "-O",
        "format=png",
        "--option=--quality=80",
        "--flag",
        "disable-smart-width",
        "--pair",
        "cookie=session=abc",
        "--toc",
        "xsl-style-sheet=test.xsl",
        "--cover",
        "cover.html",
        "--cover-first",
        "--css",
        "a.css",
        "--binary",
        "/opt/wkhtmltoimage",
    ]);

    assert_eq!(
        args.overrides.binary.as_deref(),
        Some(Path::new("/opt/wkhtmltoimage"))
    );
    match args.command {
        Command::Render(request) => {
            assert_eq!(request.inputs, ["http://ya.ru", "http://google.com"]);
            assert_eq!(request.kind, InputKind::Auto);
            assert_eq!(request.output.as_deref(), Some(Path::new("/tmp/out.png")));
            assert_eq!(
                request.options,
                [
                    ("format".to_string(), "png".to_string()),
                    ("--quality".to_string(), "80".to_string())
                ]
            );
            assert_eq!(request.flags, ["disable-smart-width"]);
            assert_eq!(
                request.pairs,
                [(
                    "cookie".to_string(),
                    "session".to_string(),
                    "abc".to_string()
                )]
            );
            assert_eq!(request.toc, ["xsl-style-sheet=test.xsl"]);
            assert_eq!(request.cover.as_deref(), Some("cover.html"));
            assert!(request.cover_first);
            assert_eq!(request.css, [PathBuf::from("a.css")]);
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_command_subcommand_with_stdin() {
    let args = CliArgs::parse_from(["webshot", "command", "--stdin", "--kind", "string"]);

    match args.command {
        Command::PrintCommand(request) => {
            assert!(request.stdin);
            assert!(request.inputs.is_empty());
            assert_eq!(request.kind, InputKind::String);
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn malformed_option_arguments_fail() {
    assert!(CliArgs::try_parse_from(["webshot", "render", "x", "-O", "format"]).is_err());
    assert!(CliArgs::try_parse_from(["webshot", "render", "x", "-O", "=png"]).is_err());
    assert!(CliArgs::try_parse_from(["webshot", "render", "x", "--pair", "cookie=abc"]).is_err());
    assert!(CliArgs::try_parse_from(["webshot", "render", "x", "--pair", "cookie==v"]).is_err());
}
