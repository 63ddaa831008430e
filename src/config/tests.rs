use std::io::Write;

use super::*;

#[test]
fn defaults_apply_without_sources() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.cache.compile_mode, CompileMode::Coalesce);
    assert!(settings.documents.root.is_none());
}

#[test]
fn json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.logging.json = Some(true);
    raw.logging.level = Some("debug".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).expect_err("level should be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn unknown_compile_mode_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.compile_mode = Some("eager".to_string());

    let err = Settings::from_raw(raw).expect_err("mode should be rejected");
    assert!(err.to_string().contains("cache.compile_mode"));
}

#[test]
fn empty_document_root_is_rejected() {
    let mut raw = RawSettings::default();
    raw.documents.root = Some(PathBuf::new());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn explicit_file_is_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        "[cache]\ncompile_mode = \"independent\"\n\n[documents]\nroot = \"/srv/views\"\n\n[logging]\nlevel = \"warn\""
    )
    .expect("write config");

    let settings = load(Some(file.path())).expect("settings load");

    assert_eq!(settings.cache.compile_mode, CompileMode::Independent);
    assert_eq!(settings.documents.root, Some(PathBuf::from("/srv/views")));
    assert_eq!(settings.logging.level, LevelFilter::WARN);
}

#[test]
fn missing_explicit_file_fails() {
    let err = load(Some(Path::new("/nonexistent/ssr-engine.toml"))).expect_err("file is required");
    assert!(matches!(err, LoadError::Build(_)));
}
