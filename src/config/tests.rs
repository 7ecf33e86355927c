use clap::Parser;

use super::*;

fn legacy(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    }
}

#[test]
fn defaults_match_the_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.uploads.max_file_bytes.get(), 5 * 1024 * 1024);
    assert_eq!(settings.uploads.max_request_bytes.get(), 32 * 1024 * 1024);
    assert_eq!(settings.auth.token_ttl_hours.get(), 168);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.ttl_seconds, 604_800);
    assert_eq!(settings.cache.sweep_interval_seconds, 600);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn legacy_variables_fill_unset_keys() {
    let mut raw = RawSettings::default();
    raw.apply_legacy_env(legacy(&[
        ("PORT", "9000"),
        ("POSTGRES_DSN", "postgres://legacy"),
        ("ADMIN_PASSWORD", "espresso"),
        ("JWT_SECRET", "beans"),
    ]))
    .expect("legacy env");

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.server.addr.port(), 9000);
    assert_eq!(settings.database.url.as_deref(), Some("postgres://legacy"));
    assert_eq!(settings.auth.admin_password.as_deref(), Some("espresso"));
    assert_eq!(settings.auth.jwt_secret.as_deref(), Some("beans"));
}

#[test]
fn structured_keys_win_over_legacy_variables() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://structured".into());
    raw.apply_legacy_env(legacy(&[("POSTGRES_DSN", "postgres://legacy")]))
        .expect("legacy env");

    assert_eq!(raw.database.url.as_deref(), Some("postgres://structured"));
}

#[test]
fn malformed_legacy_port_is_rejected() {
    let mut raw = RawSettings::default();
    let err = raw
        .apply_legacy_env(legacy(&[("PORT", "eighty")]))
        .expect_err("bad port");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn serve_requires_secrets_and_database() {
    let serve = Command::Serve(ServeArgs::default());

    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://example".into());
    let settings = Settings::from_raw(raw.clone()).expect("valid settings");
    assert!(matches!(
        settings.validate_for(&serve),
        Err(LoadError::Invalid {
            key: "auth.admin_password",
            ..
        })
    ));

    raw.auth.admin_password = Some("espresso".into());
    raw.auth.jwt_secret = Some("beans".into());
    let settings = Settings::from_raw(raw).expect("valid settings");
    settings.validate_for(&serve).expect("ready to serve");
}

#[test]
fn migrate_only_needs_the_database() {
    let migrate = Command::Migrate(MigrateArgs::default());

    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert!(matches!(
        settings.validate_for(&migrate),
        Err(LoadError::Invalid {
            key: "database.url",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://example".into());
    let settings = Settings::from_raw(raw).expect("valid settings");
    settings.validate_for(&migrate).expect("ready to migrate");
}

#[test]
fn blank_secrets_count_as_missing() {
    let mut raw = RawSettings::default();
    raw.auth.admin_password = Some("   ".into());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.auth.admin_password.is_none());
}

#[test]
fn file_limit_cannot_exceed_request_limit() {
    let mut raw = RawSettings::default();
    raw.uploads.max_file_bytes = Some(64 * 1024 * 1024);
    let err = Settings::from_raw(raw).expect_err("file limit above request limit");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "uploads.max_file_bytes",
            ..
        }
    ));
}

#[test]
fn auth_settings_debug_hides_secrets() {
    let mut raw = RawSettings::default();
    raw.auth.admin_password = Some("espresso".into());
    raw.auth.jwt_secret = Some("beans".into());
    let settings = Settings::from_raw(raw).expect("valid settings");

    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("espresso"));
    assert!(!rendered.contains("beans"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["cafe-between"]);
    assert!(matches!(args.command_or_default(), Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "cafe-between",
        "serve",
        "--host",
        "127.0.0.1",
        "--port",
        "3000",
        "--database-url",
        "postgres://override",
        "--uploads-dir",
        "/var/lib/cafe/uploads",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.host.as_deref(), Some("127.0.0.1"));
            assert_eq!(serve.overrides.port, Some(3000));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(
                serve.overrides.uploads_directory.as_deref(),
                Some(std::path::Path::new("/var/lib/cafe/uploads"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "cafe-between",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}
