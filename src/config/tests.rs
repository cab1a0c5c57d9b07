use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_leave_optional_tiers_disabled() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.database.url.is_none());
    assert!(settings.mirror.path.is_none());
    assert_eq!(settings.fallback.path, PathBuf::from("data/gallery.json"));
    assert_eq!(
        settings.database.max_connections.get(),
        DEFAULT_DB_MAX_CONNECTIONS
    );
}

#[test]
fn blank_database_url_disables_primary() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn cache_and_tier_defaults() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.stale_after, Duration::from_secs(30));
    assert_eq!(settings.tiers.store_timeout, Duration::from_millis(5_000));
    assert!(settings.tiers.fall_through_on_empty);
}

#[test]
fn zero_staleness_window_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.stale_after_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero window must be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.stale_after_seconds",
            ..
        }
    ));
}

#[test]
fn zero_store_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.tiers.store_timeout_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
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
fn tier_overrides_apply() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        mirror_path: Some(PathBuf::from("/var/lib/galleria/mirror.db")),
        fallback_path: Some(PathBuf::from("/var/lib/galleria/gallery.json")),
        cache_stale_after_seconds: Some(10),
        store_timeout_ms: Some(250),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.mirror.path.as_deref(),
        Some(std::path::Path::new("/var/lib/galleria/mirror.db"))
    );
    assert_eq!(
        settings.fallback.path,
        PathBuf::from("/var/lib/galleria/gallery.json")
    );
    assert_eq!(settings.cache.stale_after, Duration::from_secs(10));
    assert_eq!(settings.tiers.store_timeout, Duration::from_millis(250));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["galleria"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "galleria",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--log-json",
        "--store-timeout-ms",
        "1200",
    ]);

    let Command::Serve(serve) = args.command.expect("serve command");
    assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
    assert_eq!(
        serve.overrides.database_url.as_deref(),
        Some("postgres://override")
    );
    assert_eq!(serve.overrides.log_json, Some(true));
    assert_eq!(serve.overrides.store_timeout_ms, Some(1200));
}
