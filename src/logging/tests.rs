// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel};

#[test]
fn test_log_level_bounds() {
    assert_eq!(LogLevel::new(6).unwrap(), LogLevel::DUMP);
    let err = LogLevel::new(7).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'log_level' in section '[global]': log level must be 0-6, got 7"
    );
    assert_eq!(LogLevel::from_u8(9), None);
}

#[test]
fn test_log_level_filters() {
    let filters: Vec<_> = (0..=6)
        .filter_map(LogLevel::from_u8)
        .map(LogLevel::to_filter_string)
        .collect();
    insta::assert_debug_snapshot!(filters, @r#"
    [
        "off",
        "error",
        "warn",
        "info",
        "debug",
        "info,vcal=trace",
        "trace",
    ]
    "#);
    assert_eq!(LogLevel::SILENT.to_tracing_level(), None);
    assert_eq!(
        LogLevel::DUMP.to_tracing_level(),
        Some(tracing::Level::TRACE)
    );
}

#[test]
fn test_log_level_from_verbosity() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::INFO);
    assert_eq!(LogLevel::from_verbosity(1), LogLevel::DEBUG);
    assert_eq!(LogLevel::from_verbosity(200), LogLevel::DUMP);
}

#[test]
fn test_log_level_serde() {
    let level: LogLevel = serde_json::from_str("4").unwrap();
    assert_eq!(level, LogLevel::DEBUG);
    assert_eq!(serde_json::to_string(&LogLevel::WARN).unwrap(), "2");
    assert!(serde_json::from_str::<LogLevel>("12").is_err());
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::INFO);
    assert_eq!(config.file_level(), LogLevel::TRACE);
    assert!(config.log_file().is_none());
    assert!(!config.json_file());

    let config = LogConfig::builder()
        .with_log_file("logs/vcal.log")
        .with_json_file(true)
        .build();
    assert_eq!(
        config.log_file(),
        Some(std::path::Path::new("logs/vcal.log"))
    );
    assert!(config.json_file());
}
