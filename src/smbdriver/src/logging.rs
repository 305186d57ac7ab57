// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::io::Write;
use std::process;

use anyhow::{anyhow, Result};
use slog::{o, Drain, Logger};

// XXX: 'writer' param used to make testing possible.
pub fn create_logger<W>(name: &str, source: &str, level: slog::Level, writer: W) -> Logger
where
    W: Write + Send + 'static,
{
    let json_drain = slog_json::Json::new(writer)
        .add_default_keys()
        .build()
        .fuse();

    // Discard records below the configured level before they hit the
    // async channel.
    let filter_drain = slog::LevelFilter::new(json_drain, level).fuse();

    // Ensure the logger is thread-safe
    let async_drain = slog_async::Async::new(filter_drain).build().fuse();

    // Add some "standard" fields
    Logger::root(
        async_drain,
        o!("version" => env!("CARGO_PKG_VERSION"),
            "pid" => process::id().to_string(),
            "name" => name.to_string(),
            "source" => source.to_string()),
    )
}

/// Map the lager-style level names used by deployment properties to slog
/// levels.
pub fn parse_level(level: &str) -> Result<slog::Level> {
    let level = match level {
        "fatal" => slog::Level::Critical,
        "error" => slog::Level::Error,
        "warn" | "warning" => slog::Level::Warning,
        "info" => slog::Level::Info,
        "debug" => slog::Level::Debug,
        _ => return Err(anyhow!("invalid log level: {}", level)),
    };

    Ok(level)
}

/// Logger that drops everything; handy where a test only needs to satisfy
/// a signature.
pub fn discard_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}
