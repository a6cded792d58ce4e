//! Logging setup using the `log` facade and `env_logger` backend.
//!
//! `RUST_LOG` wins when set. Otherwise dupesieve's own modules log at the
//! level chosen by `-q`/`-v` (error, info, debug, trace) and dependencies
//! are held at warn until `-vv`.
//!
//! Debug builds prefix every line with a timestamp, plus the module path
//! with `-v`. Release builds print level and message only.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupesieve::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

const CRATE_TARGET: &str = "dupesieve";

/// Initialize logging from CLI verbosity flags.
///
/// A second call leaves the first logger in place.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by `RUST_LOG`)
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        let level = crate_level(verbose, quiet);
        builder
            .filter_level(dependency_level(verbose, level))
            .filter_module(CRATE_TARGET, level);
    }

    configure_format(&mut builder, verbose);

    match builder.try_init() {
        Ok(()) => log::debug!("Logging initialized (max level {})", log::max_level()),
        Err(_) => log::trace!("Logger already installed, keeping it"),
    }
}

/// Level for dupesieve's own modules. Quiet wins over verbose.
fn crate_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Level for third-party crates (jwalk, rayon, figment, rusqlite, trash).
fn dependency_level(verbose: u8, crate_level: LevelFilter) -> LevelFilter {
    if verbose >= 2 {
        crate_level
    } else {
        crate_level.min(LevelFilter::Warn)
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let ts = buf.timestamp_seconds();
        match record.module_path().filter(|_| verbose >= 1) {
            Some(module) => writeln!(
                buf,
                "{ts} {style}{:<5}{style:#} [{module}] {}",
                record.level(),
                record.args()
            ),
            None => writeln!(
                buf,
                "{ts} {style}{:<5}{style:#} {}",
                record.level(),
                record.args()
            ),
        }
    });

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        });
    }
}
