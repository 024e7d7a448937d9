//! Logger initialisation shared by the command line tools.

use std::fs::File;

use log::LevelFilter;

/// Environment variable naming a file that receives the log output.
pub const LOG_FILE_VAR: &str = "TUNNEL_SCAN_LOG";

/// Initialises `env_logger`.
///
/// `RUST_LOG` takes precedence over `level`. When [`LOG_FILE_VAR`] names a
/// file the log is written there instead of stderr. Calling this more than
/// once is harmless.
pub fn init_logging(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    if let Ok(path) = std::env::var(LOG_FILE_VAR) {
        match File::create(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Failed to create log file {}: {}", path, e);
            }
        }
    }
    // A logger installed earlier (e.g. by a test harness) stays in place.
    let _ = builder.try_init();
}
