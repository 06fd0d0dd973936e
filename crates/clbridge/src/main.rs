mod exit;
mod logging;

use std::io;

use clap::Parser;
use tracing::{info, warn};

use clbridge_expr::ExprEngine;
use clbridge_frame::DEFAULT_MAX_PAYLOAD;
use clbridge_session::{Session, SessionConfig, SessionExit, DEFAULT_MAX_DEPTH};

use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "clbridge",
    version,
    about = "Bridge worker serving a Lisp host over stdin/stdout"
)]
struct Cli {
    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Maximum host-callback nesting depth.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum framed payload size in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PAYLOAD)]
    max_payload_size: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let config = SessionConfig {
        max_depth: cli.max_depth,
        max_payload_size: cli.max_payload_size,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::with_config(stdin.lock(), stdout.lock(), config);
    let mut engine = ExprEngine::new();

    match session.run(&mut engine) {
        Ok(SessionExit::Quit) => {
            info!("host ended the session");
            std::process::exit(exit::SUCCESS);
        }
        Ok(SessionExit::Return(_)) => {
            warn!("session ended by a stray return");
            std::process::exit(exit::SUCCESS);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(exit::session_error(&err));
        }
    }
}
