//! leakgate: pre-commit secret gate.
//!
//! Invoked by git's pre-commit hook with no arguments; the exit status is
//! the whole contract: 0 lets the commit proceed, non-zero aborts it.

use std::path::PathBuf;
use std::process;

use leakgate::config::Config;
use leakgate::{hook, logging};

const USAGE: &str = "usage: leakgate [--config <path>] [--version]\n       leakgate install [--force]";

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut install = false;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("leakgate {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--config" => match args.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => {
                    eprintln!("leakgate: --config requires a path");
                    eprintln!("{USAGE}");
                    process::exit(2);
                }
            },
            "install" => install = true,
            "--force" => force = true,
            other => {
                eprintln!("leakgate: unknown argument: {other}");
                eprintln!("{USAGE}");
                process::exit(2);
            }
        }
    }

    let config = Config::load(config_path.as_deref());
    logging::init(&config.settings);

    if install {
        match hook::install(force) {
            Ok(path) => {
                log::info!("pre-commit hook installed at {}", path.display());
                return;
            }
            Err(e) => {
                log::error!("{e}");
                process::exit(2);
            }
        }
    }

    let verdict = leakgate::run_gate(&config);
    logging::log_verdict(&config.settings, &verdict);
    process::exit(verdict.exit_code());
}
