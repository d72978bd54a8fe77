use std::io::Write;

use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use crate::config::Settings;
use crate::verdict::Verdict;

/// Initialize operator-facing logging on stderr.
///
/// stdout stays untouched: git reads nothing from the hook, and anything the
/// operator needs goes to the terminal via stderr.
pub fn init(settings: &Settings) {
    let level = match settings.log_level.as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Append a verdict record to the configured decision log.
/// Best-effort: failures are silently ignored (logging must never change the
/// verdict or block the hook).
pub fn log_verdict(settings: &Settings, verdict: &Verdict) {
    if settings.log_file.is_empty() {
        return;
    }
    let path = std::path::PathBuf::from(shellexpand::tilde(&settings.log_file).into_owned());
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return;
    };

    let (cause, reason) = match verdict {
        Verdict::Allowed => ("-".into(), String::new()),
        Verdict::Blocked { cause, reason } => {
            // Compact single-line reason for the log
            (cause.label().to_string(), reason.replace('\n', "; "))
        }
    };
    let ts = timestamp_now();

    let _ = writeln!(
        file,
        "{ts}\t{decision}\t{cause}\t{reason}",
        decision = verdict.as_str(),
    );
}

/// Simple UTC timestamp without external deps.
fn timestamp_now() -> String {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = dur.as_secs();
    let days = secs / 86400;
    let rem = secs % 86400;
    let h = rem / 3600;
    let m = (rem % 3600) / 60;
    let s = rem % 60;
    let (year, month, day) = epoch_days_to_date(days);
    format!("{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}Z")
}

/// Convert days since Unix epoch to (year, month, day).
fn epoch_days_to_date(days: u64) -> (u64, u64, u64) {
    // Civil calendar from days algorithm (Howard Hinnant)
    let z = days + 719468;
    let era = z / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}
