use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::config::ScannerConfig;
use crate::error::GateError;
use crate::extract::CandidateChange;
use crate::scan::{Classification, Classifier};

/// How often the child is polled while waiting for it to exit.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Maximum reason lines surfaced from raw scanner output.
const MAX_REASON_LINES: usize = 10;

/// Runs the configured scanner as a subprocess, piping the candidate change
/// to its stdin and interpreting its exit status: 0 is clean, anything else
/// is flagged. A scanner that cannot be spawned, or that outlives the
/// timeout, yields [`GateError::ToolUnavailable`], never a clean verdict.
#[derive(Debug)]
pub struct ExternalScanner {
    argv: Vec<String>,
    timeout: Option<Duration>,
}

/// One entry of a JSON findings report (the shape gitleaks emits).
/// Unknown fields are ignored; all fields are optional.
#[derive(Debug, Deserialize)]
struct Finding {
    #[serde(rename = "RuleID", default)]
    rule_id: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "File", default)]
    file: String,
    #[serde(rename = "StartLine", default)]
    start_line: u32,
}

impl ExternalScanner {
    pub fn from_config(config: &ScannerConfig) -> Result<Self, GateError> {
        let mut argv = shlex::split(&config.command).unwrap_or_default();
        argv.extend(config.extra_args.iter().cloned());
        let argv: Vec<String> = argv
            .iter()
            .map(|t| shellexpand::tilde(t).into_owned())
            .collect();

        if argv.is_empty() {
            return Err(GateError::ToolUnavailable {
                command: config.command.clone(),
                reason: "scanner command is empty or unparseable".into(),
            });
        }

        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Ok(Self { argv, timeout })
    }

    fn unavailable(&self, reason: String) -> GateError {
        GateError::ToolUnavailable {
            command: self.argv.join(" "),
            reason,
        }
    }

    /// Build the blocked-reason text from a non-zero scanner exit.
    ///
    /// Prefers a structured summary when stdout is a JSON findings array;
    /// falls back to the raw output, then to the bare exit status.
    fn flag_reason(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> String {
        if let Ok(findings) = serde_json::from_slice::<Vec<Finding>>(stdout)
            && !findings.is_empty()
        {
            return summarize_findings(&findings);
        }

        let mut lines: Vec<String> = String::from_utf8_lossy(stdout)
            .lines()
            .chain(String::from_utf8_lossy(stderr).lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(MAX_REASON_LINES)
            .map(String::from)
            .collect();

        if lines.is_empty() {
            lines.push(match code {
                Some(c) => format!("scanner exited with status {c}"),
                None => "scanner terminated by signal".into(),
            });
        }
        lines.join("\n")
    }
}

impl Classifier for ExternalScanner {
    fn classify(&self, change: &CandidateChange) -> Result<Classification, GateError> {
        log::debug!("running scanner: {}", self.argv.join(" "));

        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.unavailable(e.to_string()))?;

        // Dedicated writer/reader threads: the scanner may interleave reading
        // stdin with writing its report, and a full pipe on either side would
        // deadlock a single-threaded feed-then-drain sequence.
        let writer = child.stdin.take().map(|mut stdin| {
            let bytes = change.as_bytes().to_vec();
            thread::spawn(move || {
                // The scanner may exit without draining stdin; EPIPE is fine.
                let _ = stdin.write_all(&bytes);
            })
        });
        let stdout_reader = child.stdout.take().map(|mut out| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = out.read_to_end(&mut buf);
                buf
            })
        });
        let stderr_reader = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf);
                buf
            })
        });

        let status = match self.timeout {
            None => child
                .wait()
                .map_err(|e| self.unavailable(format!("wait failed: {e}")))?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) => break status,
                        Ok(None) if Instant::now() >= deadline => {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(self.unavailable(format!(
                                "timed out after {}s",
                                timeout.as_secs()
                            )));
                        }
                        Ok(None) => thread::sleep(WAIT_POLL),
                        Err(e) => {
                            return Err(self.unavailable(format!("wait failed: {e}")));
                        }
                    }
                }
            }
        };

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let stdout = stdout_reader
            .and_then(|r| r.join().ok())
            .unwrap_or_default();
        let stderr = stderr_reader
            .and_then(|r| r.join().ok())
            .unwrap_or_default();

        if status.success() {
            return Ok(Classification::Clean);
        }
        Ok(Classification::Flagged {
            reason: Self::flag_reason(status.code(), &stdout, &stderr),
        })
    }
}

fn summarize_findings(findings: &[Finding]) -> String {
    let mut lines = vec![format!("{} finding(s):", findings.len())];
    for f in findings.iter().take(MAX_REASON_LINES) {
        let rule = if f.rule_id.is_empty() {
            f.description.as_str()
        } else {
            f.rule_id.as_str()
        };
        let file = if f.file.is_empty() { "<stdin>" } else { &f.file };
        lines.push(format!("  {rule} at {file}:{}", f.start_line));
    }
    if findings.len() > MAX_REASON_LINES {
        lines.push(format!("  ... and {} more", findings.len() - MAX_REASON_LINES));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(command: &str) -> ExternalScanner {
        ExternalScanner::from_config(&ScannerConfig {
            command: command.into(),
            extra_args: vec![],
            timeout_secs: 10,
        })
        .unwrap()
    }

    fn classify(command: &str, change: &str) -> Result<Classification, GateError> {
        scanner(command).classify(&CandidateChange::from(change))
    }

    // ── Command parsing ──

    #[test]
    fn command_is_shell_tokenized() {
        let s = scanner("sh -c 'exit 0'");
        assert_eq!(s.argv, vec!["sh", "-c", "exit 0"]);
    }

    #[test]
    fn extra_args_are_appended() {
        let s = ExternalScanner::from_config(&ScannerConfig {
            command: "gitleaks stdin".into(),
            extra_args: vec!["--redact".into()],
            timeout_secs: 0,
        })
        .unwrap();
        assert_eq!(s.argv, vec!["gitleaks", "stdin", "--redact"]);
        assert!(s.timeout.is_none());
    }

    #[test]
    fn tilde_is_expanded() {
        if std::env::var_os("HOME").is_none() {
            return;
        }
        let s = scanner("~/bin/scanner stdin");
        assert!(!s.argv[0].starts_with('~'), "argv was: {:?}", s.argv);
    }

    #[test]
    fn empty_command_is_tool_unavailable() {
        let err = ExternalScanner::from_config(&ScannerConfig {
            command: "".into(),
            extra_args: vec![],
            timeout_secs: 0,
        })
        .unwrap_err();
        assert!(matches!(err, GateError::ToolUnavailable { .. }));
    }

    // ── Exit-status contract ──

    #[test]
    fn zero_exit_is_clean() {
        let result = classify("sh -c 'cat >/dev/null; exit 0'", "console.log(\"hello\")");
        assert_eq!(result.unwrap(), Classification::Clean);
    }

    #[test]
    fn nonzero_exit_is_flagged_with_output_as_reason() {
        let result = classify("sh -c 'echo aws-access-key detected; exit 1'", "x");
        match result.unwrap() {
            Classification::Flagged { reason } => {
                assert!(reason.contains("aws-access-key detected"), "reason: {reason}");
            }
            other => panic!("expected Flagged, got {other:?}"),
        }
    }

    #[test]
    fn silent_nonzero_exit_reports_the_status() {
        let result = classify("sh -c 'exit 3'", "x");
        match result.unwrap() {
            Classification::Flagged { reason } => {
                assert!(reason.contains("status 3"), "reason: {reason}");
            }
            other => panic!("expected Flagged, got {other:?}"),
        }
    }

    #[test]
    fn change_is_piped_to_stdin() {
        // The stub flags only when the marker arrives on its stdin.
        let cmd = "sh -c 'grep -q MARKER && exit 1; exit 0'";
        assert!(matches!(
            classify(cmd, "no secrets here").unwrap(),
            Classification::Clean
        ));
        assert!(matches!(
            classify(cmd, "context MARKER context").unwrap(),
            Classification::Flagged { .. }
        ));
    }

    #[test]
    fn large_change_does_not_deadlock() {
        // Scanner writes while we are still feeding stdin.
        let big = "x".repeat(1 << 20);
        let result = classify("sh -c 'yes filler | head -5000; cat >/dev/null; exit 0'", &big);
        assert_eq!(result.unwrap(), Classification::Clean);
    }

    // ── Unavailability ──

    #[test]
    fn missing_binary_is_tool_unavailable() {
        let err = classify("/nonexistent/gitleaks-definitely-missing", "x").unwrap_err();
        assert!(matches!(err, GateError::ToolUnavailable { .. }), "got: {err}");
    }

    #[test]
    fn timeout_is_tool_unavailable() {
        let s = ExternalScanner::from_config(&ScannerConfig {
            command: "sh -c 'sleep 30'".into(),
            extra_args: vec![],
            timeout_secs: 1,
        })
        .unwrap();
        let err = s.classify(&CandidateChange::from("x")).unwrap_err();
        match err {
            GateError::ToolUnavailable { reason, .. } => {
                assert!(reason.contains("timed out"), "reason: {reason}");
            }
            other => panic!("expected ToolUnavailable, got {other:?}"),
        }
    }

    // ── Findings summary ──

    #[test]
    fn json_findings_are_summarized() {
        let report = r#"[
            {"RuleID": "aws-access-key", "File": "config.env", "StartLine": 3},
            {"RuleID": "generic-api-key", "File": "src/app.js", "StartLine": 12}
        ]"#;
        let reason = ExternalScanner::flag_reason(Some(1), report.as_bytes(), b"");
        assert!(reason.starts_with("2 finding(s):"), "reason: {reason}");
        assert!(reason.contains("aws-access-key at config.env:3"));
        assert!(reason.contains("generic-api-key at src/app.js:12"));
    }

    #[test]
    fn json_finding_without_file_uses_stdin_placeholder() {
        let report = r#"[{"RuleID": "private-key", "StartLine": 1}]"#;
        let reason = ExternalScanner::flag_reason(Some(1), report.as_bytes(), b"");
        assert!(reason.contains("private-key at <stdin>:1"), "reason: {reason}");
    }

    #[test]
    fn non_json_output_is_used_verbatim() {
        let reason =
            ExternalScanner::flag_reason(Some(1), b"leak found in config.env\n", b"warn: noise\n");
        assert!(reason.contains("leak found in config.env"));
        assert!(reason.contains("warn: noise"));
    }

    #[test]
    fn empty_json_array_falls_back_to_status() {
        let reason = ExternalScanner::flag_reason(Some(2), b"[]", b"");
        assert!(reason.contains("status 2"), "reason: {reason}");
    }
}
