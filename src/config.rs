use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Stderr verbosity: off, error, warn, info, debug, trace.
    #[serde(default)]
    pub log_level: String,
    /// Decision log path (tilde-expanded). Empty disables the decision log.
    #[serde(default)]
    pub log_file: String,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ScannerConfig {
    /// Scanner command line as a single string; tokenized shell-style.
    #[serde(default)]
    pub command: String,
    /// Extra arguments appended after the command's own tokens.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Wall-clock limit for one scanner run. 0 disables the limit.
    #[serde(default)]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct GitConfig {
    /// Arguments passed to `git diff` to enumerate the pending change.
    #[serde(default)]
    pub diff_args: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    scanner: ScannerOverlay,
    #[serde(default)]
    git: GitOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_level: Option<String>,
    log_file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ScannerOverlay {
    #[serde(default)]
    replace: bool,
    command: Option<String>,
    timeout_secs: Option<u64>,
    #[serde(default)]
    extra_args: Vec<String>,
    #[serde(default)]
    remove_extra_args: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct GitOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    diff_args: Vec<String>,
    #[serde(default)]
    remove_diff_args: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/leakgate/config.toml (if exists)
    /// 3. Merge the overlay at `explicit_path` (if given)
    ///
    /// User config merges with defaults: lists extend, scalars override.
    /// Set `replace = true` in a section to replace its defaults entirely.
    /// Use `remove_<field>` lists to subtract specific items from defaults.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_user_overlay() {
            config.apply_overlay(overlay);
        }
        if let Some(path) = explicit_path
            && let Some(overlay) = Self::load_overlay_file(path)
        {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load the user overlay from ~/.config/leakgate/config.toml.
    fn load_user_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/leakgate/config.toml");
        Self::load_overlay_file(&path)
    }

    fn load_overlay_file(path: &std::path::Path) -> Option<ConfigOverlay> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("leakgate: config parse error in {}: {e}", path.display());
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        if let Some(v) = overlay.settings.log_level {
            self.settings.log_level = v;
        }
        if let Some(v) = overlay.settings.log_file {
            self.settings.log_file = v;
        }

        // Scanner
        let s = overlay.scanner;
        if let Some(v) = s.command {
            self.scanner.command = v;
        }
        if let Some(v) = s.timeout_secs {
            self.scanner.timeout_secs = v;
        }
        merge_list(
            &mut self.scanner.extra_args,
            s.extra_args,
            &s.remove_extra_args,
            s.replace,
        );

        // Git
        let g = overlay.git;
        merge_list(
            &mut self.git.diff_args,
            g.diff_args,
            &g.remove_diff_args,
            g.replace,
        );
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
