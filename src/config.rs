/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// The logger isn't up yet while this runs (its target comes from the file),
/// so problems are collected in `GameConfig::warnings` and logged by the
/// caller once logging is initialized.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::rules::Rules;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: Rules,
    pub keys: KeysConfig,
    pub gamepad: GamepadConfig,
    pub general: GeneralConfig,
    /// Non-fatal problems found while loading.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub countdown_interval_ms: u64,
    pub countdown_from: i32,
}

/// Key names per action. Parsed into key codes by the input layer.
#[derive(Clone, Debug)]
pub struct KeysConfig {
    /// One entry per column, left to right.
    pub columns: Vec<String>,
    pub start: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    /// Button names per column, left to right.
    pub columns: Vec<Vec<String>>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    pub seed: Option<u64>,
    pub sound: bool,
    pub log_file: Option<PathBuf>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    keys: TomlKeys,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_countdown_interval")]
    countdown_interval_ms: u64,
    #[serde(default = "default_countdown_from")]
    countdown_from: i32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_column_count")]
    column_count: usize,
    #[serde(default = "default_tile_height")]
    tile_height: i32,
    #[serde(default = "default_field_height")]
    field_height: i32,
    #[serde(default = "default_score_line")]
    score_line: i32,
    #[serde(default = "default_miss_slack")]
    miss_slack: i32,
    #[serde(default = "default_perfect_range")]
    perfect_range: i32,
    #[serde(default = "default_evict_margin")]
    evict_margin: i32,
    #[serde(default = "default_initial_tiles")]
    initial_tiles: usize,
    #[serde(default = "default_base_speed")]
    base_speed: i32,
    #[serde(default = "default_score_per_speed_step")]
    score_per_speed_step: u32,
}

#[derive(Deserialize, Debug)]
struct TomlKeys {
    #[serde(default = "default_key_columns")]
    columns: Vec<String>,
    #[serde(default = "default_key_start")]
    start: Vec<String>,
    #[serde(default = "default_key_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_columns")]
    columns: Vec<Vec<String>>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_sound")]
    sound: bool,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 20 }
fn default_countdown_interval() -> u64 { 1000 }
fn default_countdown_from() -> i32 { 3 }

fn default_column_count() -> usize { Rules::default().column_count }
fn default_tile_height() -> i32 { Rules::default().tile_height }
fn default_field_height() -> i32 { Rules::default().field_height }
fn default_score_line() -> i32 { Rules::default().score_line }
fn default_miss_slack() -> i32 { Rules::default().miss_slack }
fn default_perfect_range() -> i32 { Rules::default().perfect_range }
fn default_evict_margin() -> i32 { Rules::default().evict_margin }
fn default_initial_tiles() -> usize { Rules::default().initial_tiles }
fn default_base_speed() -> i32 { Rules::default().base_speed }
fn default_score_per_speed_step() -> u32 { Rules::default().score_per_speed_step }

fn default_key_columns() -> Vec<String> {
    ["1", "2", "3", "4", "5", "6", "7", "8"].iter().map(|s| s.to_string()).collect()
}
fn default_key_start() -> Vec<String> { vec!["Enter".into(), "Space".into()] }
fn default_key_quit() -> Vec<String> { vec!["Esc".into(), "q".into()] }

fn default_pad_columns() -> Vec<Vec<String>> {
    vec![
        vec!["DPadLeft".into(), "L1".into()],
        vec!["DPadDown".into(), "L2".into()],
        vec!["B".into(), "R2".into()],
        vec!["A".into(), "R1".into()],
    ]
}
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_sound() -> bool { true }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            countdown_interval_ms: default_countdown_interval(),
            countdown_from: default_countdown_from(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        let r = Rules::default();
        TomlRules {
            column_count: r.column_count,
            tile_height: r.tile_height,
            field_height: r.field_height,
            score_line: r.score_line,
            miss_slack: r.miss_slack,
            perfect_range: r.perfect_range,
            evict_margin: r.evict_margin,
            initial_tiles: r.initial_tiles,
            base_speed: r.base_speed,
            score_per_speed_step: r.score_per_speed_step,
        }
    }
}

impl Default for TomlKeys {
    fn default() -> Self {
        TomlKeys {
            columns: default_key_columns(),
            start: default_key_start(),
            quit: default_key_quit(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            columns: default_pad_columns(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            seed: None,
            sound: default_sound(),
            log_file: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TomlTiming::default().into()
    }
}

impl From<TomlTiming> for TimingConfig {
    fn from(t: TomlTiming) -> Self {
        TimingConfig {
            tick_rate_ms: t.tick_rate_ms,
            countdown_interval_ms: t.countdown_interval_ms,
            countdown_from: t.countdown_from,
        }
    }
}

impl From<TomlRules> for Rules {
    fn from(t: TomlRules) -> Self {
        Rules {
            column_count: t.column_count,
            tile_height: t.tile_height,
            field_height: t.field_height,
            score_line: t.score_line,
            miss_slack: t.miss_slack,
            perfect_range: t.perfect_range,
            evict_margin: t.evict_margin,
            initial_tiles: t.initial_tiles,
            base_speed: t.base_speed,
            score_per_speed_step: t.score_per_speed_step,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/pianotiles`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&candidate_dirs(), &mut warnings);
        GameConfig::from_toml(toml_cfg, warnings)
    }

    /// Parse a config document directly (no file search).
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Self {
        let mut warnings = Vec::new();
        let toml_cfg = parse_toml(text, Path::new("<inline>"), &mut warnings);
        GameConfig::from_toml(toml_cfg, warnings)
    }

    fn from_toml(toml_cfg: TomlConfig, mut warnings: Vec<String>) -> Self {
        let mut timing = TimingConfig::from(toml_cfg.timing);
        if timing.tick_rate_ms == 0 || timing.countdown_interval_ms == 0 {
            warnings.push("timing intervals must be positive; using default timing".into());
            timing = TimingConfig::default();
        }
        if timing.countdown_from < 0 {
            warnings.push(format!(
                "timing.countdown_from = {} is negative; using {}",
                timing.countdown_from, default_countdown_from(),
            ));
            timing.countdown_from = default_countdown_from();
        }

        let mut rules = Rules::from(toml_cfg.rules);
        if let Err(e) = rules.validate() {
            warnings.push(format!("invalid [rules] ({e}); using default rules"));
            rules = Rules::default();
        }

        let mut keys = toml_cfg.keys;
        if keys.columns.len() < rules.column_count {
            warnings.push(format!(
                "keys.columns has {} entries for {} columns; using defaults",
                keys.columns.len(), rules.column_count,
            ));
            keys.columns = default_key_columns();
        }
        keys.columns.truncate(rules.column_count);

        GameConfig {
            timing,
            rules,
            keys: KeysConfig {
                columns: keys.columns,
                start: keys.start,
                quit: keys.quit,
            },
            gamepad: GamepadConfig {
                columns: toml_cfg.gamepad.columns,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            general: GeneralConfig {
                seed: toml_cfg.general.seed,
                sound: toml_cfg.general.sound,
                log_file: toml_cfg.general.log_file.map(PathBuf::from),
            },
            warnings,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), Vec::new())
    }
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds the real binary's dir.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pianotiles");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path, warnings),
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{} parse error: {e}; using default settings", path.display()));
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("");
        assert!(cfg.warnings.is_empty());
        assert_eq!(cfg.timing, TimingConfig { tick_rate_ms: 20, countdown_interval_ms: 1000, countdown_from: 3 });
        assert_eq!(cfg.rules, Rules::default());
        assert_eq!(cfg.keys.columns, vec!["1", "2", "3", "4"]);
        assert_eq!(cfg.gamepad.columns.len(), 4);
        assert!(cfg.general.sound);
        assert_eq!(cfg.general.seed, None);
        assert_eq!(cfg.general.log_file, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[rules]\ncolumn_count = 6\n\n[general]\nseed = 42\nsound = false\nlog_file = \"tiles.log\"\n",
        );
        assert!(cfg.warnings.is_empty(), "{:?}", cfg.warnings);
        assert_eq!(cfg.rules.column_count, 6);
        assert_eq!(cfg.rules.tile_height, 150);
        assert_eq!(cfg.keys.columns, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(cfg.general.seed, Some(42));
        assert!(!cfg.general.sound);
        assert_eq!(cfg.general.log_file, Some(PathBuf::from("tiles.log")));
    }

    #[test]
    fn invalid_rules_fall_back() {
        let cfg = GameConfig::from_toml_str("[rules]\nscore_line = 900\n");
        assert_eq!(cfg.rules, Rules::default());
        assert_eq!(cfg.warnings.len(), 1);
        assert!(cfg.warnings[0].contains("[rules]"));
    }

    #[test]
    fn too_many_columns_fall_back() {
        let cfg = GameConfig::from_toml_str("[rules]\ncolumn_count = 9\n");
        assert_eq!(cfg.rules.column_count, 4);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn short_key_list_is_replaced() {
        let cfg = GameConfig::from_toml_str("[keys]\ncolumns = [\"a\", \"s\"]\n");
        assert_eq!(cfg.keys.columns, vec!["1", "2", "3", "4"]);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn custom_keys_are_kept() {
        let cfg = GameConfig::from_toml_str("[keys]\ncolumns = [\"d\", \"f\", \"j\", \"k\"]\nquit = [\"x\"]\n");
        assert_eq!(cfg.keys.columns, vec!["d", "f", "j", "k"]);
        assert_eq!(cfg.keys.quit, vec!["x"]);
        assert_eq!(cfg.keys.start, vec!["Enter", "Space"]);
    }

    #[test]
    fn zero_tick_rate_falls_back() {
        let cfg = GameConfig::from_toml_str("[timing]\ntick_rate_ms = 0\ncountdown_from = 5\n");
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn syntax_error_warns_and_defaults() {
        let cfg = GameConfig::from_toml_str("[rules\ncolumn_count = 3");
        assert_eq!(cfg.rules, Rules::default());
        assert_eq!(cfg.warnings.len(), 1);
        assert!(cfg.warnings[0].contains("parse error"));
    }
}
