use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use tracing::warn;

use crate::interpreter::EofPolicy;

/// Interpreter settings resolved from flags, environment, and `bf.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub eof: EofPolicy,
    /// Validate bracket balance before running.
    pub strict: bool,
}

/// Values given on the command line; `None` defers to the next layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub eof: Option<EofPolicy>,
    pub strict: Option<bool>,
}

impl Settings {
    /// Resolve settings: flags -> env -> config file -> defaults.
    pub fn resolve(overrides: Overrides) -> Self {
        let file = load_from_toml().unwrap_or_default();
        Self::layer(overrides, env_overrides(), file)
    }

    fn layer(flags: Overrides, env: Overrides, file: Settings) -> Self {
        Self {
            eof: flags.eof.or(env.eof).unwrap_or(file.eof),
            strict: flags.strict.or(env.strict).unwrap_or(file.strict),
        }
    }
}

pub fn parse_eof(value: &str) -> Option<EofPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "zero" | "0" => Some(EofPolicy::Zero),
        "unchanged" | "keep" => Some(EofPolicy::Unchanged),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_overrides() -> Overrides {
    let eof = std::env::var("BF_EOF").ok().and_then(|v| {
        let parsed = parse_eof(&v);
        if parsed.is_none() {
            warn!(value = %v, "ignoring unrecognised BF_EOF");
        }
        parsed
    });
    let strict = std::env::var("BF_STRICT").ok().and_then(|v| {
        let parsed = parse_bool(&v);
        if parsed.is_none() {
            warn!(value = %v, "ignoring unrecognised BF_STRICT");
        }
        parsed
    });
    Overrides { eof, strict }
}

fn load_from_toml() -> Option<Settings> {
    let base_dirs = BaseDirs::new().ok()?;

    // On Linux: resolves to /home/<user>/.config
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");

    let content = fs::read_to_string(path).ok()?;
    Some(parse_settings(&content))
}

/// Parse the `[interpreter]` section of a `bf.toml` document.
///
/// Only `key = value` lines are understood; values may be quoted.
pub fn parse_settings(content: &str) -> Settings {
    let mut in_section = false;
    let mut map: HashMap<String, String> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_section = &line[1..line.len() - 1] == "interpreter";
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, val_raw)) = line.split_once('=') {
            let val_raw = val_raw.trim();
            let val = if val_raw.len() >= 2 && val_raw.starts_with('"') && val_raw.ends_with('"') {
                &val_raw[1..val_raw.len() - 1]
            } else {
                val_raw
            };
            map.insert(key.trim().to_string(), val.to_string());
        }
    }

    let mut settings = Settings::default();
    for (key, value) in &map {
        match key.as_str() {
            "eof" => match parse_eof(value) {
                Some(eof) => settings.eof = eof,
                None => warn!(%value, "bf.toml: ignoring unrecognised eof value"),
            },
            "strict" => match parse_bool(value) {
                Some(strict) => settings.strict = strict,
                None => warn!(%value, "bf.toml: ignoring unrecognised strict value"),
            },
            other => warn!(key = other, "bf.toml: ignoring unknown key"),
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interpreter_section() {
        let settings = parse_settings(
            r#"
# interpreter defaults
[interpreter]
eof = "unchanged"
strict = true
"#,
        );
        assert_eq!(settings.eof, EofPolicy::Unchanged);
        assert!(settings.strict);
    }

    #[test]
    fn ignores_other_sections_and_bad_values() {
        let settings = parse_settings(
            r#"
[colors]
eof = "unchanged"

[interpreter]
strict = maybe
colour = red
"#,
        );
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn flags_beat_env_beat_file() {
        let file = Settings { eof: EofPolicy::Unchanged, strict: true };
        let env = Overrides { eof: Some(EofPolicy::Zero), strict: None };
        let flags = Overrides { eof: None, strict: Some(false) };

        let resolved = Settings::layer(flags, env, file);
        assert_eq!(resolved.eof, EofPolicy::Zero);
        assert!(!resolved.strict);

        let resolved = Settings::layer(Overrides::default(), Overrides::default(), file);
        assert_eq!(resolved, file);
    }

    #[test]
    fn eof_names() {
        assert_eq!(parse_eof(" Zero "), Some(EofPolicy::Zero));
        assert_eq!(parse_eof("unchanged"), Some(EofPolicy::Unchanged));
        assert_eq!(parse_eof("eof"), None);
    }
}
