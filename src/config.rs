//! User configuration, read from `~/.config/rxkcd/rxkcd.conf`.
//!
//! The file is a list of `key = value` lines; unknown keys and bad values
//! are ignored and the default is kept.
//!
//! ```text
//! theme_color = "#ffaa00"
//! api_url = "https://xkcd.now.sh/?comic={comic}"
//! refresh_interval_secs = 60
//! timeout_secs = 10
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use ratatui::style::Color;

use crate::gateway::DEFAULT_URL_TEMPLATE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub theme: Color,
    pub api_url: String,
    pub refresh_interval: TimeDelta,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Color::Yellow,
            api_url: DEFAULT_URL_TEMPLATE.to_string(),
            refresh_interval: TimeDelta::seconds(60),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/rxkcd/rxkcd.conf"))
    }

    pub fn load() -> Self {
        Self::path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|content| Self::parse(&content))
            .unwrap_or_default()
    }

    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            let val = val.trim().trim_matches('"').trim_matches('\'');
            match key.trim() {
                "theme_color" => {
                    if let Some(color) = parse_hex_color(val) {
                        config.theme = color;
                    }
                }
                "api_url" => {
                    if val.contains("{comic}") {
                        config.api_url = val.to_string();
                    }
                }
                "refresh_interval_secs" => {
                    if let Ok(secs @ 1..) = val.parse::<u32>() {
                        config.refresh_interval = TimeDelta::seconds(i64::from(secs));
                    }
                }
                "timeout_secs" => {
                    if let Ok(secs) = val.parse::<u64>() {
                        if secs > 0 {
                            config.timeout = Duration::from_secs(secs);
                        }
                    }
                }
                other => tracing::debug!(key = other, "ignoring unknown config key"),
            }
        }
        config
    }
}

/// Only the theme is re-read while running.
pub fn load_theme() -> Color {
    Config::load().theme
}

fn parse_hex_color(val: &str) -> Option<Color> {
    if !val.starts_with('#') || val.len() != 7 || !val.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&val[1..3], 16).ok()?;
    let g = u8::from_str_radix(&val[3..5], 16).ok()?;
    let b = u8::from_str_radix(&val[5..7], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(Config::parse(""), Config::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let config = Config::parse(
            r##"
            # comic settings
            theme_color = "#ff8000"
            api_url = 'http://localhost:8080/{comic}/info.0.json'
            refresh_interval_secs = 300
            timeout_secs = 3
            "##,
        );
        assert_eq!(config.theme, Color::Rgb(255, 128, 0));
        assert_eq!(config.api_url, "http://localhost:8080/{comic}/info.0.json");
        assert_eq!(config.refresh_interval, TimeDelta::seconds(300));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = Config::parse(
            "theme_color = red\napi_url = http://no-placeholder\nrefresh_interval_secs = -1\ntimeout_secs = 0\nnonsense",
        );
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(parse_hex_color("#000000"), Some(Color::Rgb(0, 0, 0)));
        assert_eq!(parse_hex_color("#zz0000"), None);
        assert_eq!(parse_hex_color("000000"), None);
    }
}
