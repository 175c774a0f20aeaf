//! Host-side configuration: size ceiling, label placement and label styling.
//!
//! The annotation engine itself never reads this; hosts pass an
//! [`AnnotatorConfig`] value into their session on every invocation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const MAX_FONT_SCALE: f32 = 4.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max-lines must be greater than zero")]
    ZeroMaxLines,
    #[error("font-scale {0} is outside the supported range (0, 4]")]
    FontScale(f32),
    #[error("invalid color '{value}' for {field}: expected #rgb or #rrggbb")]
    Color { field: String, value: String },
    #[error("unknown placement '{0}' (expected 'before' or 'after')")]
    Placement(String),
    #[error("unknown theme '{0}' (expected 'light' or 'dark')")]
    Theme(String),
    #[error("invalid configuration: {0}")]
    Deserialize(String),
}

/// Where the label sits relative to the annotated span.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    #[default]
    Before,
    After,
}

impl Placement {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl FromStr for Placement {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            _ => Err(ConfigError::Placement(value.to_string())),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeKind {
    #[default]
    Light,
    Dark,
}

impl ThemeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl FromStr for ThemeKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ConfigError::Theme(value.to_string())),
        }
    }
}

/// Label colors for one theme variant, as `#rrggbb` strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct LabelColors {
    pub foreground: String,
    pub background: String,
    pub border: Option<String>,
}

impl Default for LabelColors {
    fn default() -> Self {
        Self {
            foreground: "#000000".to_string(),
            background: "#ffffff".to_string(),
            border: None,
        }
    }
}

impl LabelColors {
    #[must_use]
    pub fn dark() -> Self {
        Self {
            foreground: "#ffffff".to_string(),
            background: "#3c3c3c".to_string(),
            border: None,
        }
    }

    fn validate(&self, variant: &str) -> Result<(), ConfigError> {
        check_color(&format!("{variant}.foreground"), &self.foreground)?;
        check_color(&format!("{variant}.background"), &self.background)?;
        if let Some(border) = &self.border {
            check_color(&format!("{variant}.border"), border)?;
        }
        Ok(())
    }
}

/// Presentation parameters for rendered labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnnotationStyle {
    pub light: LabelColors,
    pub dark: LabelColors,
    /// Label font size relative to the editor font.
    pub font_scale: f32,
    pub border_radius_em: f32,
    pub padding_em: f32,
    pub margin_em: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            light: LabelColors::default(),
            dark: LabelColors::dark(),
            font_scale: 0.8,
            border_radius_em: 1.0,
            padding_em: 0.2,
            margin_em: 0.5,
        }
    }
}

impl AnnotationStyle {
    #[must_use]
    pub const fn colors(&self, theme: ThemeKind) -> &LabelColors {
        match theme {
            ThemeKind::Light => &self.light,
            ThemeKind::Dark => &self.dark,
        }
    }
}

/// Settings a host reads once per change and passes down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnnotatorConfig {
    /// Documents with more lines than this are not annotated.
    pub max_lines: usize,
    pub placement: Placement,
    pub theme: ThemeKind,
    pub style: AnnotationStyle,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            max_lines: 5_000,
            placement: Placement::Before,
            theme: ThemeKind::Light,
            style: AnnotationStyle::default(),
        }
    }
}

impl AnnotatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lines == 0 {
            return Err(ConfigError::ZeroMaxLines);
        }
        let scale = self.style.font_scale;
        if !(scale > 0.0 && scale <= MAX_FONT_SCALE) {
            return Err(ConfigError::FontScale(scale));
        }
        self.style.light.validate("style.light")?;
        self.style.dark.validate("style.dark")?;
        Ok(())
    }

    /// Build a validated config from host settings in JSON form.
    pub fn from_json_value(value: &Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|err| ConfigError::Deserialize(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Colors for the configured theme.
    #[must_use]
    pub const fn active_colors(&self) -> &LabelColors {
        self.style.colors(self.theme)
    }

    /// Whether a document of this text is small enough to annotate.
    #[must_use]
    pub fn allows_document(&self, text: &str) -> bool {
        document_line_count(text) <= self.max_lines
    }
}

/// Line count as editors report it: a trailing newline opens one more line.
#[must_use]
pub fn document_line_count(text: &str) -> usize {
    text.split('\n').count()
}

/// Parse `#rgb` or `#rrggbb` into components.
#[must_use]
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut digits = hex.chars().filter_map(|ch| ch.to_digit(16));
            let mut next = || digits.next().map(|digit| (digit * 17) as u8);
            Some((next()?, next()?, next()?))
        }
        6 => {
            let component = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
            Some((component(0..2)?, component(2..4)?, component(4..6)?))
        }
        _ => None,
    }
}

fn check_color(field: &str, value: &str) -> Result<(), ConfigError> {
    if parse_hex_color(value).is_some() {
        Ok(())
    } else {
        Err(ConfigError::Color {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}
