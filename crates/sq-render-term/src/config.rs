//! Terminal overlay configuration types.

use sq_core::{AnnotatorConfig, Placement, parse_hex_color};

/// 24-bit color components.
pub type Rgb = (u8, u8, u8);

const DEFAULT_FOREGROUND: Rgb = (0, 0, 0);
const DEFAULT_BACKGROUND: Rgb = (255, 255, 255);

/// Where labels are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// Inside the line, next to the annotated span.
    #[default]
    Inline,
    /// In a left margin; the document text is left untouched.
    Gutter,
}

/// Configuration for drawing annotations over document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRenderConfig {
    /// Label before or after the span (inline mode only).
    pub placement: Placement,
    pub mode: LabelMode,
    /// Emit ANSI 24-bit color badges instead of `[n]` brackets.
    pub use_colors: bool,
    pub foreground: Rgb,
    pub background: Rgb,
    /// Spaces between the label and the statement text.
    pub margin: usize,
    /// Spaces inside a colored badge on each side of the label.
    pub padding: usize,
}

impl Default for TermRenderConfig {
    fn default() -> Self {
        Self {
            placement: Placement::Before,
            mode: LabelMode::Inline,
            use_colors: true,
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
            margin: 1,
            padding: 1,
        }
    }
}

impl TermRenderConfig {
    /// Uncolored output, suitable for pipes and snapshots.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            padding: 0,
            ..Self::default()
        }
    }

    /// Derive terminal settings from host configuration.
    ///
    /// Terminal cells cannot scale fonts or draw borders, so only placement,
    /// the active theme's colors and the presence of margin/padding carry over.
    #[must_use]
    pub fn from_annotator(config: &AnnotatorConfig) -> Self {
        let colors = config.active_colors();
        Self {
            placement: config.placement,
            foreground: resolve_rgb(&colors.foreground, DEFAULT_FOREGROUND),
            background: resolve_rgb(&colors.background, DEFAULT_BACKGROUND),
            margin: usize::from(config.style.margin_em > 0.0),
            padding: usize::from(config.style.padding_em > 0.0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: LabelMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

fn resolve_rgb(value: &str, fallback: Rgb) -> Rgb {
    parse_hex_color(value).unwrap_or(fallback)
}
