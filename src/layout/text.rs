use crate::config::LayoutConfig;
use crate::text_metrics;

/// How label widths are estimated. `Chars` is the fixed-advance
/// approximation; `Glyphs` asks the system fonts and falls back to it.
#[derive(Debug, Clone)]
pub(crate) enum TextMeasure {
    Chars {
        char_width: f32,
    },
    Glyphs {
        char_width: f32,
        font_size: f32,
        font_family: String,
    },
}

impl TextMeasure {
    pub(crate) fn from_config(config: &LayoutConfig) -> Self {
        if config.glyph_metrics {
            Self::Glyphs {
                char_width: config.char_width,
                font_size: config.glyph_font_size,
                font_family: config.glyph_font_family.clone(),
            }
        } else {
            Self::Chars {
                char_width: config.char_width,
            }
        }
    }

    fn char_width(&self) -> f32 {
        match self {
            Self::Chars { char_width } | Self::Glyphs { char_width, .. } => *char_width,
        }
    }

    pub(crate) fn width(&self, text: &str) -> f32 {
        let fixed = text.chars().count() as f32 * self.char_width();
        match self {
            Self::Chars { .. } => fixed,
            Self::Glyphs {
                font_size,
                font_family,
                ..
            } => text_metrics::measure_text_width(text, *font_size, font_family).unwrap_or(fixed),
        }
    }

    /// Wraps to `max_chars` characters per line, or to the pixel width of
    /// that many average characters when measuring glyphs.
    pub(crate) fn wrap(&self, text: &str, max_chars: usize) -> Vec<String> {
        match self {
            Self::Chars { .. } => wrap_words(text, max_chars),
            Self::Glyphs { .. } => {
                let limit = max_chars.max(1) as f32 * self.char_width();
                wrap_measured(text, limit, |s| self.width(s))
            }
        }
    }

    pub(crate) fn widest(&self, lines: &[String]) -> f32 {
        lines.iter().map(|line| self.width(line)).fold(0.0, f32::max)
    }
}

/// Greedy word wrap on character counts. Words longer than the limit are
/// hard-broken into `max_chars` chunks.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    wrap_measured(text, max_chars as f32, |s| s.chars().count() as f32)
}

pub(crate) fn wrap_measured(text: &str, limit: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let chunks = if measure(word) > limit {
            break_long_word(word, limit, &measure)
        } else {
            vec![word.to_string()]
        };
        for chunk in chunks {
            if current.is_empty() {
                current = chunk;
                continue;
            }
            let candidate = format!("{current} {chunk}");
            if measure(&candidate) <= limit {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, chunk));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Splits a single word into the longest prefixes that fit; every chunk
/// holds at least one character.
pub(crate) fn break_long_word(word: &str, limit: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if measure(&current) > limit && current.chars().count() > 1 {
            current.pop();
            parts.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    if parts.is_empty() {
        parts.push(word.to_string());
    }
    parts
}
