//! System-font text measurement for labels.
//!
//! Only consulted when `LayoutConfig::glyph_metrics` is set. Every function
//! returns `None` when no usable font is installed so callers can fall back
//! to the fixed character width.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static GLYPH_MEASURER: Lazy<Mutex<GlyphMeasurer>> = Lazy::new(|| Mutex::new(GlyphMeasurer::new()));

pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = GLYPH_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

struct GlyphMeasurer {
    db: Database,
    system_fonts_loaded: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

impl GlyphMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            system_fonts_loaded: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = family_key(font_family);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font_family);
            if face.is_none() {
                tracing::debug!(family = %key, "no system font found for glyph metrics");
            }
            self.faces.insert(key.clone(), face);
        }
        self.faces.get_mut(&key)?.as_mut()?.width(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<LoadedFace> {
        if !self.system_fonts_loaded {
            self.db.load_system_fonts();
            self.system_fonts_loaded = true;
        }

        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| LoadedFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    advances: HashMap<char, Option<u16>>,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
            advances: HashMap::new(),
        })
    }

    fn width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em as f32;
        // Glyphs missing from the face take an average advance.
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;
        for ch in text.chars() {
            let advance = *self.advances.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            width += match advance {
                Some(units) if units > 0 => units as f32 * scale,
                _ => fallback,
            };
        }
        Some(width)
    }
}

fn family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_measures_zero() {
        assert_eq!(measure_text_width("", 14.0, "sans-serif"), Some(0.0));
        assert_eq!(measure_text_width("abc", 0.0, "sans-serif"), Some(0.0));
    }

    #[test]
    fn measured_width_grows_with_text() {
        // Hosts without fonts return None; nothing to compare then.
        let (Some(short), Some(long)) = (
            measure_text_width("ab", 14.0, "sans-serif"),
            measure_text_width("abababab", 14.0, "sans-serif"),
        ) else {
            return;
        };
        assert!(long > short);
    }

    #[test]
    fn family_key_defaults_to_sans() {
        assert_eq!(family_key("  "), "sans-serif");
        assert_eq!(family_key(" Inter "), "Inter");
    }
}
