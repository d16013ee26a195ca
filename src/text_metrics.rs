use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

const FALLBACK_ADVANCE: f32 = 0.56;
const FALLBACK_ASCENT: f32 = 0.9;
const FALLBACK_DESCENT: f32 = 0.22;

/// Horizontal advance and vertical extent of one line of text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl TextExtent {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Measure with the first installed face matching `font_family` (a CSS-like
/// comma separated list). `None` when no face could be found.
pub fn measure_text(text: &str, font_size: f32, font_family: &str) -> Option<TextExtent> {
    if font_size <= 0.0 {
        return Some(TextExtent {
            width: 0.0,
            ascent: 0.0,
            descent: 0.0,
        });
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Extent estimate used when no font is available.
pub fn fallback_extent(text: &str, font_size: f32) -> TextExtent {
    let chars = text.chars().filter(|c| *c != '\n').count() as f32;
    TextExtent {
        width: chars * font_size * FALLBACK_ADVANCE,
        ascent: font_size * FALLBACK_ASCENT,
        descent: font_size * FALLBACK_DESCENT,
    }
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<TextExtent> {
        let family_key = normalize_family_key(font_family);
        if !self.cache.contains_key(&family_key) {
            let face = self.load_face(&family_key);
            self.cache.insert(family_key.clone(), face);
        }
        let face = self.cache.get_mut(&family_key)?.as_mut()?;
        Some(face.extent(text, font_size))
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .copied()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "ui-sans-serif" => Family::SansSerif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    ascii_advances: [u16; 128],
    advance_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender();
        let descender = face.descender();
        Some(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            ascii_advances,
            advance_cache: HashMap::new(),
        })
    }

    fn extent(&mut self, text: &str, font_size: f32) -> TextExtent {
        let scale = font_size / self.units_per_em as f32;
        TextExtent {
            width: self.width(text, font_size, scale),
            ascent: self.ascender.max(0) as f32 * scale,
            descent: -(self.descender.min(0) as f32) * scale,
        }
    }

    fn width(&mut self, text: &str, font_size: f32, scale: f32) -> f32 {
        let fallback = font_size * FALLBACK_ADVANCE;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if ch.is_ascii() {
                Some(self.ascii_advances[ch as usize]).filter(|adv| *adv != 0)
            } else {
                self.glyph_advance(ch)
            };
            width += match advance {
                Some(adv) => adv as f32 * scale,
                None => fallback,
            };
        }
        width.max(0.0)
    }

    fn glyph_advance(&mut self, ch: char) -> Option<u16> {
        if let Some(cached) = self.advance_cache.get(&ch) {
            return *cached;
        }
        let advance = Face::parse(&self.data, self.index).ok().and_then(|face| {
            let glyph = face.glyph_index(ch)?;
            face.glyph_hor_advance(glyph)
        });
        self.advance_cache.insert(ch, advance);
        advance
    }
}

fn normalize_family_key(font_family: &str) -> String {
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
    fn fallback_scales_with_font_size() {
        let extent = fallback_extent("#12", 20.0);
        assert!((extent.width - 3.0 * 20.0 * FALLBACK_ADVANCE).abs() < 1e-4);
        assert!((extent.height() - 20.0 * (FALLBACK_ASCENT + FALLBACK_DESCENT)).abs() < 1e-4);
    }

    #[test]
    fn zero_font_size_measures_nothing() {
        let extent = measure_text("#1", 0.0, "sans-serif").unwrap();
        assert_eq!(extent.width, 0.0);
        assert_eq!(extent.height(), 0.0);
    }

    #[test]
    fn longer_text_is_not_narrower() {
        // Either a real face or nothing; never a panic.
        if let (Some(short), Some(long)) = (
            measure_text("#1", 18.0, "sans-serif"),
            measure_text("#1000", 18.0, "sans-serif"),
        ) {
            assert!(long.width >= short.width);
            assert!(short.height() > 0.0);
        }
    }

    #[test]
    fn empty_family_defaults_to_sans_serif() {
        assert_eq!(normalize_family_key("  "), "sans-serif");
        assert_eq!(normalize_family_key(" Arial "), "Arial");
    }
}
