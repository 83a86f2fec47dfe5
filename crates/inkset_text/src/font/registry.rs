//! Font registry for system font discovery and caching
//!
//! Uses fontdb to discover fonts by name or generic category. Resolved faces
//! and measured strings are memoized behind `RwLock`s so one registry can
//! serve many text instances concurrently.

use std::path::Path as FsPath;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use inkset_paint::{Path, Point};
use rustc_hash::FxHashMap;

use super::{FontFace, FontMetrics, FontProvider, FontSpec, TextMetrics};
use crate::{Result, TextError};

/// Generic font category for fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenericFont {
    /// Default system UI font
    #[default]
    System,
    /// Monospace font for code
    Monospace,
    /// Serif font
    Serif,
    /// Sans-serif font
    SansSerif,
}

impl GenericFont {
    /// Maps a CSS generic family keyword. Named families return `None`.
    pub fn from_family(family: &str) -> Option<Self> {
        match family.trim().to_ascii_lowercase().as_str() {
            "" | "system-ui" | "-apple-system" => Some(GenericFont::System),
            "monospace" | "ui-monospace" => Some(GenericFont::Monospace),
            "serif" | "ui-serif" => Some(GenericFont::Serif),
            "sans-serif" | "ui-sans-serif" => Some(GenericFont::SansSerif),
            _ => None,
        }
    }

    fn family(&self) -> Family<'static> {
        match self {
            GenericFont::System | GenericFont::SansSerif => Family::SansSerif,
            GenericFont::Monospace => Family::Monospace,
            GenericFont::Serif => Family::Serif,
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn query<'a>(families: &'a [Family<'a>], weight: u16, style: Style) -> Query<'a> {
    Query {
        families,
        weight: Weight(weight),
        style,
        stretch: Stretch::Normal,
    }
}

/// Measured strings kept before the cache starts over.
const MAX_MEASURES: usize = 4096;

fn style_key(name: &str, weight: u16, italic: bool) -> String {
    format!("{}:w{}:{}", name, weight, if italic { "i" } else { "n" })
}

/// Font registry that discovers and caches fonts
pub struct FontRegistry {
    /// fontdb database containing every known face
    db: RwLock<Database>,
    /// Cached FontFace instances (Some = found, None = not found)
    faces: RwLock<FxHashMap<String, Option<Arc<FontFace>>>>,
    /// Measured strings keyed by (font cache key, text)
    measures: RwLock<FxHashMap<(String, String), TextMetrics>>,
    /// Family used when a spec names none
    default_family: RwLock<Option<String>>,
}

impl FontRegistry {
    /// Create a new font registry and load system fonts
    pub fn new() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        tracing::debug!("font registry loaded {} system faces", db.len());
        Self::with_database(db)
    }

    /// A registry without any faces; fonts are added explicitly.
    pub fn empty() -> Self {
        Self::with_database(Database::new())
    }

    fn with_database(db: Database) -> Self {
        Self {
            db: RwLock::new(db),
            faces: RwLock::new(FxHashMap::default()),
            measures: RwLock::new(FxHashMap::default()),
            default_family: RwLock::new(None),
        }
    }

    /// Process-wide registry, created with system fonts on first use.
    pub fn global() -> Arc<FontRegistry> {
        static GLOBAL: OnceLock<Arc<FontRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(FontRegistry::new())).clone()
    }

    pub fn set_default_family(&self, family: Option<String>) {
        *write(&self.default_family) = family.filter(|f| !f.trim().is_empty());
    }

    /// Registers font bytes (TTF/OTF/collection).
    pub fn load_font_data(&self, data: Vec<u8>) {
        write(&self.db).load_font_data(data);
        self.forget_misses();
    }

    pub fn load_font_file(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let path = path.as_ref();
        write(&self.db).load_font_file(path).map_err(|e| {
            TextError::FontLoad(format!("Failed to read font file {:?}: {}", path, e))
        })?;
        self.forget_misses();
        Ok(())
    }

    pub fn load_fonts_dir(&self, dir: impl AsRef<FsPath>) {
        let dir = dir.as_ref();
        let mut db = write(&self.db);
        let before = db.len();
        db.load_fonts_dir(dir);
        tracing::debug!("loaded {} faces from {:?}", db.len() - before, dir);
        drop(db);
        self.forget_misses();
    }

    /// Newly added fonts may satisfy lookups that failed before.
    fn forget_misses(&self) {
        write(&self.faces).retain(|_, face| face.is_some());
        write(&self.measures).clear();
    }

    fn remember_measure(&self, key: (String, String), metrics: TextMetrics) {
        let mut measures = write(&self.measures);
        if measures.len() >= MAX_MEASURES {
            tracing::trace!("measure cache full, clearing {} entries", measures.len());
            measures.clear();
        }
        measures.insert(key, metrics);
    }

    /// Check if a font is available
    pub fn has_font(&self, name: &str) -> bool {
        let families = [Family::Name(name)];
        read(&self.db)
            .query(&query(&families, 400, Style::Normal))
            .is_some()
    }

    /// List available font families
    pub fn list_families(&self) -> Vec<String> {
        let mut families: Vec<String> = read(&self.db)
            .faces()
            .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .collect();
        families.sort();
        families.dedup();
        families
    }

    /// Load a font by name with specific weight and italic style
    pub fn load_font_with_style(
        &self,
        name: &str,
        weight: u16,
        italic: bool,
    ) -> Result<Arc<FontFace>> {
        self.load_family(Family::Name(name), style_key(name, weight, italic), weight, italic)
    }

    /// Load a generic font category with specific weight and italic style
    pub fn load_generic_with_style(
        &self,
        generic: GenericFont,
        weight: u16,
        italic: bool,
    ) -> Result<Arc<FontFace>> {
        let key = style_key(&format!("__generic_{:?}", generic), weight, italic);
        self.load_family(generic.family(), key, weight, italic)
    }

    fn load_family(
        &self,
        family: Family<'_>,
        cache_key: String,
        weight: u16,
        italic: bool,
    ) -> Result<Arc<FontFace>> {
        // Check cache first (includes failed lookups as None)
        if let Some(cached) = read(&self.faces).get(&cache_key) {
            return cached.clone().ok_or_else(|| {
                TextError::FontLoad(format!("Font '{}' not found (cached)", cache_key))
            });
        }

        let families = [family];
        let id = {
            let db = read(&self.db);
            let style = if italic { Style::Italic } else { Style::Normal };
            let id = db.query(&query(&families, weight, style));
            // Try with Oblique if Italic wasn't found
            match id {
                None if italic => db.query(&query(&families, weight, Style::Oblique)),
                id => id,
            }
        };

        let Some(id) = id else {
            write(&self.faces).insert(cache_key.clone(), None);
            return Err(TextError::FontLoad(format!("Font '{}' not found", cache_key)));
        };

        let face = Arc::new(self.load_face_by_id(id)?);
        write(&self.faces).insert(cache_key, Some(Arc::clone(&face)));
        Ok(face)
    }

    /// Load a font face by fontdb ID
    fn load_face_by_id(&self, id: fontdb::ID) -> Result<FontFace> {
        let (src, face_index) = read(&self.db)
            .face_source(id)
            .ok_or_else(|| TextError::FontLoad("Font source not found".to_string()))?;

        let data = match src {
            Source::File(path) => std::fs::read(&path).map_err(|e| {
                TextError::FontLoad(format!("Failed to read font file {:?}: {}", path, e))
            })?,
            Source::Binary(arc) => arc.as_ref().as_ref().to_vec(),
            Source::SharedFile(_path, data) => data.as_ref().as_ref().to_vec(),
        };

        FontFace::from_data_with_index(data, face_index)
    }

    /// Resolves a spec: the named family, then the configured default
    /// family, then the generic sans-serif face.
    pub fn face_for(&self, font: &FontSpec) -> Option<Arc<FontFace>> {
        let default_family = read(&self.default_family).clone();
        let family = if font.family.trim().is_empty() {
            default_family.as_deref().unwrap_or("")
        } else {
            font.family.as_str()
        };

        if let Some(generic) = GenericFont::from_family(family) {
            return self
                .load_generic_with_style(generic, font.weight, font.italic)
                .ok();
        }

        let key = style_key(family, font.weight, font.italic);
        let already_tried = read(&self.faces).contains_key(&key);
        match self.load_font_with_style(family, font.weight, font.italic) {
            Ok(face) => Some(face),
            Err(_) => {
                // Only warn on the first failure for this font
                if !already_tried {
                    tracing::warn!(
                        "Font '{}' (weight={}, italic={}) not found, falling back to sans-serif",
                        family,
                        font.weight,
                        font.italic
                    );
                }
                self.load_generic_with_style(GenericFont::SansSerif, font.weight, font.italic)
                    .ok()
            }
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontProvider for FontRegistry {
    fn font_metrics(&self, font: &FontSpec) -> Option<FontMetrics> {
        self.face_for(font)?.metrics(font.size)
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> Option<TextMetrics> {
        let key = (font.cache_key(), text.to_string());
        if let Some(hit) = read(&self.measures).get(&key) {
            return Some(*hit);
        }
        let metrics = self.face_for(font)?.measure(text, font.size)?;
        self.remember_measure(key, metrics);
        Some(metrics)
    }

    fn glyph_advance(&self, c: char, font: &FontSpec) -> Option<f32> {
        self.face_for(font)?.glyph_advance(c, font.size)
    }

    fn glyph_path(&self, c: char, font: &FontSpec, origin: Point) -> Option<Path> {
        self.face_for(font)?.glyph_path(c, font.size, origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_keywords_map_to_categories() {
        assert_eq!(GenericFont::from_family(""), Some(GenericFont::System));
        assert_eq!(GenericFont::from_family("Monospace"), Some(GenericFont::Monospace));
        assert_eq!(GenericFont::from_family("serif"), Some(GenericFont::Serif));
        assert_eq!(GenericFont::from_family("Inter"), None);
    }

    #[test]
    fn empty_registry_reports_unavailable() {
        let registry = FontRegistry::empty();
        let font = FontSpec::new("Inter", 16.0);
        assert!(registry.font_metrics(&font).is_none());
        assert!(registry.measure_text("abc", &font).is_none());
        // The miss is cached
        assert!(registry.load_font_with_style("Inter", 400, false).is_err());
        assert!(read(&registry.faces).contains_key("Inter:w400:n"));
    }

    #[test]
    fn measure_cache_stays_bounded() {
        let registry = FontRegistry::empty();
        for i in 0..MAX_MEASURES + 10 {
            let key = ("Inter:w400:n:16".to_string(), i.to_string());
            registry.remember_measure(key, TextMetrics::default());
            assert!(read(&registry.measures).len() <= MAX_MEASURES);
        }
        let last = ("Inter:w400:n:16".to_string(), (MAX_MEASURES + 9).to_string());
        assert!(read(&registry.measures).contains_key(&last));
    }

    #[test]
    fn system_fonts_measure_when_present() {
        let registry = FontRegistry::new();
        let font = FontSpec::new("sans-serif", 16.0);
        let Some(metrics) = registry.measure_text("Hello", &font) else {
            println!("No system fonts available - skipping test (CI environment)");
            return;
        };
        assert!(metrics.width > 0.0);
        assert_eq!(registry.measure_text("Hello", &font), Some(metrics));
    }
}
