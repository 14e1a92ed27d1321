//! Font faces and the per-run font cache.
//!
//! Outline fonts (TrueType/OpenType) are loaded from disk with ab_glyph. The
//! built-in face is Spleen 12x24, which ships inside the `spleen-font` crate,
//! so generation always has something to draw with.

use ab_glyph::FontArc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// A face text can be rendered with. Cheap to clone.
#[derive(Clone)]
pub enum Face {
    /// Spleen 12x24 bitmap, scaled to the requested size.
    Builtin,
    Outline(FontArc),
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Builtin => f.write_str("Face::Builtin"),
            Face::Outline(_) => f.write_str("Face::Outline"),
        }
    }
}

impl Face {
    /// Load an outline font from a file.
    pub fn load(path: &Path) -> Result<Face, String> {
        load_outline(path).map(Face::Outline)
    }
}

fn load_outline(path: &Path) -> Result<FontArc, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    FontArc::try_from_vec(bytes).map_err(|e| e.to_string())
}

/// Caches faces by path for the lifetime of a run.
///
/// A path that fails to load is remembered as failed, so the fallback warning
/// is logged once per path rather than once per row.
#[derive(Default)]
pub struct FontLibrary {
    faces: RwLock<HashMap<PathBuf, Option<FontArc>>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Face for `path`, or the built-in face when `path` is `None` or unloadable.
    pub fn resolve(&self, path: Option<&Path>) -> Face {
        let Some(path) = path else {
            return Face::Builtin;
        };

        if let Ok(faces) = self.faces.read() {
            if let Some(cached) = faces.get(path) {
                return cached.clone().map_or(Face::Builtin, Face::Outline);
            }
        }

        let loaded = match load_outline(path) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!(
                    "Could not load font {}: {}; using the built-in font",
                    path.display(),
                    e
                );
                None
            }
        };

        if let Ok(mut faces) = self.faces.write() {
            faces.entry(path.to_path_buf()).or_insert_with(|| loaded.clone());
        }
        loaded.map_or(Face::Builtin, Face::Outline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_builtin() {
        let fonts = FontLibrary::new();
        assert!(matches!(fonts.resolve(None), Face::Builtin));
    }

    #[test]
    fn test_unloadable_falls_back_and_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.ttf");
        std::fs::write(&bogus, b"definitely not a font").unwrap();

        let fonts = FontLibrary::new();
        assert!(matches!(fonts.resolve(Some(&bogus)), Face::Builtin));
        assert!(matches!(
            fonts.resolve(Some(Path::new("/nonexistent/font.ttf"))),
            Face::Builtin
        ));
        assert_eq!(fonts.faces.read().unwrap().len(), 2);

        // Second lookup is served from the cache
        std::fs::remove_file(&bogus).unwrap();
        assert!(matches!(fonts.resolve(Some(&bogus)), Face::Builtin));
        assert_eq!(fonts.faces.read().unwrap().len(), 2);
    }
}
