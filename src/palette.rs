//! # Palette and Color Quantization
//!
//! The canvas service exposes a fixed, ordered color palette. This module
//! provides:
//!
//! - `PaletteColor`: the `{name, colorCode}` entries as served remotely.
//! - `PaletteCache`: explicit load/populate lifecycle for persisting the
//!   palette across runs (load-if-present, else fetch-and-persist). The
//!   cache is injected into callers rather than accessed as ambient state.
//! - `Quantizer`: nearest-color lookup mapping an arbitrary RGB triple to
//!   its closest palette index.
//!
//! Distance comparison uses integer squared Euclidean distance; the square
//! root is monotonic so the argmin is identical without it.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};

/// One palette entry as served by `getAvailableColors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteColor {
    pub name: String,
    /// Hex color string, e.g. `#ff8800` (leading `#` optional).
    pub color_code: String,
}

/// Persistence for the palette across runs.
///
/// `load` returns `None` when nothing has been cached yet; callers then
/// fetch the palette remotely and `store` it for the next run.
pub trait PaletteCache {
    fn load(&self) -> WardenResult<Option<Vec<PaletteColor>>>;
    fn store(&self, colors: &[PaletteColor]) -> WardenResult<()>;
}

/// File-backed palette cache (pretty-printed JSON, `colors.json` by
/// convention).
pub struct FilePaletteCache {
    path: PathBuf,
}

impl FilePaletteCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PaletteCache for FilePaletteCache {
    fn load(&self) -> WardenResult<Option<Vec<PaletteColor>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| WardenError::io(self.path.display().to_string(), e))?;
        let colors = serde_json::from_str(&raw)
            .map_err(|e| WardenError::palette(format!("corrupt palette cache: {}", e)))?;
        Ok(Some(colors))
    }

    fn store(&self, colors: &[PaletteColor]) -> WardenResult<()> {
        let raw = serde_json::to_string_pretty(colors)
            .map_err(|e| WardenError::palette(format!("cannot serialize palette: {}", e)))?;
        fs::write(&self.path, raw)
            .map_err(|e| WardenError::io(self.path.display().to_string(), e))
    }
}

/// Nearest-color lookup against a fixed palette.
pub struct Quantizer {
    colors: Vec<[u8; 3]>,
}

impl Quantizer {
    /// Parse the palette into RGB triples.
    ///
    /// Fails on malformed hex codes, an empty palette, or a palette that
    /// does not fit the `u8` color-index space.
    pub fn new(palette: &[PaletteColor]) -> WardenResult<Self> {
        if palette.is_empty() {
            return Err(WardenError::palette("palette is empty"));
        }
        if palette.len() > 256 {
            return Err(WardenError::palette(format!(
                "palette has {} colors, at most 256 supported",
                palette.len()
            )));
        }
        let colors = palette
            .iter()
            .map(|c| {
                parse_hex(&c.color_code).ok_or_else(|| {
                    WardenError::palette(format!(
                        "malformed color code '{}' for '{}'",
                        c.color_code, c.name
                    ))
                })
            })
            .collect::<WardenResult<Vec<_>>>()?;
        Ok(Self { colors })
    }

    /// Index of the palette color closest to `rgb`.
    ///
    /// Ties resolve to the lowest index, matching the order the service
    /// lists its colors in.
    pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (i, color) in self.colors.iter().enumerate() {
            let dist = distance_squared(*color, rgb);
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best as u8
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn distance_squared(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

fn parse_hex(code: &str) -> Option<[u8; 3]> {
    let hex = code.strip_prefix('#').unwrap_or(code);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette(codes: &[&str]) -> Vec<PaletteColor> {
        codes
            .iter()
            .enumerate()
            .map(|(i, code)| PaletteColor {
                name: format!("color-{}", i),
                color_code: (*code).to_string(),
            })
            .collect()
    }

    #[test]
    fn test_parse_hex_variants() {
        assert_eq!(parse_hex("#ff0080"), Some([255, 0, 128]));
        assert_eq!(parse_hex("FF0080"), Some([255, 0, 128]));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(parse_hex(""), None);
    }

    #[test]
    fn test_nearest_exact_match() {
        let q = Quantizer::new(&palette(&["#000000", "#ff0000", "#00ff00"])).unwrap();
        assert_eq!(q.nearest([0, 0, 0]), 0);
        assert_eq!(q.nearest([255, 0, 0]), 1);
        assert_eq!(q.nearest([0, 255, 0]), 2);
    }

    #[test]
    fn test_nearest_picks_closest() {
        let q = Quantizer::new(&palette(&["#000000", "#ffffff"])).unwrap();
        assert_eq!(q.nearest([10, 20, 30]), 0);
        assert_eq!(q.nearest([200, 220, 240]), 1);
    }

    #[test]
    fn test_nearest_tie_resolves_to_first() {
        // (128,0,0) is equidistant from black and #ff0000-minus-half.
        let q = Quantizer::new(&palette(&["#000000", "#800000"])).unwrap();
        assert_eq!(q.nearest([64, 0, 0]), 0);
    }

    #[test]
    fn test_rejects_bad_palettes() {
        assert!(Quantizer::new(&[]).is_err());
        assert!(Quantizer::new(&palette(&["#12345"])).is_err());

        let oversized = (0..257)
            .map(|i| PaletteColor {
                name: format!("c{}", i),
                color_code: "#000000".to_string(),
            })
            .collect::<Vec<_>>();
        assert!(Quantizer::new(&oversized).is_err());
    }

    #[test]
    fn test_file_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FilePaletteCache::new(dir.path().join("colors.json"));

        assert!(cache.load().unwrap().is_none());

        let colors = palette(&["#112233", "#445566"]);
        cache.store(&colors).unwrap();
        assert_eq!(cache.load().unwrap(), Some(colors));
    }

    #[test]
    fn test_file_cache_rejects_corrupt_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors.json");
        std::fs::write(&path, "not json").unwrap();

        let cache = FilePaletteCache::new(path);
        assert!(cache.load().is_err());
    }
}
