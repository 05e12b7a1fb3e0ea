use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use memmap2::Mmap;
use ttf_parser::Face;

use crate::error::Error;

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

/// Raw font program backing a resolved font. Present only when a real face
/// was found; metric-only fallbacks carry no outline source.
#[derive(Clone)]
pub struct FontSource {
    pub data: Arc<Vec<u8>>,
    pub face_index: u32,
}

/// Metrics (and optionally outlines) for one family/style variant. The
/// measurer, the renderer and the rasterizer all read the same entry, so a
/// height decided at measurement time is the height drawn at render time.
pub struct ResolvedFont {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    pub source: Option<FontSource>,
    /// Advance widths at 1000 units/em for WinAnsi bytes 32..=255.
    widths_1000: Vec<f32>,
    pub line_h_ratio: f32,
    pub ascender_ratio: f32,
}

impl ResolvedFont {
    fn char_width_1000(&self, ch: char) -> f32 {
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    /// Advance width of a single character at the given size.
    pub fn char_advance(&self, ch: char, px: f32) -> f32 {
        self.char_width_1000(ch) * px / 1000.0
    }

    pub fn text_width(&self, text: &str, px: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * px / 1000.0)
            .sum()
    }

    pub fn space_width(&self, px: f32) -> f32 {
        self.char_width_1000(' ') * px / 1000.0
    }

    /// Natural line height scaled by the style's line-spacing multiplier.
    pub fn line_height(&self, px: f32, spacing: f32) -> f32 {
        px * self.line_h_ratio * spacing
    }

    pub fn ascent(&self, px: f32) -> f32 {
        px * self.ascender_ratio
    }
}

/// System font discovery plus caller-registered font bytes. `ensure_ready`
/// is the once-per-run readiness barrier: resolving before it has run is a
/// `MeasurementUnavailable` error, never a silent zero-width measurement.
pub struct FontCatalog {
    registered: Mutex<HashMap<(String, bool, bool), Arc<Vec<u8>>>>,
    index: OnceLock<FontLookup>,
    resolved: Mutex<HashMap<String, Arc<ResolvedFont>>>,
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FontCatalog {
    pub fn new() -> Self {
        Self {
            registered: Mutex::new(HashMap::new()),
            index: OnceLock::new(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Register in-memory font bytes for a family/style, taking precedence
    /// over any system font of the same name.
    pub fn register(&self, family: &str, bold: bool, italic: bool, data: Vec<u8>) {
        let mut registered = self.registered.lock().unwrap();
        registered.insert((family.to_lowercase(), bold, italic), Arc::new(data));
        // Drop any entry resolved before this registration.
        self.resolved
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&format!("{}/", family.to_lowercase())));
    }

    /// Scan system font directories and build the lookup index. Idempotent;
    /// the scan runs at most once per catalog.
    pub fn ensure_ready(&self) {
        self.index.get_or_init(scan_font_dirs);
    }

    pub fn is_ready(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn resolve(
        &self,
        family: &str,
        bold: bool,
        italic: bool,
    ) -> Result<Arc<ResolvedFont>, Error> {
        let index = self.index.get().ok_or(Error::MeasurementUnavailable)?;

        let key = font_key(family, bold, italic);
        if let Some(entry) = self.resolved.lock().unwrap().get(&key) {
            return Ok(entry.clone());
        }

        let entry = Arc::new(self.load_variant(index, family, bold, italic));
        self.resolved.lock().unwrap().insert(key, entry.clone());
        Ok(entry)
    }

    fn load_variant(
        &self,
        index: &FontLookup,
        family: &str,
        bold: bool,
        italic: bool,
    ) -> ResolvedFont {
        let lookup_key = (family.to_lowercase(), bold, italic);

        if let Some(data) = self.registered.lock().unwrap().get(&lookup_key).cloned() {
            if let Some(font) = font_from_data(family, bold, italic, data, 0) {
                return font;
            }
            log::warn!("registered font bytes for {family} could not be parsed");
        }

        let found = index.get(&lookup_key).or_else(|| {
            // Fall back to the regular variant when the styled one is missing.
            if bold || italic {
                index.get(&(family.to_lowercase(), false, false))
            } else {
                None
            }
        });

        if let Some((path, face_index)) = found {
            match std::fs::read(path) {
                Ok(data) => {
                    if let Some(font) =
                        font_from_data(family, bold, italic, Arc::new(data), *face_index)
                    {
                        return font;
                    }
                    log::warn!("font file {} could not be parsed", path.display());
                }
                Err(e) => log::warn!("font file {} could not be read: {e}", path.display()),
            }
        }

        log::warn!("font not found: {family} bold={bold} italic={italic}; using built-in metrics");
        fallback_font(family, bold, italic)
    }
}

pub fn font_key(family: &str, bold: bool, italic: bool) -> String {
    let base = family.to_lowercase();
    match (bold, italic) {
        (true, true) => format!("{base}/BI"),
        (true, false) => format!("{base}/B"),
        (false, true) => format!("{base}/I"),
        (false, false) => format!("{base}/R"),
    }
}

fn font_from_data(
    family: &str,
    bold: bool,
    italic: bool,
    data: Arc<Vec<u8>>,
    face_index: u32,
) -> Option<ResolvedFont> {
    let face = Face::parse(&data, face_index).ok()?;
    let units = face.units_per_em() as f32;

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| {
            face.glyph_index(winansi_to_char(byte))
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0)
        })
        .collect();

    let line_gap = face.line_gap() as f32;
    let line_h_ratio = (face.ascender() as f32 - face.descender() as f32 + line_gap) / units;
    let ascender_ratio = face.ascender() as f32 / units;

    Some(ResolvedFont {
        family: family.to_string(),
        bold,
        italic,
        source: Some(FontSource { data, face_index }),
        widths_1000,
        line_h_ratio,
        ascender_ratio,
    })
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
/// Keeps measurement and pagination deterministic on hosts with no usable
/// system fonts; the rasterizer has no outlines for these entries.
fn fallback_font(family: &str, bold: bool, italic: bool) -> ResolvedFont {
    let widths_1000 = (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                          // space
            33..=47 => 333.0,                     // punctuation
            48..=57 => 556.0,                     // digits
            58..=64 => 333.0,                     // more punctuation
            73 | 74 => 278.0,                     // I J (narrow uppercase)
            77 => 833.0,                          // M (wide)
            65..=90 => 667.0,                     // uppercase A-Z (average)
            91..=96 => 333.0,                     // brackets etc.
            102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
            109 | 119 => 833.0,                   // m w (wide)
            97..=122 => 556.0,                    // lowercase a-z (average)
            _ => 556.0,
        })
        .collect();
    ResolvedFont {
        family: family.to_string(),
        bold,
        italic,
        source: None,
        widths_1000,
        line_h_ratio: 1.2,
        ascender_ratio: 0.75,
    }
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn font_family_name(face: &Face) -> Option<String> {
    // Use ID 1 (Family): it is the name callers configure and keeps sibling
    // families ("Arial" vs "Arial Narrow") distinct.
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited_dirs: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();

    let mut stack: Vec<PathBuf> = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited_dirs.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold, italic)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold, italic))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed, {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        files_scanned,
        index.len(),
    );

    index
}

/// Windows-1252 (WinAnsi) byte to Unicode char. Bytes 0x80-0x9F are
/// remapped; all others map directly to their codepoint.
fn winansi_to_char(byte: u8) -> char {
    match REMAPPED.iter().find(|&&(b, _)| b == byte) {
        Some(&(_, ch)) => ch,
        None => byte as char,
    }
}

fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        _ => REMAPPED
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map(|&(b, _)| b)
            .unwrap_or(0),
    }
}

/// The 0x80-0x9F WinAnsi remap block (curly quotes, dashes, euro, bullet).
const REMAPPED: &[(u8, char)] = &[
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];
