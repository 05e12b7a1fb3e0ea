use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Alignment, ImageRef};

pub type Rgb = [u8; 3];

/// Stable identity of a document section. Overrides are keyed by this, and
/// every content block carries the section it belongs to so resolution is
/// deterministic across runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Introduction,
    Parties,
    Scope,
    Milestones,
    Payment,
    Timeline,
    Terms,
    Signatures,
}

impl SectionId {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Introduction => "introduction",
            SectionId::Parties => "parties",
            SectionId::Scope => "scope",
            SectionId::Milestones => "milestones",
            SectionId::Payment => "payment",
            SectionId::Timeline => "timeline",
            SectionId::Terms => "terms",
            SectionId::Signatures => "signatures",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSizeName {
    Small,
    Medium,
    Large,
    XLarge,
}

/// Font-size-name to pixel tables, one per text role. Exposed on the
/// configuration surface so callers can rescale the whole document without
/// touching per-section styling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeTables {
    pub header: BTreeMap<FontSizeName, f32>,
    pub section: BTreeMap<FontSizeName, f32>,
    pub subheader: BTreeMap<FontSizeName, f32>,
    pub body: BTreeMap<FontSizeName, f32>,
}

fn table(entries: [(FontSizeName, f32); 4]) -> BTreeMap<FontSizeName, f32> {
    entries.into_iter().collect()
}

impl Default for SizeTables {
    fn default() -> Self {
        use FontSizeName::*;
        Self {
            header: table([(Small, 22.0), (Medium, 26.0), (Large, 30.0), (XLarge, 34.0)]),
            section: table([(Small, 15.0), (Medium, 17.0), (Large, 19.0), (XLarge, 22.0)]),
            subheader: table([(Small, 12.0), (Medium, 13.0), (Large, 15.0), (XLarge, 17.0)]),
            body: table([(Small, 11.0), (Medium, 12.0), (Large, 14.0), (XLarge, 16.0)]),
        }
    }
}

impl SizeTables {
    fn lookup(map: &BTreeMap<FontSizeName, f32>, name: FontSizeName, fallback: f32) -> f32 {
        map.get(&name).copied().unwrap_or(fallback)
    }

    pub fn header_px(&self, name: FontSizeName) -> f32 {
        Self::lookup(&self.header, name, 26.0)
    }

    pub fn section_px(&self, name: FontSizeName) -> f32 {
        Self::lookup(&self.section, name, 17.0)
    }

    pub fn subheader_px(&self, name: FontSizeName) -> f32 {
        Self::lookup(&self.subheader, name, 13.0)
    }

    pub fn body_px(&self, name: FontSizeName) -> f32 {
        Self::lookup(&self.body, name, 12.0)
    }
}

/// Per-section styling override. Any unset field falls through to the
/// global style; the whole struct is ignored when
/// `StyleConfig::apply_global_styles` is true.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionStyleOverride {
    pub header_color: Option<Rgb>,
    pub header_alignment: Option<Alignment>,
    pub header_size: Option<FontSizeName>,
    pub content_color: Option<Rgb>,
    pub content_alignment: Option<Alignment>,
    pub content_size: Option<FontSizeName>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundScope {
    /// Composited behind the first block of the first page only.
    HeaderOnly,
    /// Composited across every page surface.
    EveryPage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageBackground {
    pub image: ImageRef,
    pub scope: BackgroundScope,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub primary_color: Rgb,
    pub content_color: Rgb,
    pub font_family: String,
    /// Line-height multiplier applied on top of the font's natural line height.
    pub line_spacing: f32,
    pub header_size: FontSizeName,
    pub section_size: FontSizeName,
    pub subheader_size: FontSizeName,
    pub body_size: FontSizeName,
    pub header_alignment: Alignment,
    pub content_alignment: Alignment,
    /// When true, all per-section overrides are ignored and every section
    /// renders with the global values.
    pub apply_global_styles: bool,
    pub section_overrides: BTreeMap<SectionId, SectionStyleOverride>,
    pub background: Option<PageBackground>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            primary_color: [26, 32, 56],
            content_color: [51, 51, 51],
            font_family: "Helvetica".to_string(),
            line_spacing: 1.4,
            header_size: FontSizeName::Medium,
            section_size: FontSizeName::Medium,
            subheader_size: FontSizeName::Medium,
            body_size: FontSizeName::Medium,
            header_alignment: Alignment::Left,
            content_alignment: Alignment::Left,
            apply_global_styles: false,
            section_overrides: BTreeMap::new(),
            background: None,
        }
    }
}

/// Concrete visual values for one section after applying the fallback
/// chain: override field (when overrides are active and the field is set)
/// -> global value -> hard-coded default. Both the measurer and the
/// renderer go through this one function; nothing else resolves style.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub header_color: Rgb,
    pub header_alignment: Alignment,
    pub header_px: f32,
    pub section_px: f32,
    pub subheader_px: f32,
    pub content_color: Rgb,
    pub content_alignment: Alignment,
    pub body_px: f32,
    pub font_family: String,
    pub line_spacing: f32,
}

pub fn resolve_section_style(
    config: &StyleConfig,
    tables: &SizeTables,
    section: SectionId,
) -> ResolvedStyle {
    let over = if config.apply_global_styles {
        None
    } else {
        config.section_overrides.get(&section)
    };

    let header_size = over
        .and_then(|o| o.header_size)
        .unwrap_or(config.header_size);
    let content_size = over
        .and_then(|o| o.content_size)
        .unwrap_or(config.body_size);

    ResolvedStyle {
        header_color: over
            .and_then(|o| o.header_color)
            .unwrap_or(config.primary_color),
        header_alignment: over
            .and_then(|o| o.header_alignment)
            .unwrap_or(config.header_alignment),
        header_px: tables.header_px(header_size),
        section_px: tables.section_px(header_size),
        subheader_px: tables.subheader_px(config.subheader_size),
        content_color: over
            .and_then(|o| o.content_color)
            .unwrap_or(config.content_color),
        content_alignment: over
            .and_then(|o| o.content_alignment)
            .unwrap_or(config.content_alignment),
        body_px: tables.body_px(content_size),
        font_family: config.font_family.clone(),
        line_spacing: config.line_spacing,
    }
}

/// Parse a `#rrggbb` or `rrggbb` hex color, as stored by editor frontends.
pub fn parse_hex_color(s: &str) -> Option<Rgb> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
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

    fn override_all() -> SectionStyleOverride {
        SectionStyleOverride {
            header_color: Some([200, 0, 0]),
            header_alignment: Some(Alignment::Center),
            header_size: Some(FontSizeName::XLarge),
            content_color: Some([0, 0, 200]),
            content_alignment: Some(Alignment::Right),
            content_size: Some(FontSizeName::Small),
        }
    }

    #[test]
    fn override_wins_when_overrides_active() {
        let mut config = StyleConfig::default();
        config
            .section_overrides
            .insert(SectionId::Payment, override_all());

        let tables = SizeTables::default();
        let resolved = resolve_section_style(&config, &tables, SectionId::Payment);
        assert_eq!(resolved.header_color, [200, 0, 0]);
        assert_eq!(resolved.content_alignment, Alignment::Right);
        assert_eq!(resolved.body_px, 11.0);
    }

    #[test]
    fn apply_global_styles_ignores_overrides() {
        let mut config = StyleConfig::default();
        config
            .section_overrides
            .insert(SectionId::Payment, override_all());
        config.apply_global_styles = true;

        let tables = SizeTables::default();
        let resolved = resolve_section_style(&config, &tables, SectionId::Payment);
        assert_eq!(resolved.header_color, config.primary_color);
        assert_eq!(resolved.content_alignment, config.content_alignment);
        assert_eq!(resolved.body_px, 12.0);
    }

    #[test]
    fn unset_override_fields_fall_through() {
        let mut config = StyleConfig::default();
        config.section_overrides.insert(
            SectionId::Terms,
            SectionStyleOverride {
                content_color: Some([9, 9, 9]),
                ..SectionStyleOverride::default()
            },
        );

        let tables = SizeTables::default();
        let resolved = resolve_section_style(&config, &tables, SectionId::Terms);
        assert_eq!(resolved.content_color, [9, 9, 9]);
        assert_eq!(resolved.header_color, config.primary_color);
        assert_eq!(resolved.header_px, 26.0);
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#1a2038"), Some([26, 32, 56]));
        assert_eq!(parse_hex_color("ffffff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }
}
