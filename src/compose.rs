use std::sync::Arc;

use crate::content::{format_currency, format_long_date, ContentBlock};
use crate::error::Error;
use crate::fonts::{FontCatalog, ResolvedFont};
use crate::layout::{wrap_text, LaidLine};
use crate::model::{Alignment, ImageRef, Milestone, Party};
use crate::style::{resolve_section_style, ResolvedStyle, Rgb, SizeTables, StyleConfig};

/// One drawing primitive. Coordinates are CSS px relative to the block's
/// top-left corner at composition time; the renderer translates ops into
/// page space. The preview consumer and the rasterizer read the same ops,
/// which is what keeps preview and PDF output identical.
#[derive(Clone)]
pub enum PaintOp {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    Text {
        x: f32,
        baseline: f32,
        text: String,
        px: f32,
        color: Rgb,
        font: Arc<ResolvedFont>,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: Arc<image::RgbaImage>,
    },
}

/// A block laid out at a fixed content width: its paint ops and its total
/// vertical extent. The height includes the block's trailing margin; the
/// paginator treats that margin as part of the block's footprint.
pub struct ComposedBlock {
    pub height: f32,
    pub ops: Vec<PaintOp>,
}

const RULE_COLOR: Rgb = [222, 222, 222];
const PARTY_COLUMN_GAP: f32 = 24.0;
const PAYMENT_VALUE_WIDTH: f32 = 150.0;
const SIGNATURE_RULE_WIDTH: f32 = 220.0;
const SIGNATURE_IMAGE_HEIGHT: f32 = 48.0;

fn line_x(alignment: Alignment, content_width: f32, line_width: f32) -> f32 {
    match alignment {
        Alignment::Left => 0.0,
        Alignment::Center => ((content_width - line_width) / 2.0).max(0.0),
        Alignment::Right => (content_width - line_width).max(0.0),
    }
}

/// Append wrapped text ops starting at `y`; returns the vertical extent used.
fn push_lines(
    ops: &mut Vec<PaintOp>,
    lines: &[LaidLine],
    font: &Arc<ResolvedFont>,
    px: f32,
    color: Rgb,
    alignment: Alignment,
    x_origin: f32,
    width: f32,
    y: f32,
    line_spacing: f32,
) -> f32 {
    let line_h = font.line_height(px, line_spacing);
    let ascent = font.ascent(px);
    for (i, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        ops.push(PaintOp::Text {
            x: x_origin + line_x(alignment, width, line.width),
            baseline: y + i as f32 * line_h + ascent,
            text: line.text.clone(),
            px,
            color,
            font: font.clone(),
        });
    }
    lines.len() as f32 * line_h
}

pub(crate) fn decode_image(image: &ImageRef) -> Result<Arc<image::RgbaImage>, Error> {
    let decoded =
        image::load_from_memory(&image.bytes).map_err(|e| Error::Image(e.to_string()))?;
    Ok(Arc::new(decoded.to_rgba8()))
}

struct Fonts {
    regular: Arc<ResolvedFont>,
    bold: Arc<ResolvedFont>,
}

fn resolve_fonts(catalog: &FontCatalog, style: &ResolvedStyle) -> Result<Fonts, Error> {
    Ok(Fonts {
        regular: catalog.resolve(&style.font_family, false, false)?,
        bold: catalog.resolve(&style.font_family, true, false)?,
    })
}

fn compose_heading(
    level: u8,
    text: &str,
    style: &ResolvedStyle,
    fonts: &Fonts,
    width: f32,
) -> ComposedBlock {
    let (px, top_pad, trailing) = match level {
        1 => (style.header_px, 0.0, 18.0),
        2 => (style.section_px, 14.0, 8.0),
        _ => (style.subheader_px, 8.0, 6.0),
    };
    let lines = wrap_text(text, &fonts.bold, px, width);
    let mut ops = Vec::new();
    let text_h = push_lines(
        &mut ops,
        &lines,
        &fonts.bold,
        px,
        style.header_color,
        style.header_alignment,
        0.0,
        width,
        top_pad,
        style.line_spacing,
    );
    let mut height = top_pad + text_h;
    if level == 2 {
        ops.push(PaintOp::Rect {
            x: 0.0,
            y: height + 2.0,
            w: width,
            h: 1.0,
            color: RULE_COLOR,
        });
        height += 3.0;
    }
    ComposedBlock {
        height: height + trailing,
        ops,
    }
}

fn compose_paragraph(
    text: &str,
    style: &ResolvedStyle,
    fonts: &Fonts,
    width: f32,
) -> ComposedBlock {
    let lines = wrap_text(text, &fonts.regular, style.body_px, width);
    let mut ops = Vec::new();
    let text_h = push_lines(
        &mut ops,
        &lines,
        &fonts.regular,
        style.body_px,
        style.content_color,
        style.content_alignment,
        0.0,
        width,
        0.0,
        style.line_spacing,
    );
    ComposedBlock {
        height: text_h + 12.0,
        ops,
    }
}

fn party_column(
    ops: &mut Vec<PaintOp>,
    caption: &str,
    party: &Party,
    style: &ResolvedStyle,
    fonts: &Fonts,
    x: f32,
    width: f32,
) -> f32 {
    let mut y = 0.0;
    let caption_lines = wrap_text(caption, &fonts.bold, style.subheader_px, width);
    y += push_lines(
        ops,
        &caption_lines,
        &fonts.bold,
        style.subheader_px,
        style.header_color,
        Alignment::Left,
        x,
        width,
        y,
        style.line_spacing,
    );
    y += 2.0;

    let mut field = |text: &str, bold: bool| {
        if text.trim().is_empty() {
            return;
        }
        let font = if bold { &fonts.bold } else { &fonts.regular };
        let lines = wrap_text(text, font, style.body_px, width);
        y += push_lines(
            ops,
            &lines,
            font,
            style.body_px,
            style.content_color,
            Alignment::Left,
            x,
            width,
            y,
            style.line_spacing,
        );
    };
    field(&party.name, true);
    field(&party.organization, false);
    field(&party.address, false);
    field(&party.email, false);
    field(&party.phone, false);
    y
}

fn compose_party_pair(
    provider: &Party,
    counterparty: &Party,
    style: &ResolvedStyle,
    fonts: &Fonts,
    width: f32,
) -> ComposedBlock {
    let col_w = (width - PARTY_COLUMN_GAP) / 2.0;
    let mut ops = Vec::new();
    let left_h = party_column(&mut ops, "Service Provider", provider, style, fonts, 0.0, col_w);
    let right_h = party_column(
        &mut ops,
        "Client",
        counterparty,
        style,
        fonts,
        col_w + PARTY_COLUMN_GAP,
        col_w,
    );
    ComposedBlock {
        height: left_h.max(right_h) + 20.0,
        ops,
    }
}

fn compose_milestone(
    milestone: &Milestone,
    style: &ResolvedStyle,
    fonts: &Fonts,
    width: f32,
) -> ComposedBlock {
    let mut ops = Vec::new();
    let mut y = 0.0;

    let title_lines = wrap_text(&milestone.title, &fonts.bold, style.subheader_px, width);
    y += push_lines(
        &mut ops,
        &title_lines,
        &fonts.bold,
        style.subheader_px,
        style.header_color,
        Alignment::Left,
        0.0,
        width,
        y,
        style.line_spacing,
    );

    if !milestone.description.trim().is_empty() {
        let desc_lines = wrap_text(&milestone.description, &fonts.regular, style.body_px, width);
        y += push_lines(
            &mut ops,
            &desc_lines,
            &fonts.regular,
            style.body_px,
            style.content_color,
            style.content_alignment,
            0.0,
            width,
            y,
            style.line_spacing,
        );
    }

    let mut meta = Vec::new();
    if let Some(due) = milestone.due_date {
        meta.push(format!("Due {}", format_long_date(due)));
    }
    if let Some(amount) = milestone.amount {
        meta.push(format_currency(amount));
    }
    if !meta.is_empty() {
        let meta_lines = wrap_text(&meta.join("  \u{b7}  "), &fonts.regular, style.body_px, width);
        y += push_lines(
            &mut ops,
            &meta_lines,
            &fonts.regular,
            style.body_px,
            style.content_color,
            Alignment::Left,
            0.0,
            width,
            y,
            style.line_spacing,
        );
    }

    ComposedBlock {
        height: y + 14.0,
        ops,
    }
}

fn compose_payment_row(
    entry: &crate::model::PaymentScheduleEntry,
    resolved_amount: Option<f64>,
    style: &ResolvedStyle,
    fonts: &Fonts,
    width: f32,
) -> ComposedBlock {
    let desc_w = width - PAYMENT_VALUE_WIDTH - 10.0;
    let mut ops = Vec::new();
    let mut y = 0.0;

    let desc_lines = wrap_text(&entry.description, &fonts.regular, style.body_px, desc_w);
    let desc_h = push_lines(
        &mut ops,
        &desc_lines,
        &fonts.regular,
        style.body_px,
        style.content_color,
        Alignment::Left,
        0.0,
        desc_w,
        y,
        style.line_spacing,
    );

    let value = match resolved_amount {
        Some(amount) => format!("{}% \u{b7} {}", trim_pct(entry.percentage), format_currency(amount)),
        None => format!("{}%", trim_pct(entry.percentage)),
    };
    let value_w = fonts.bold.text_width(&value, style.body_px);
    ops.push(PaintOp::Text {
        x: width - value_w,
        baseline: fonts.bold.ascent(style.body_px),
        text: value,
        px: style.body_px,
        color: style.header_color,
        font: fonts.bold.clone(),
    });

    let first_line_h = fonts.regular.line_height(style.body_px, style.line_spacing);
    y += desc_h.max(first_line_h);

    if let Some(due) = entry.due_date {
        let due_lines = wrap_text(
            &format!("Due {}", format_long_date(due)),
            &fonts.regular,
            style.body_px,
            desc_w,
        );
        y += push_lines(
            &mut ops,
            &due_lines,
            &fonts.regular,
            style.body_px,
            style.content_color,
            Alignment::Left,
            0.0,
            desc_w,
            y,
            style.line_spacing,
        );
    }

    y += 4.0;
    ops.push(PaintOp::Rect {
        x: 0.0,
        y,
        w: width,
        h: 1.0,
        color: RULE_COLOR,
    });

    ComposedBlock {
        height: y + 1.0 + 8.0,
        ops,
    }
}

fn trim_pct(pct: f64) -> String {
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}", pct.round() as i64)
    } else {
        format!("{pct}")
    }
}

fn compose_signature(
    caption: &str,
    name: &str,
    image: Option<&ImageRef>,
    date: Option<chrono::NaiveDate>,
    style: &ResolvedStyle,
    fonts: &Fonts,
    width: f32,
) -> Result<ComposedBlock, Error> {
    let mut ops = Vec::new();
    let mut y = 0.0;

    let caption_lines = wrap_text(caption, &fonts.bold, style.subheader_px, width);
    y += push_lines(
        &mut ops,
        &caption_lines,
        &fonts.bold,
        style.subheader_px,
        style.header_color,
        Alignment::Left,
        0.0,
        width,
        y,
        style.line_spacing,
    );
    y += 6.0;

    match image {
        Some(image) if !image.is_empty() => {
            let decoded = decode_image(image)?;
            let (iw, ih) = (decoded.width() as f32, decoded.height() as f32);
            let scale = (SIGNATURE_IMAGE_HEIGHT / ih).min(SIGNATURE_RULE_WIDTH / iw);
            ops.push(PaintOp::Image {
                x: 0.0,
                y,
                w: iw * scale,
                h: ih * scale,
                image: decoded,
            });
            y += SIGNATURE_IMAGE_HEIGHT;
        }
        _ => {
            // Blank space for a wet or captured signature.
            y += SIGNATURE_IMAGE_HEIGHT;
        }
    }

    ops.push(PaintOp::Rect {
        x: 0.0,
        y,
        w: SIGNATURE_RULE_WIDTH,
        h: 1.0,
        color: style.content_color,
    });
    y += 5.0;

    if !name.trim().is_empty() {
        let name_lines = wrap_text(name, &fonts.regular, style.body_px, width);
        y += push_lines(
            &mut ops,
            &name_lines,
            &fonts.regular,
            style.body_px,
            style.content_color,
            Alignment::Left,
            0.0,
            width,
            y,
            style.line_spacing,
        );
    }
    if let Some(date) = date {
        let date_lines = wrap_text(
            &format!("Signed {}", format_long_date(date)),
            &fonts.regular,
            style.body_px,
            width,
        );
        y += push_lines(
            &mut ops,
            &date_lines,
            &fonts.regular,
            style.body_px,
            style.content_color,
            Alignment::Left,
            0.0,
            width,
            y,
            style.line_spacing,
        );
    }

    Ok(ComposedBlock {
        height: y + 24.0,
        ops,
    })
}

/// Lay a block out at the given content width using the real typography it
/// will render with. This single function backs both measurement (take the
/// height) and rendering (take the ops); identical inputs always compose
/// identically.
pub fn compose_block(
    block: &ContentBlock,
    config: &StyleConfig,
    tables: &SizeTables,
    catalog: &FontCatalog,
    content_width: f32,
) -> Result<ComposedBlock, Error> {
    let style = resolve_section_style(config, tables, block.section());
    let fonts = resolve_fonts(catalog, &style)?;

    match block {
        ContentBlock::Heading { level, text, .. } => {
            Ok(compose_heading(*level, text, &style, &fonts, content_width))
        }
        ContentBlock::Paragraph { text, .. } => {
            Ok(compose_paragraph(text, &style, &fonts, content_width))
        }
        ContentBlock::PartyPair {
            provider,
            counterparty,
        } => Ok(compose_party_pair(
            provider,
            counterparty,
            &style,
            &fonts,
            content_width,
        )),
        ContentBlock::MilestoneItem { milestone, .. } => {
            Ok(compose_milestone(milestone, &style, &fonts, content_width))
        }
        ContentBlock::PaymentRow {
            entry,
            resolved_amount,
            ..
        } => Ok(compose_payment_row(
            entry,
            *resolved_amount,
            &style,
            &fonts,
            content_width,
        )),
        ContentBlock::SignatureBlock {
            role,
            name,
            image,
            date,
        } => compose_signature(
            role.caption(),
            name,
            image.as_ref(),
            *date,
            &style,
            &fonts,
            content_width,
        ),
    }
}
