use tiny_skia::{
    Color, FillRule, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};
use ttf_parser::Face;

use crate::compose::PaintOp;
use crate::error::Error;
use crate::fonts::ResolvedFont;
use crate::render::RenderedPage;
use crate::style::Rgb;

/// Bridges ttf-parser glyph outlines into a tiny-skia path. Outlines come
/// in font units with y up; the fill transform flips and scales them.
struct GlyphOutline {
    builder: PathBuilder,
}

impl ttf_parser::OutlineBuilder for GlyphOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn solid_paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], 255);
    paint.anti_alias = true;
    paint
}

fn draw_text(
    pixmap: &mut Pixmap,
    font: &ResolvedFont,
    text: &str,
    px: f32,
    color: Rgb,
    origin_x: f32,
    baseline_y: f32,
    scale: f32,
) -> bool {
    let Some(source) = &font.source else {
        return false;
    };
    let Ok(face) = Face::parse(&source.data, source.face_index) else {
        return false;
    };
    let units = face.units_per_em() as f32;
    let glyph_scale = px * scale / units;
    let paint = solid_paint(color);

    let mut pen_x = origin_x * scale;
    let pen_y = baseline_y * scale;

    for ch in text.chars() {
        let advance = font.char_advance(ch, px) * scale;
        if let Some(gid) = face.glyph_index(ch) {
            let mut outline = GlyphOutline {
                builder: PathBuilder::new(),
            };
            if face.outline_glyph(gid, &mut outline).is_some() {
                if let Some(path) = outline.builder.finish() {
                    let transform =
                        Transform::from_row(glyph_scale, 0.0, 0.0, -glyph_scale, pen_x, pen_y);
                    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
                }
            }
        }
        pen_x += advance;
    }
    true
}

fn draw_image(
    pixmap: &mut Pixmap,
    image: &image::RgbaImage,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    scale: f32,
) -> Result<(), Error> {
    let (iw, ih) = (image.width(), image.height());
    if iw == 0 || ih == 0 || w <= 0.0 || h <= 0.0 {
        return Ok(());
    }

    // tiny-skia wants premultiplied RGBA.
    let mut data = Vec::with_capacity((iw * ih * 4) as usize);
    for p in image.pixels() {
        let a = p.0[3] as u32;
        data.push((p.0[0] as u32 * a / 255) as u8);
        data.push((p.0[1] as u32 * a / 255) as u8);
        data.push((p.0[2] as u32 * a / 255) as u8);
        data.push(a as u8);
    }
    let size = IntSize::from_wh(iw, ih)
        .ok_or_else(|| Error::RasterizationFailed("image dimensions out of range".into()))?;
    let src = Pixmap::from_vec(data, size)
        .ok_or_else(|| Error::RasterizationFailed("image buffer mismatch".into()))?;

    let sx = w * scale / iw as f32;
    let sy = h * scale / ih as f32;
    let transform = Transform::from_row(sx, 0.0, 0.0, sy, x * scale, y * scale);
    pixmap.draw_pixmap(0, 0, src.as_ref(), &PixmapPaint::default(), transform, None);
    Ok(())
}

/// Rasterize one rendered page into an RGBA surface at `oversample` times
/// the page's pixel geometry. Fails whole, never partially: any problem
/// aborts with `RasterizationFailed` so the exporter can abort the export.
pub fn rasterize_page(page: &RenderedPage, oversample: f32) -> Result<Pixmap, Error> {
    if !(oversample.is_finite() && oversample >= 1.0) {
        return Err(Error::RasterizationFailed(format!(
            "invalid oversampling factor {oversample}"
        )));
    }

    let w = (page.geometry.width_px * oversample).round() as u32;
    let h = (page.geometry.height_px * oversample).round() as u32;
    let mut pixmap = Pixmap::new(w, h).ok_or_else(|| {
        Error::RasterizationFailed(format!("could not allocate {w}x{h} page surface"))
    })?;
    pixmap.fill(Color::WHITE);

    let mut missing_outlines = false;

    for op in &page.ops {
        match op {
            PaintOp::Rect { x, y, w, h, color } => {
                if let Some(rect) = Rect::from_xywh(
                    x * oversample,
                    y * oversample,
                    w * oversample,
                    h * oversample,
                ) {
                    pixmap.fill_rect(rect, &solid_paint(*color), Transform::identity(), None);
                }
            }
            PaintOp::Text {
                x,
                baseline,
                text,
                px,
                color,
                font,
            } => {
                if !draw_text(&mut pixmap, font, text, *px, *color, *x, *baseline, oversample) {
                    missing_outlines = true;
                }
            }
            PaintOp::Image {
                x,
                y,
                w,
                h,
                image,
            } => {
                draw_image(&mut pixmap, image, *x, *y, *w, *h, oversample)?;
            }
        }
    }

    if missing_outlines {
        log::warn!(
            "page {}: some text skipped during rasterization (no glyph outlines for the \
             configured font); register font bytes for pixel-accurate output",
            page.index
        );
    }

    Ok(pixmap)
}
