use crate::compose::{compose_block, decode_image, PaintOp};
use crate::error::Error;
use crate::fonts::FontCatalog;
use crate::model::PageGeometry;
use crate::paginate::Page;
use crate::style::{BackgroundScope, SizeTables, StyleConfig};

/// One page ready for display or rasterization: paint ops in absolute page
/// coordinates (CSS px, origin top-left). The preview layer draws these
/// directly; the PDF exporter rasterizes them. Both see the same ops with
/// the same resolved styles.
pub struct RenderedPage {
    pub index: usize,
    pub geometry: PageGeometry,
    pub ops: Vec<PaintOp>,
}

fn offset_op(op: PaintOp, dx: f32, dy: f32) -> PaintOp {
    match op {
        PaintOp::Rect { x, y, w, h, color } => PaintOp::Rect {
            x: x + dx,
            y: y + dy,
            w,
            h,
            color,
        },
        PaintOp::Text {
            x,
            baseline,
            text,
            px,
            color,
            font,
        } => PaintOp::Text {
            x: x + dx,
            baseline: baseline + dy,
            text,
            px,
            color,
            font,
        },
        PaintOp::Image { x, y, w, h, image } => PaintOp::Image {
            x: x + dx,
            y: y + dy,
            w,
            h,
            image,
        },
    }
}

/// Render one paginated page into a display list. Style resolution happens
/// through the same path composition uses, so block heights here equal the
/// heights pagination was decided with.
pub fn render_page(
    page: &Page,
    page_index: usize,
    config: &StyleConfig,
    tables: &SizeTables,
    catalog: &FontCatalog,
    geometry: &PageGeometry,
) -> Result<RenderedPage, Error> {
    let content_width = geometry.content_width();
    let margin = geometry.margin_px;
    let mut ops: Vec<PaintOp> = Vec::new();

    let composed: Vec<_> = page
        .blocks
        .iter()
        .map(|b| compose_block(b, config, tables, catalog, content_width))
        .collect::<Result<_, _>>()?;

    if let Some(background) = &config.background {
        match background.scope {
            BackgroundScope::EveryPage => {
                let image = decode_image(&background.image)?;
                ops.push(PaintOp::Image {
                    x: 0.0,
                    y: 0.0,
                    w: geometry.width_px,
                    h: geometry.height_px,
                    image,
                });
            }
            BackgroundScope::HeaderOnly => {
                // Behind the first block of the first page only.
                if page_index == 0 {
                    if let Some(first) = composed.first() {
                        let image = decode_image(&background.image)?;
                        ops.push(PaintOp::Image {
                            x: 0.0,
                            y: 0.0,
                            w: geometry.width_px,
                            h: margin + first.height,
                            image,
                        });
                    }
                }
            }
        }
    }

    let mut y = margin;
    for block in composed {
        ops.extend(block.ops.into_iter().map(|op| offset_op(op, margin, y)));
        y += block.height;
    }

    Ok(RenderedPage {
        index: page_index,
        geometry: *geometry,
        ops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentBlock;
    use crate::style::SectionId;

    fn setup() -> (StyleConfig, SizeTables, FontCatalog) {
        let catalog = FontCatalog::new();
        catalog.ensure_ready();
        (StyleConfig::default(), SizeTables::default(), catalog)
    }

    fn page_of(texts: &[&str]) -> Page {
        Page {
            blocks: texts
                .iter()
                .map(|t| ContentBlock::Paragraph {
                    text: t.to_string(),
                    section: SectionId::Scope,
                })
                .collect(),
        }
    }

    #[test]
    fn ops_are_offset_into_the_content_box() {
        let (config, tables, catalog) = setup();
        let page = page_of(&["First paragraph.", "Second paragraph."]);
        let rendered =
            render_page(&page, 0, &config, &tables, &catalog, &PageGeometry::A4).unwrap();
        assert!(!rendered.ops.is_empty());
        for op in &rendered.ops {
            let (x, y) = match op {
                PaintOp::Text { x, baseline, .. } => (*x, *baseline),
                PaintOp::Rect { x, y, .. } => (*x, *y),
                PaintOp::Image { x, y, .. } => (*x, *y),
            };
            assert!(x >= PageGeometry::A4.margin_px);
            assert!(y >= PageGeometry::A4.margin_px);
        }
    }

    #[test]
    fn second_block_renders_below_first() {
        let (config, tables, catalog) = setup();
        let page = page_of(&["First paragraph.", "Second paragraph."]);
        let rendered =
            render_page(&page, 0, &config, &tables, &catalog, &PageGeometry::A4).unwrap();
        let baselines: Vec<f32> = rendered
            .ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { baseline, .. } => Some(*baseline),
                _ => None,
            })
            .collect();
        assert_eq!(baselines.len(), 2);
        assert!(baselines[1] > baselines[0]);
    }

    #[test]
    fn preview_and_export_see_identical_ops() {
        // Rendering is a pure function of (page, config, geometry); the
        // export path calls this same function, so two calls must agree.
        let (config, tables, catalog) = setup();
        let page = page_of(&["Same content either way."]);
        let a = render_page(&page, 0, &config, &tables, &catalog, &PageGeometry::A4).unwrap();
        let b = render_page(&page, 0, &config, &tables, &catalog, &PageGeometry::A4).unwrap();
        assert_eq!(a.ops.len(), b.ops.len());
        for (x, y) in a.ops.iter().zip(b.ops.iter()) {
            match (x, y) {
                (
                    PaintOp::Text {
                        x: ax,
                        baseline: ab,
                        text: at,
                        px: ap,
                        color: ac,
                        ..
                    },
                    PaintOp::Text {
                        x: bx,
                        baseline: bb,
                        text: bt,
                        px: bp,
                        color: bc,
                        ..
                    },
                ) => {
                    assert_eq!((ax, ab, at, ap, ac), (bx, bb, bt, bp, bc));
                }
                (PaintOp::Rect { .. }, PaintOp::Rect { .. }) => {}
                (PaintOp::Image { .. }, PaintOp::Image { .. }) => {}
                _ => panic!("op kinds diverged between renders"),
            }
        }
    }
}
