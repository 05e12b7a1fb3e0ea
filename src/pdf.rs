use chrono::NaiveDate;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use crate::error::Error;
use crate::raster::rasterize_page;
use crate::render::RenderedPage;

/// A finished export: the PDF bytes plus the derived download filename.
pub struct PdfExport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

/// 96 CSS px per inch, 72 PDF points per inch.
const PT_PER_PX: f32 = 72.0 / 96.0;

/// Filesystem-safe slug from a document title: lowercase alphanumerics
/// with single dashes, "contract" when nothing survives.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("contract");
    }
    slug
}

pub fn export_filename(title: &str, date: NaiveDate) -> String {
    format!("{}-{}.pdf", slugify(title), date.format("%Y-%m-%d"))
}

/// Rasterize each rendered page and assemble the multi-page PDF. Pages are
/// processed strictly one at a time so only one raster surface is resident;
/// any page that fails to rasterize aborts the whole export with no
/// partial output. The PDF page count always equals `pages.len()`.
pub fn export_pdf(
    pages: &[RenderedPage],
    title: &str,
    date: NaiveDate,
    oversample: f32,
) -> Result<PdfExport, Error> {
    let t0 = std::time::Instant::now();

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let page_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();

    for (page, &page_id) in pages.iter().zip(&page_ids) {
        let pixmap = rasterize_page(page, oversample)?;
        let (px_w, px_h) = (pixmap.width(), pixmap.height());

        // Flattened onto an opaque white surface, so alpha is uniformly
        // 255 and premultiplied RGBA reduces to plain RGB.
        let rgba = pixmap.take();
        let rgb: Vec<u8> = rgba
            .chunks_exact(4)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6);

        let xobj_ref = alloc();
        {
            let mut xobj = pdf.image_xobject(xobj_ref, &compressed);
            xobj.filter(Filter::FlateDecode);
            xobj.width(px_w as i32);
            xobj.height(px_h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }

        let page_w_pt = page.geometry.width_px * PT_PER_PX;
        let page_h_pt = page.geometry.height_px * PT_PER_PX;

        let mut content = Content::new();
        content.save_state();
        content.transform([page_w_pt, 0.0, 0.0, page_h_pt, 0.0, 0.0]);
        content.x_object(Name(b"Pg"));
        content.restore_state();
        let content_bytes = content.finish();

        let content_id = alloc();
        pdf.stream(content_id, &content_bytes);

        let mut page_dict = pdf.page(page_id);
        page_dict.media_box(Rect::new(0.0, 0.0, page_w_pt, page_h_pt));
        page_dict.parent(pages_id);
        page_dict.contents(content_id);
        page_dict
            .resources()
            .x_objects()
            .pair(Name(b"Pg"), xobj_ref);
    }

    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(pages.len() as i32);
    pdf.catalog(catalog_id).pages(pages_id);

    let bytes = pdf.finish();
    log::info!(
        "PDF export: {} pages, {} bytes, {:.1}ms",
        pages.len(),
        bytes.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(PdfExport {
        bytes,
        filename: export_filename(title, date),
        page_count: pages.len(),
    })
}
