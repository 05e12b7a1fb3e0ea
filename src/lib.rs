mod compose;
mod content;
mod error;
mod fonts;
mod layout;
mod model;
mod paginate;
mod pdf;
mod raster;
mod render;
mod style;

pub use compose::{compose_block, ComposedBlock, PaintOp};
pub use content::{build_blocks, format_currency, format_long_date, ContentBlock};
pub use error::{Error, Warning};
pub use fonts::{FontCatalog, FontSource, ResolvedFont};
pub use layout::{wrap_text, LaidLine};
pub use model::{
    Alignment, ContractDocument, ImageRef, IpOwnership, Milestone, PageGeometry, Party,
    PaymentMode, PaymentScheduleEntry, PaymentTerms, Retainer, SignerRole, Signatures, Terms,
    UsageRights,
};
pub use paginate::{paginate, Page};
pub use pdf::{export_filename, export_pdf, PdfExport};
pub use raster::rasterize_page;
pub use render::{render_page, RenderedPage};
pub use style::{
    parse_hex_color, resolve_section_style, BackgroundScope, FontSizeName, PageBackground,
    ResolvedStyle, Rgb, SectionId, SectionStyleOverride, SizeTables, StyleConfig,
};

use std::sync::atomic::{AtomicU64, Ordering};

/// On-screen preview of one pagination run: rendered pages plus any
/// non-fatal warnings (bad schedule totals, oversized blocks).
pub struct Preview {
    pub pages: Vec<RenderedPage>,
    pub warnings: Vec<Warning>,
}

/// A finished PDF export plus the run's non-fatal warnings.
pub struct ExportResult {
    pub pdf: PdfExport,
    pub warnings: Vec<Warning>,
}

#[derive(Clone, Copy, Debug)]
pub struct ExportOptions {
    /// Raster oversampling factor; 2.0 keeps text legible at print size.
    pub oversample: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { oversample: 2.0 }
    }
}

/// The pagination and rendering engine. Each call runs the full pipeline
/// on an immutable snapshot of the document: build blocks, measure,
/// paginate, render, and (for export) rasterize and assemble the PDF.
///
/// Runs supersede each other: starting a new run on the same engine
/// invalidates any run still in flight, which then stops at its next
/// stage boundary with `Error::Superseded` and produces no output.
/// Callers re-run with the latest document (cancel-and-restart);
/// debouncing keystrokes is the editing layer's concern.
pub struct Engine {
    catalog: FontCatalog,
    tables: SizeTables,
    generation: AtomicU64,
}

struct RunGuard<'a> {
    engine: &'a Engine,
    generation: u64,
}

impl RunGuard<'_> {
    fn check(&self) -> Result<(), Error> {
        if self.engine.generation.load(Ordering::SeqCst) != self.generation {
            return Err(Error::Superseded);
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_tables(SizeTables::default())
    }

    /// An engine with caller-supplied font-size defaults tables.
    pub fn with_tables(tables: SizeTables) -> Self {
        Self {
            catalog: FontCatalog::new(),
            tables,
            generation: AtomicU64::new(0),
        }
    }

    /// The font catalog, for registering caller-supplied font bytes.
    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    pub fn tables(&self) -> &SizeTables {
        &self.tables
    }

    fn begin_run(&self) -> RunGuard<'_> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RunGuard {
            engine: self,
            generation,
        }
    }

    fn run_pipeline(
        &self,
        doc: &ContractDocument,
        geometry: &PageGeometry,
        run: &RunGuard<'_>,
    ) -> Result<Preview, Error> {
        let t0 = std::time::Instant::now();

        // Readiness barrier: fonts are resolved once per run, never mid-flight.
        self.catalog.ensure_ready();

        let (blocks, mut warnings) = build_blocks(doc);
        let t_blocks = t0.elapsed();
        run.check()?;

        let content_width = geometry.content_width();
        let (pages, mut pagination_warnings) =
            paginate(&blocks, geometry.content_height(), |block| {
                compose_block(block, &doc.style, &self.tables, &self.catalog, content_width)
                    .map(|composed| composed.height)
            })?;
        warnings.append(&mut pagination_warnings);
        let t_paginate = t0.elapsed();
        run.check()?;

        let rendered: Vec<RenderedPage> = pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                render_page(page, index, &doc.style, &self.tables, &self.catalog, geometry)
            })
            .collect::<Result<_, _>>()?;
        let t_render = t0.elapsed();
        run.check()?;

        log::info!(
            "Pipeline: blocks={:.1}ms, paginate={:.1}ms, render={:.1}ms ({} blocks, {} pages)",
            t_blocks.as_secs_f64() * 1000.0,
            (t_paginate - t_blocks).as_secs_f64() * 1000.0,
            (t_render - t_paginate).as_secs_f64() * 1000.0,
            blocks.len(),
            rendered.len(),
        );

        Ok(Preview {
            pages: rendered,
            warnings,
        })
    }

    /// Lay the document out and render every page for on-screen preview.
    pub fn preview(
        &self,
        doc: &ContractDocument,
        geometry: &PageGeometry,
    ) -> Result<Preview, Error> {
        let run = self.begin_run();
        self.run_pipeline(doc, geometry, &run)
    }

    /// Run the full pipeline and export the result as a multi-page PDF.
    /// The PDF's page count always equals the preview's page count for the
    /// same document and geometry.
    pub fn export(
        &self,
        doc: &ContractDocument,
        geometry: &PageGeometry,
        options: ExportOptions,
    ) -> Result<ExportResult, Error> {
        let run = self.begin_run();
        let preview = self.run_pipeline(doc, geometry, &run)?;

        let date = chrono::Local::now().date_naive();
        let pdf = export_pdf(&preview.pages, &doc.title, date, options.oversample)?;
        run.check()?;

        Ok(ExportResult {
            pdf,
            warnings: preview.warnings,
        })
    }
}
