use std::fmt;

/// Terminal failures of a pagination or export run.
#[derive(Debug)]
pub enum Error {
    /// Measurement was requested before the font catalog was readied.
    /// Recoverable: call `FontCatalog::ensure_ready` and retry the run.
    MeasurementUnavailable,
    /// A rendered page could not be converted to a raster surface. Fatal
    /// for the current export; no partial PDF is produced.
    RasterizationFailed(String),
    /// A newer run for the same engine started before this one finished.
    /// The in-flight run's output is discarded (cancel-and-restart).
    Superseded,
    /// A caller-supplied image (signature, background) could not be decoded.
    Image(String),
    FontLoad(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MeasurementUnavailable => {
                write!(f, "font catalog not ready; measurement unavailable")
            }
            Error::RasterizationFailed(msg) => write!(f, "page rasterization failed: {msg}"),
            Error::Superseded => write!(f, "run superseded by a newer input"),
            Error::Image(msg) => write!(f, "image decode failed: {msg}"),
            Error::FontLoad(msg) => write!(f, "font load failed: {msg}"),
            Error::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Non-fatal conditions surfaced alongside a successful run. These are
/// policy, not exceptions: rendering and export always proceed.
#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    /// Payment schedule percentages don't sum to 100.
    InvalidScheduleTotal { total: f64 },
    /// A single block is taller than the page content height; it is placed
    /// alone on its own page and allowed to overflow.
    OversizedBlock {
        block: String,
        height_px: f32,
        max_px: f32,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidScheduleTotal { total } => {
                write!(f, "payment schedule totals {total}%, expected 100%")
            }
            Warning::OversizedBlock {
                block,
                height_px,
                max_px,
            } => write!(
                f,
                "block {block} measures {height_px}px, taller than the {max_px}px page content box"
            ),
        }
    }
}
