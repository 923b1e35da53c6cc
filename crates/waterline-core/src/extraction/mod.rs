pub mod docx;
pub mod pdftotext;

use crate::error::WaterlineError;
use crate::model::{DocumentFormat, RawDocument, Segment};

/// Trait for format-specific document readers.
///
/// Extraction is a single deterministic pass: reading the same document
/// twice yields identical segments, so reprocessing is idempotent.
pub trait DocumentReader: Send + Sync {
    /// Extract raw text segments (paragraphs, table rows) in source order.
    fn read_segments(&self, doc: &RawDocument) -> Result<Vec<Segment>, WaterlineError>;

    /// Name of this reader backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// One reader per supported format. The pipeline dispatches on the
/// document's format tag.
pub struct ReaderRegistry {
    pdf: Box<dyn DocumentReader>,
    docx: Box<dyn DocumentReader>,
}

impl ReaderRegistry {
    pub fn new(pdf: Box<dyn DocumentReader>, docx: Box<dyn DocumentReader>) -> ReaderRegistry {
        ReaderRegistry { pdf, docx }
    }

    pub fn reader_for(&self, format: DocumentFormat) -> &dyn DocumentReader {
        match format {
            DocumentFormat::Pdf => self.pdf.as_ref(),
            DocumentFormat::Docx => self.docx.as_ref(),
        }
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        ReaderRegistry::new(
            Box::new(pdftotext::PdftotextReader::new()),
            Box::new(docx::DocxReader::new()),
        )
    }
}
