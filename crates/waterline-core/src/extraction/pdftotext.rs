use std::io::Write;
use std::process::Command;

use crate::error::WaterlineError;
use crate::extraction::DocumentReader;
use crate::model::{RawDocument, Segment};

/// PDF reader backed by pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` so column alignment of tabular report pages
/// survives into the text, which the gap-split layout rules rely on.
pub struct PdftotextReader;

impl PdftotextReader {
    pub fn new() -> Self {
        PdftotextReader
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for PdftotextReader {
    fn read_segments(&self, doc: &RawDocument) -> Result<Vec<Segment>, WaterlineError> {
        // pdftotext wants a file on disk
        let mut tmpfile = tempfile::NamedTempFile::new()?;
        tmpfile.write_all(&doc.bytes)?;

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WaterlineError::PdftotextNotFound
                } else {
                    WaterlineError::UnreadableDocument {
                        path: doc.path.clone(),
                        reason: format!("pdftotext failed: {e}"),
                    }
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(WaterlineError::UnreadableDocument {
                path: doc.path.clone(),
                reason: format!("pdftotext exit code {code}: {stderr}"),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(segments_from_text(&text))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Split extracted text into one paragraph segment per non-blank line.
/// pdftotext uses form feed (\x0c) as the page separator.
fn segments_from_text(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for page in text.split('\x0c') {
        for line in page.lines() {
            if line.trim().is_empty() {
                continue;
            }
            segments.push(Segment::paragraph(segments.len(), line));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SegmentKind;

    #[test]
    fn test_segments_skip_blank_lines() {
        let segs = segments_from_text("SITE VISITATION REPORT\n\nDate: 3/14/23\n");
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "SITE VISITATION REPORT");
        assert_eq!(segs[1].text, "Date: 3/14/23");
        assert_eq!(segs[1].index, 1);
        assert!(segs.iter().all(|s| s.kind == SegmentKind::Paragraph));
    }

    #[test]
    fn test_segments_span_page_breaks() {
        let segs = segments_from_text("page one\x0cpage two\n");
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].text, "page two");
    }

    #[test]
    fn test_rereading_is_identical() {
        let text = "Facility: Giant City SP\npH: 7.5\n";
        let a = segments_from_text(text);
        let b = segments_from_text(text);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.text, y.text);
            assert_eq!(x.index, y.index);
        }
    }
}
