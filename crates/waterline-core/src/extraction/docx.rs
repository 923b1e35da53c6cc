use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::WaterlineError;
use crate::extraction::DocumentReader;
use crate::model::{RawDocument, Segment, SegmentKind};

/// DOCX reader: unpacks the OOXML container and walks word/document.xml.
///
/// Paragraphs become Paragraph segments; each table row becomes one
/// TableRow segment with cell texts joined by tabs, so the parser can
/// recover the column structure of the measurement tables.
pub struct DocxReader;

impl DocxReader {
    pub fn new() -> Self {
        DocxReader
    }
}

impl Default for DocxReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for DocxReader {
    fn read_segments(&self, doc: &RawDocument) -> Result<Vec<Segment>, WaterlineError> {
        let unreadable = |reason: String| WaterlineError::UnreadableDocument {
            path: doc.path.clone(),
            reason,
        };

        let cursor = Cursor::new(&doc.bytes);
        let mut archive =
            ZipArchive::new(cursor).map_err(|e| unreadable(format!("not a docx archive: {e}")))?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| unreadable(format!("missing word/document.xml: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| unreadable(format!("corrupt document part: {e}")))?;

        parse_document_xml(&xml).map_err(unreadable)
    }

    fn backend_name(&self) -> &str {
        "docx"
    }
}

/// Walk the WordprocessingML body, collecting paragraph text and table rows
/// in source order.
fn parse_document_xml(xml: &str) -> Result<Vec<Segment>, String> {
    let mut reader = Reader::from_str(xml);

    let mut segments: Vec<Segment> = Vec::new();
    let mut table_depth = 0usize;
    let mut in_cell = false;
    let mut para = String::new();
    let mut cell = String::new();
    let mut row: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"tr" if table_depth > 0 => row.clear(),
                b"tc" if table_depth > 0 => {
                    in_cell = true;
                    cell.clear();
                }
                b"p" if table_depth == 0 => para.clear(),
                // Soft breaks and tabs inside a run become plain spaces
                b"br" | b"tab" => {
                    if in_cell {
                        cell.push(' ');
                    } else {
                        para.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"tr" if table_depth > 0 => {
                    if row.iter().any(|c| !c.is_empty()) {
                        segments.push(Segment {
                            index: segments.len(),
                            kind: SegmentKind::TableRow,
                            text: row.join("\t"),
                        });
                    }
                    row.clear();
                }
                b"tc" if in_cell => {
                    in_cell = false;
                    row.push(normalize_ws(&cell));
                    cell.clear();
                }
                b"p" => {
                    if in_cell {
                        // Multi-paragraph cells collapse to space-separated text
                        cell.push(' ');
                    } else if table_depth == 0 {
                        let text = normalize_ws(&para);
                        if !text.is_empty() {
                            segments.push(Segment::paragraph(segments.len(), text));
                        }
                        para.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| format!("malformed document.xml: {e}"))?;
                if in_cell {
                    cell.push_str(&text);
                } else {
                    para.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("malformed document.xml: {e}")),
        }
    }

    Ok(segments)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
