//! Page text for the text-layout back-end.
//!
//! Each page's text is read several ways and the reading with the most
//! row-like lines is kept. Layout engines disagree on spacing, and the one
//! that preserves column gaps differs from document to document.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::backend::{LoadedDocument, guard};
use crate::error::ExtractError;
use crate::model::BackendKind;
use crate::table_parse::{gap_cells, word_cells};
use crate::text_decode::{decode_string, is_garbled};

const FORM_FEED: char = '\u{000C}';
const ROW_WEIGHT: i64 = 50;
const GARBLED_PENALTY: i64 = 800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    LayoutEngine,
    ContentStream,
    PlainText,
}

struct Reading {
    source: Source,
    text: String,
}

impl Reading {
    fn score(&self) -> i64 {
        let mut lines = 0_i64;
        let mut rows = 0_i64;
        for line in self.text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            lines += 1;
            if gap_cells(line).len() >= 2 || word_cells(line).len() >= 3 {
                rows += 1;
            }
        }

        let penalty = if is_garbled(&self.text) {
            GARBLED_PENALTY
        } else {
            0
        };
        rows * ROW_WEIGHT + lines - penalty
    }
}

fn best_reading(readings: Vec<Reading>) -> Option<Reading> {
    readings.into_iter().max_by_key(Reading::score)
}

/// Splits layout-engine output on form feeds, one entry per page.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages = text.split(FORM_FEED).map(str::to_string).collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn push_operands(line: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => line.push_str(&decode_string(encoding, bytes)),
            Object::Array(items) => {
                push_operands(line, encoding, items);
                line.push(' ');
            }
            Object::Integer(kern) if *kern < -100 => line.push(' '),
            _ => {}
        }
    }
}

/// One line per positioning operator, in content-stream order.
fn content_stream_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = Content::decode(&document.get_page_content(page_id).ok()?).ok()?;
    let fonts = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut encoding = None;
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                    .and_then(|name| fonts.get(name).copied());
            }
            "Tj" | "TJ" | "'" | "\"" => push_operands(&mut line, encoding, &operation.operands),
            "T*" | "Td" | "TD" | "Tm" | "ET" if !line.trim().is_empty() => {
                lines.push(std::mem::take(&mut line));
            }
            _ => {}
        }
    }
    if !line.trim().is_empty() {
        lines.push(line);
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn layout_engine_pages(loaded: &LoadedDocument) -> Result<Option<Vec<String>>, ExtractError> {
    let extracted = guard(BackendKind::TextLayout, "pdf-extract", || {
        pdf_extract::extract_text_from_mem(&loaded.bytes)
    })?;

    let text = match extracted {
        Ok(text) => text,
        Err(error) => {
            debug!(%error, "pdf-extract could not read the document");
            return Ok(None);
        }
    };

    let pages = split_pages(&text);
    let expected = loaded.document.get_pages().len();
    if pages.len() != expected {
        debug!(
            found = pages.len(),
            expected, "pdf-extract page split does not match the page tree"
        );
        return Ok(None);
    }
    Ok(Some(pages))
}

/// Reads the text of each selected page.
pub(crate) fn read_page_texts(
    loaded: &LoadedDocument,
    selected: &[(u32, ObjectId)],
) -> Result<Vec<PageText>, ExtractError> {
    let backend = BackendKind::TextLayout;
    let engine_pages = layout_engine_pages(loaded)?;

    let mut pages = Vec::with_capacity(selected.len());
    for &(page_number, page_id) in selected {
        let mut readings = Vec::with_capacity(3);

        let engine_text = usize::try_from(page_number)
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| engine_pages.as_ref()?.get(index).cloned());
        readings.extend(engine_text.map(|text| Reading {
            source: Source::LayoutEngine,
            text,
        }));

        let stream_text = guard(backend, "content stream reader", || {
            content_stream_text(&loaded.document, page_id)
        })?;
        readings.extend(stream_text.map(|text| Reading {
            source: Source::ContentStream,
            text,
        }));

        let plain_text = guard(backend, "lopdf text extraction", || {
            loaded.document.extract_text(&[page_number])
        })?;
        readings.extend(plain_text.ok().map(|text| Reading {
            source: Source::PlainText,
            text,
        }));

        readings.retain(|reading| !reading.text.trim().is_empty());
        let text = match best_reading(readings) {
            Some(reading) => {
                debug!(page = page_number, source = ?reading.source, "page text selected");
                reading.text
            }
            None => String::new(),
        };
        pages.push(PageText { page_number, text });
    }

    Ok(pages)
}
