//! Text fragments and ruling lines of one page, read from its content stream.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::text_decode::decode_string;

/// Average glyph advance as a fraction of the font size. Font metrics are not
/// read, so fragment widths are estimates.
const AVG_GLYPH_WIDTH: f64 = 0.5;
const AXIS_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    pub(crate) const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = operands.iter().map(number).collect::<Option<Vec<_>>>()?;
        match values.as_slice() {
            &[a, b, c, d, e, f] => Some(Self { a, b, c, d, e, f }),
            _ => None,
        }
    }

    fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn scale(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub(crate) fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub(crate) fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextFragment {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub size: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    Horizontal,
    Vertical,
}

// `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Edge {
    pub orientation: Orientation,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Edge {
    fn from_segment(start: (f64, f64), end: (f64, f64)) -> Option<Self> {
        let (x0, x1) = (start.0.min(end.0), start.0.max(end.0));
        let (y0, y1) = (start.1.min(end.1), start.1.max(end.1));
        if y1 - y0 <= AXIS_TOLERANCE && x1 - x0 > AXIS_TOLERANCE {
            let y = (y0 + y1) / 2.0;
            Some(Self {
                orientation: Orientation::Horizontal,
                x0,
                y0: y,
                x1,
                y1: y,
            })
        } else if x1 - x0 <= AXIS_TOLERANCE && y1 - y0 > AXIS_TOLERANCE {
            let x = (x0 + x1) / 2.0;
            Some(Self {
                orientation: Orientation::Vertical,
                x0: x,
                y0,
                x1: x,
                y1,
            })
        } else {
            None
        }
    }

    pub(crate) fn length(&self) -> f64 {
        (self.x1 - self.x0).max(self.y1 - self.y0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GridTable {
    pub bbox: BBox,
    pub width: usize,
    pub rows: Vec<Vec<Option<String>>>,
}

pub(crate) fn sort_tables(tables: &mut [GridTable]) {
    tables.sort_by(|a, b| {
        b.bbox
            .y1
            .total_cmp(&a.bbox.y1)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct PageObjects {
    pub fragments: Vec<TextFragment>,
    pub edges: Vec<Edge>,
}

struct TextState<'a> {
    matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
    encoding: Option<&'a str>,
}

impl TextState<'_> {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.move_line(0.0, -leading);
    }
}

struct PathBuilder {
    subpaths: Vec<Vec<(f64, f64)>>,
}

impl PathBuilder {
    fn move_to(&mut self, point: (f64, f64)) {
        self.subpaths.push(vec![point]);
    }

    fn line_to(&mut self, point: (f64, f64)) {
        match self.subpaths.last_mut() {
            Some(subpath) => subpath.push(point),
            None => self.subpaths.push(vec![point]),
        }
    }

    fn close(&mut self) {
        if let Some(subpath) = self.subpaths.last_mut() {
            if let Some(&first) = subpath.first() {
                subpath.push(first);
            }
        }
    }

    fn drain_edges(&mut self, edges: &mut Vec<Edge>) {
        for subpath in self.subpaths.drain(..) {
            edges.extend(
                subpath
                    .windows(2)
                    .filter_map(|pair| Edge::from_segment(pair[0], pair[1])),
            );
        }
    }
}

fn show_text(
    text_state: &mut TextState<'_>,
    ctm: &Matrix,
    operands: &[Object],
    fragments: &mut Vec<TextFragment>,
) {
    fn collect(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => text.push_str(&decode_string(encoding, bytes)),
                Object::Array(items) => collect(text, encoding, items),
                Object::Integer(value) if *value < -100 => text.push(' '),
                Object::Real(value) if *value < -100.0 => text.push(' '),
                _ => {}
            }
        }
    }

    let mut text = String::new();
    collect(&mut text, text_state.encoding, operands);
    if text.is_empty() {
        return;
    }

    let device = text_state.matrix.then(ctm);
    let (x, y) = device.apply(0.0, 0.0);
    #[allow(clippy::cast_precision_loss)]
    let advance = text.chars().count() as f64 * text_state.font_size * AVG_GLYPH_WIDTH;
    let scale = device.scale();

    text_state.matrix = Matrix::translate(advance, 0.0).then(&text_state.matrix);
    if text.trim().is_empty() {
        return;
    }
    fragments.push(TextFragment {
        x,
        y,
        width: advance * scale,
        size: text_state.font_size * scale,
        text,
    });
}

/// `None` when the content stream cannot be decoded.
pub(crate) fn read_page_objects(document: &Document, page_id: ObjectId) -> Option<PageObjects> {
    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut objects = PageObjects::default();
    let mut ctm = Matrix::IDENTITY;
    let mut ctm_stack = Vec::new();
    let mut path = PathBuilder {
        subpaths: Vec::new(),
    };
    let mut text_state = TextState {
        matrix: Matrix::IDENTITY,
        line_matrix: Matrix::IDENTITY,
        font_size: 0.0,
        leading: 0.0,
        encoding: None,
    };

    for operation in &content.operations {
        let operands = operation.operands.as_slice();
        let num = |index: usize| operands.get(index).and_then(number);
        match operation.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => ctm = ctm_stack.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    ctm = matrix.then(&ctm);
                }
            }
            "m" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    path.move_to(ctm.apply(x, y));
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    path.line_to(ctm.apply(x, y));
                }
            }
            // Curves are never ruling lines; restart the subpath at the end point.
            "c" | "v" | "y" => {
                let last = operands.len();
                let (x, y) = (num(last.saturating_sub(2)), num(last.saturating_sub(1)));
                if let (Some(x), Some(y)) = (x, y) {
                    path.move_to(ctm.apply(x, y));
                }
            }
            "re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) = (num(0), num(1), num(2), num(3)) {
                    path.move_to(ctm.apply(x, y));
                    path.line_to(ctm.apply(x + w, y));
                    path.line_to(ctm.apply(x + w, y + h));
                    path.line_to(ctm.apply(x, y + h));
                    path.close();
                }
            }
            "h" => path.close(),
            "s" | "b" | "b*" => {
                path.close();
                path.drain_edges(&mut objects.edges);
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => path.drain_edges(&mut objects.edges),
            "n" => path.subpaths.clear(),
            "BT" => {
                text_state.matrix = Matrix::IDENTITY;
                text_state.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    text_state.encoding = encodings.get(font_name).copied();
                }
                if let Some(size) = num(1) {
                    text_state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = num(0) {
                    text_state.leading = leading;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    text_state.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    text_state.leading = -ty;
                    text_state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    text_state.matrix = matrix;
                    text_state.line_matrix = matrix;
                }
            }
            "T*" => text_state.next_line(),
            "Tj" | "TJ" => show_text(&mut text_state, &ctm, operands, &mut objects.fragments),
            "'" => {
                text_state.next_line();
                show_text(&mut text_state, &ctm, operands, &mut objects.fragments);
            }
            "\"" => {
                text_state.next_line();
                show_text(
                    &mut text_state,
                    &ctm,
                    operands.get(2..).unwrap_or_default(),
                    &mut objects.fragments,
                );
            }
            _ => {}
        }
    }

    Some(objects)
}
