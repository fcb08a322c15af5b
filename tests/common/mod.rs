#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Text placed at an absolute position on the page.
pub struct Placed<'a> {
    pub x: f64,
    pub y: f64,
    pub text: &'a str,
}

pub fn placed(x: f64, y: f64, text: &str) -> Placed<'_> {
    Placed { x, y, text }
}

/// Ruling lines of a grid: every x spans the y range and every y spans the x range.
pub struct Grid<'a> {
    pub xs: &'a [f64],
    pub ys: &'a [f64],
}

fn real(value: f64) -> Object {
    #[allow(clippy::cast_possible_truncation)]
    Object::Real(value as f32)
}

fn save(
    path: &Path,
    pages: Vec<Vec<Operation>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

/// One page per entry, each line written below the previous one.
pub fn create_test_pdf(path: &Path, pages: &[Vec<&str>]) -> Result<(), Box<dyn std::error::Error>> {
    let pages = pages
        .iter()
        .map(|lines| {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("TL", vec![16.into()]),
                Operation::new("Td", vec![50.into(), 780.into()]),
            ];
            for (index, line) in lines.iter().enumerate() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                if index + 1 < lines.len() {
                    operations.push(Operation::new("T*", vec![]));
                }
            }
            operations.push(Operation::new("ET", vec![]));
            operations
        })
        .collect();

    save(path, pages)
}

/// A single page with text at fixed positions and an optional ruled grid.
pub fn create_layout_pdf(
    path: &Path,
    texts: &[Placed<'_>],
    grid: Option<Grid<'_>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut operations = Vec::new();

    if let Some(grid) = grid {
        let (x_min, x_max) = (grid.xs[0], grid.xs[grid.xs.len() - 1]);
        let (y_min, y_max) = (grid.ys[grid.ys.len() - 1], grid.ys[0]);
        operations.push(Operation::new("w", vec![real(0.5)]));
        for &y in grid.ys {
            operations.push(Operation::new("m", vec![real(x_min), real(y)]));
            operations.push(Operation::new("l", vec![real(x_max), real(y)]));
        }
        for &x in grid.xs {
            operations.push(Operation::new("m", vec![real(x), real(y_min)]));
            operations.push(Operation::new("l", vec![real(x), real(y_max)]));
        }
        operations.push(Operation::new("S", vec![]));
    }

    for text in texts {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![real(text.x), real(text.y)]),
            Operation::new("Tj", vec![Object::string_literal(text.text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    save(path, vec![operations])
}
