use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use pdf_table_extract::{
    AttemptOutcome, BackendKind, ExtractError, ExtractionConfig, Flavor, Method, Orchestrator,
    PageSet, RawCell, RawTable, TableBackend,
};
use pretty_assertions::assert_eq;

enum Script {
    Tables(Vec<RawTable>),
    Unavailable,
    Fails,
}

struct Scripted {
    kind: BackendKind,
    script: Script,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(kind: BackendKind, script: Script) -> Self {
        Self {
            kind,
            script,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TableBackend for Scripted {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn detect(
        &self,
        _document: &Path,
        _pages: &PageSet,
        _flavor: Option<Flavor>,
    ) -> Result<Vec<RawTable>, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Tables(tables) => Ok(tables.clone()),
            Script::Unavailable => Err(ExtractError::BackendUnavailable {
                backend: self.kind,
                reason: "runtime missing".to_string(),
            }),
            Script::Fails => Err(ExtractError::BackendExtraction {
                backend: self.kind,
                message: "corrupt xref".to_string(),
            }),
        }
    }
}

fn table(page: u32, label: &str) -> RawTable {
    RawTable::new(
        page,
        vec![
            vec!["Item".into(), "Amount".into()],
            vec![label.into(), RawCell::Number(12.0)],
        ],
    )
}

fn config(method: Method) -> ExtractionConfig {
    ExtractionConfig::new("budget.pdf").with_method(method)
}

#[test]
fn auto_falls_back_when_primary_errors() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Fails);
    let secondary = Scripted::new(
        BackendKind::Geometry,
        Script::Tables(vec![table(1, "a"), table(2, "b")]),
    );

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("fallback should succeed");

    assert!(result.is_success());
    assert_eq!(result.backend, Some(BackendKind::Geometry));
    assert_eq!(result.table_count(), 2);
    assert!(result.tables.iter().all(|t| t.origin == BackendKind::Geometry));
    assert_eq!(result.attempts.len(), 2);
    assert!(result.attempts[0].is_error());
    assert_eq!(result.attempts[1].outcome, AttemptOutcome::Tables(2));
}

#[test]
fn auto_stops_after_primary_finds_a_table() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Tables(vec![table(1, "a")]));
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(vec![table(1, "b")]));

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("run should succeed");

    assert_eq!(result.backend, Some(BackendKind::TextLayout));
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 0);
}

#[test]
fn auto_falls_back_when_primary_is_unavailable() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Unavailable);
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(vec![table(3, "a")]));

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("fallback should succeed");

    assert_eq!(result.backend, Some(BackendKind::Geometry));
    assert_eq!(result.tables[0].page, 3);
}

#[test]
fn explicit_method_never_falls_back() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Unavailable);
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(vec![table(1, "a")]));

    let err = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::TextLayout))
        .expect_err("unavailable back-end should surface");

    assert!(matches!(
        err,
        ExtractError::BackendUnavailable {
            backend: BackendKind::TextLayout,
            ..
        }
    ));
    assert_eq!(secondary.calls(), 0);
}

#[test]
fn explicit_method_without_tables_is_unsuccessful_not_an_error() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Tables(Vec::new()));
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(vec![table(1, "a")]));

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::TextLayout).with_pages("2".parse().expect("valid pages")))
        .expect("empty run is not an error");

    assert!(!result.is_success());
    assert_eq!(result.backend, None);
    assert_eq!(secondary.calls(), 0);
}

#[test]
fn auto_with_both_back_ends_empty_is_unsuccessful() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Tables(Vec::new()));
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(Vec::new()));

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("empty run is not an error");

    assert!(!result.is_success());
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[test]
fn auto_surfaces_geometry_error_when_nothing_could_run() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Unavailable);
    let secondary = Scripted::new(BackendKind::Geometry, Script::Fails);

    let err = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect_err("both back-ends failed");

    assert!(matches!(
        err,
        ExtractError::BackendExtraction {
            backend: BackendKind::Geometry,
            ..
        }
    ));
}

#[test]
fn auto_geometry_error_after_empty_text_layout_is_unsuccessful() {
    let primary = Scripted::new(BackendKind::TextLayout, Script::Tables(Vec::new()));
    let secondary = Scripted::new(BackendKind::Geometry, Script::Fails);

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("text-layout ran cleanly");

    assert!(!result.is_success());
    assert_eq!(result.attempts.len(), 2);
}

#[test]
fn empty_raw_tables_do_not_count_as_found() {
    let primary = Scripted::new(
        BackendKind::TextLayout,
        Script::Tables(vec![RawTable::new(1, Vec::new())]),
    );
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(vec![table(1, "a")]));

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("fallback should succeed");

    assert_eq!(result.backend, Some(BackendKind::Geometry));
    assert_eq!(secondary.calls(), 1);
}

#[test]
fn malformed_raw_table_always_surfaces() {
    let ragged = RawTable::new(1, vec![vec!["a".into(), "b".into()], vec!["c".into()]])
        .with_grid_width(2);
    let primary = Scripted::new(BackendKind::TextLayout, Script::Tables(vec![ragged]));
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(vec![table(1, "a")]));

    let err = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect_err("malformed table should surface");

    assert!(matches!(err, ExtractError::MalformedRawTable { page: 1, .. }));
    assert_eq!(secondary.calls(), 0);
}

#[test]
fn tables_are_sorted_by_page_then_extraction_order() {
    let primary = Scripted::new(
        BackendKind::TextLayout,
        Script::Tables(vec![table(3, "late"), table(1, "first"), table(1, "second")]),
    );
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(Vec::new()));

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("run should succeed");

    let order = result
        .tables
        .iter()
        .map(|t| (t.page, t.index, t.rows[1][0].as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![(1, 1, "first"), (1, 2, "second"), (3, 0, "late")]
    );
    assert_eq!(result.tables[0].rows[1][1], "12");
}

#[test]
fn dropped_empty_tables_leave_gaps_in_extraction_order() {
    let primary = Scripted::new(
        BackendKind::TextLayout,
        Script::Tables(vec![RawTable::new(1, Vec::new()), table(1, "a")]),
    );
    let secondary = Scripted::new(BackendKind::Geometry, Script::Tables(Vec::new()));

    let result = Orchestrator::new(&primary, &secondary)
        .run(&config(Method::Auto))
        .expect("run should succeed");

    assert_eq!(result.table_count(), 1);
    assert_eq!(result.tables[0].index, 1);
}
