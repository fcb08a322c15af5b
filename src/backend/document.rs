use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use lopdf::{Document, ObjectId};

use crate::error::ExtractError;
use crate::model::BackendKind;
use crate::pages::PageSet;

pub(crate) struct LoadedDocument {
    #[cfg_attr(not(feature = "text-layout"), allow(dead_code))]
    pub bytes: Vec<u8>,
    pub document: Document,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs PDF library code that is known to panic on some inputs.
pub(crate) fn guard<T>(
    backend: BackendKind,
    what: &str,
    work: impl FnOnce() -> T,
) -> Result<T, ExtractError> {
    catch_unwind(AssertUnwindSafe(work)).map_err(|payload| {
        ExtractError::extraction(
            backend,
            format!("{what} panicked: {}", panic_message(payload.as_ref())),
        )
    })
}

pub(crate) fn load_document(
    path: &Path,
    backend: BackendKind,
) -> Result<LoadedDocument, ExtractError> {
    let bytes = std::fs::read(path).map_err(|error| {
        ExtractError::extraction(backend, format!("failed to read '{}': {error}", path.display()))
    })?;
    let document = guard(backend, "PDF parser", || Document::load_mem(&bytes))?.map_err(
        |error| ExtractError::extraction(backend, format!("failed to load PDF: {error}")),
    )?;

    Ok(LoadedDocument { bytes, document })
}

/// Page numbers and object ids of the selected pages, in page order.
pub(crate) fn selected_pages(
    document: &Document,
    pages: &PageSet,
    backend: BackendKind,
) -> Result<Vec<(u32, ObjectId)>, ExtractError> {
    let selected = document
        .get_pages()
        .into_iter()
        .filter(|(page_no, _)| pages.contains(*page_no))
        .collect::<Vec<_>>();

    if selected.is_empty() {
        return Err(ExtractError::extraction(
            backend,
            "no pages available after applying selection",
        ));
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::guard;
    use crate::error::ExtractError;
    use crate::model::BackendKind;

    #[test]
    fn guard_turns_panics_into_extraction_errors() {
        let result: Result<(), ExtractError> =
            guard(BackendKind::Geometry, "parser", || panic!("bad font"));
        let err = result.expect_err("panic should be caught");
        assert!(err.to_string().contains("parser panicked: bad font"));
    }

    #[test]
    fn guard_passes_values_through() {
        let value = guard(BackendKind::TextLayout, "parser", || 7).expect("no panic");
        assert_eq!(value, 7);
    }
}
