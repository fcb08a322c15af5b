use crate::error::ExtractError;
use crate::model::BackendKind;
use crate::options::Flavor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Tables(usize),
    NoTables,
    Unavailable(String),
    Failed(String),
}

/// One back-end invocation made while producing an `ExtractionResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAttempt {
    pub backend: BackendKind,
    pub flavor: Option<Flavor>,
    pub outcome: AttemptOutcome,
}

impl BackendAttempt {
    #[must_use]
    pub fn new(backend: BackendKind, outcome: AttemptOutcome) -> Self {
        Self {
            backend,
            flavor: None,
            outcome,
        }
    }

    #[must_use]
    pub fn with_flavor(mut self, flavor: Option<Flavor>) -> Self {
        self.flavor = flavor;
        self
    }

    pub(crate) fn from_error(backend: BackendKind, error: &ExtractError) -> Self {
        let outcome = match error {
            ExtractError::BackendUnavailable { reason, .. } => {
                AttemptOutcome::Unavailable(reason.clone())
            }
            other => AttemptOutcome::Failed(other.to_string()),
        };
        Self::new(backend, outcome)
    }

    pub(crate) fn from_count(backend: BackendKind, count: usize) -> Self {
        let outcome = if count == 0 {
            AttemptOutcome::NoTables
        } else {
            AttemptOutcome::Tables(count)
        };
        Self::new(backend, outcome)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self.outcome,
            AttemptOutcome::Unavailable(_) | AttemptOutcome::Failed(_)
        )
    }
}
