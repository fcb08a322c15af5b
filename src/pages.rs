use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ExtractError;

/// Pages an extraction run looks at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSet {
    #[default]
    All,
    /// 1-based page numbers, strictly ascending and without duplicates.
    Selected(Vec<u32>),
}

impl PageSet {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        match self {
            Self::All => true,
            Self::Selected(pages) => pages.binary_search(&page).is_ok(),
        }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for PageSet {
    type Err = ExtractError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ExtractError::InvalidPageSpec(
                "page spec cannot be empty".to_string(),
            ));
        }
        if spec.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim) {
            if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(ExtractError::InvalidPageSpec(format!(
                    "'{token}' is not a positive page number"
                )));
            }
            let page: u32 = token.parse().map_err(|_| {
                ExtractError::InvalidPageSpec(format!("page number out of range: '{token}'"))
            })?;
            if page == 0 {
                return Err(ExtractError::InvalidPageSpec(
                    "pages are 1-based".to_string(),
                ));
            }
            pages.insert(page);
        }

        Ok(Self::Selected(pages.into_iter().collect()))
    }
}

/// Parses an optional user page selector; `None` selects every page.
pub fn parse_page_spec(spec: Option<&str>) -> Result<PageSet, ExtractError> {
    spec.map_or(Ok(PageSet::All), PageSet::from_str)
}
