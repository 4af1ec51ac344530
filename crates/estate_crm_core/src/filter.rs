//! crates/estate_crm_core/src/filter.rs
//!
//! Pure filtering and pagination over opportunity lists.

use serde::{Deserialize, Serialize};

use crate::domain::{Opportunity, OpportunityStatus, OpportunityType};

//=========================================================================================
// Filter spec
//=========================================================================================

/// Categorical filters plus a free-text search term. Empty/None fields match
/// everything; the filter is pure and preserves input order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityFilter {
    pub search: Option<String>,
    pub kind: Option<OpportunityType>,
    pub status: Option<OpportunityStatus>,
    #[serde(default)]
    pub regions: Vec<String>,
}

impl OpportunityFilter {
    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !term.is_empty()
                && !opportunity.title.to_lowercase().contains(&term)
                && !opportunity.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if opportunity.kind != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if opportunity.status != status {
                return false;
            }
        }
        if !self.regions.is_empty()
            && !self
                .regions
                .iter()
                .any(|r| r == &opportunity.region || r == &opportunity.location)
        {
            return false;
        }
        true
    }

    /// Applies the filter, keeping input order.
    pub fn apply(&self, items: &[Opportunity]) -> Vec<Opportunity> {
        items.iter().filter(|o| self.matches(o)).cloned().collect()
    }
}

//=========================================================================================
// Pagination
//=========================================================================================

/// Allowed page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    Twelve,
    TwentyFour,
    ThirtySix,
    FortyEight,
    Sixty,
}

impl PageSize {
    pub const DEFAULT: PageSize = PageSize::TwentyFour;

    pub fn as_usize(self) -> usize {
        match self {
            PageSize::Twelve => 12,
            PageSize::TwentyFour => 24,
            PageSize::ThirtySix => 36,
            PageSize::FortyEight => 48,
            PageSize::Sixty => 60,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            12 => Ok(PageSize::Twelve),
            24 => Ok(PageSize::TwentyFour),
            36 => Ok(PageSize::ThirtySix),
            48 => Ok(PageSize::FortyEight),
            60 => Ok(PageSize::Sixty),
            other => Err(format!("invalid page size {other}, expected 12/24/36/48/60")),
        }
    }
}

impl From<PageSize> for usize {
    fn from(value: PageSize) -> usize {
        value.as_usize()
    }
}

/// One page of a filtered list.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slices one page out of `items`. The requested page is clamped to
/// `[1, max(1, total_pages)]`, so a filter change that shrinks the list can
/// never leave the caller stranded on an empty page.
pub fn paginate<T: Clone>(items: &[T], requested_page: usize, size: PageSize) -> Page<T> {
    let page_size = size.as_usize();
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = requested_page.clamp(1, total_pages.max(1));
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let items = if start < total_items {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{GenerationSpec, OpportunityGenerator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_opportunities() -> Vec<Opportunity> {
        let mut rng = StdRng::seed_from_u64(7);
        let generator = OpportunityGenerator::default();
        generator.generate(&mut rng, &GenerationSpec::default())
    }

    #[test]
    fn applying_the_same_filter_twice_is_idempotent() {
        let items = sample_opportunities();
        let filter = OpportunityFilter {
            search: Some("villa".to_string()),
            kind: Some(OpportunityType::Property),
            ..Default::default()
        };
        let once = filter.apply(&items);
        let twice = filter.apply(&once);
        assert_eq!(once.len(), twice.len());
        let ids_once: Vec<_> = once.iter().map(|o| o.id).collect();
        let ids_twice: Vec<_> = twice.iter().map(|o| o.id).collect();
        assert_eq!(ids_once, ids_twice);
    }

    #[test]
    fn filter_preserves_input_order() {
        let items = sample_opportunities();
        let filter = OpportunityFilter {
            kind: Some(OpportunityType::Lead),
            ..Default::default()
        };
        let filtered = filter.apply(&items);
        let expected: Vec<_> = items
            .iter()
            .filter(|o| o.kind == OpportunityType::Lead)
            .map(|o| o.id)
            .collect();
        let got: Vec<_> = filtered.iter().map(|o| o.id).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn pages_concatenate_to_the_filtered_list() {
        let items: Vec<u32> = (0..55).collect();
        let size = PageSize::Twelve;
        let total_pages = paginate(&items, 1, size).total_pages;
        assert_eq!(total_pages, 5); // ceil(55 / 12)

        let mut rebuilt = Vec::new();
        for page in 1..=total_pages {
            let slice = paginate(&items, page, size);
            assert!(slice.items.len() <= size.as_usize());
            rebuilt.extend(slice.items);
        }
        assert_eq!(rebuilt, items);
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let items: Vec<u32> = (0..30).collect();
        let page = paginate(&items, 99, PageSize::TwentyFour);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 6);

        let first = paginate(&items, 0, PageSize::TwentyFour);
        assert_eq!(first.page, 1);
    }

    #[test]
    fn empty_list_yields_a_single_empty_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 3, PageSize::Sixty);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn rejects_page_sizes_outside_the_menu() {
        assert!(PageSize::try_from(24).is_ok());
        assert!(PageSize::try_from(25).is_err());
        assert!(PageSize::try_from(0).is_err());
    }
}
