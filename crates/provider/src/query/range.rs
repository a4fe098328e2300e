//! Page-to-row-range conversion.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::types::Pagination;

/// A 0-based row range with an inclusive upper bound.
///
/// Page 1 of size 10 is rows `0..=9`, page 2 is `10..=19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    /// First row index.
    pub from: u64,
    /// Last row index, inclusive.
    pub to: u64,
}

impl RowRange {
    /// Computes the range for a 1-based page.
    pub fn for_page(page: u64, per_page: u64) -> Result<Self, RequestError> {
        if page == 0 || per_page == 0 {
            return Err(RequestError::InvalidPagination { page, per_page });
        }

        let overflow = || RequestError::PaginationOverflow { page, per_page };
        let from = (page - 1).checked_mul(per_page).ok_or_else(overflow)?;
        let to = from.checked_add(per_page - 1).ok_or_else(overflow)?;

        Ok(Self { from, to })
    }

    /// Computes the range for the given pagination.
    pub fn from_pagination(pagination: &Pagination) -> Result<Self, RequestError> {
        Self::for_page(pagination.page, pagination.per_page)
    }

    /// Number of rows covered. Always at least 1.
    pub fn row_count(&self) -> u64 {
        self.to - self.from + 1
    }

    /// Returns true if `index` falls inside the range.
    pub fn contains(&self, index: u64) -> bool {
        (self.from..=self.to).contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_first_and_second_page() {
        let first = RowRange::for_page(1, 10).unwrap();
        assert_eq!(first, RowRange { from: 0, to: 9 });
        assert_eq!(first.row_count(), 10);

        let second = RowRange::for_page(2, 10).unwrap();
        assert_eq!(second, RowRange { from: 10, to: 19 });
        assert!(!first.contains(10));
        assert!(second.contains(10));
    }

    #[test]
    fn test_single_row_pages() {
        assert_eq!(RowRange::for_page(1, 1).unwrap(), RowRange { from: 0, to: 0 });
        assert_eq!(RowRange::for_page(3, 1).unwrap(), RowRange { from: 2, to: 2 });
    }

    #[test]
    fn test_zero_page_or_size_rejected() {
        assert_eq!(
            RowRange::for_page(0, 10),
            Err(RequestError::InvalidPagination {
                page: 0,
                per_page: 10
            })
        );
        assert!(RowRange::for_page(1, 0).is_err());
    }

    #[test]
    fn test_overflow_rejected() {
        assert_eq!(
            RowRange::for_page(u64::MAX, 2),
            Err(RequestError::PaginationOverflow {
                page: u64::MAX,
                per_page: 2
            })
        );
    }

    proptest! {
        #[test]
        fn prop_range_has_per_page_rows(page in 1u64..10_000, per_page in 1u64..1_000) {
            let range = RowRange::for_page(page, per_page).unwrap();
            prop_assert_eq!(range.from, (page - 1) * per_page);
            prop_assert_eq!(range.row_count(), per_page);
        }

        #[test]
        fn prop_consecutive_pages_are_contiguous(page in 1u64..10_000, per_page in 1u64..1_000) {
            let current = RowRange::for_page(page, per_page).unwrap();
            let next = RowRange::for_page(page + 1, per_page).unwrap();
            prop_assert_eq!(next.from, current.to + 1);
        }
    }
}
