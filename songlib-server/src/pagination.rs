//! Page-window computation for verse retrieval
//!
//! Verses are addressed by their 1-based `verse_number`, so a page maps to a
//! closed range of verse numbers instead of a LIMIT/OFFSET pair.

use songlib_common::{Error, Result};

/// Inclusive verse-number range covered by one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Requested page (1-indexed)
    pub page: i64,
    /// Verses per page
    pub limit: i64,
    /// First verse number on the page
    pub first_verse: i64,
    /// Last verse number on the page
    pub last_verse: i64,
}

/// Calculate the verse window for `page` with `limit` verses per page
///
/// # Examples
/// ```
/// use songlib_server::pagination::page_window;
///
/// let w = page_window(2, 2).unwrap();
/// assert_eq!((w.first_verse, w.last_verse), (3, 4));
///
/// // Pages and limits start at 1
/// assert!(page_window(0, 10).is_err());
/// ```
pub fn page_window(page: i64, limit: i64) -> Result<PageWindow> {
    if page < 1 {
        return Err(Error::InvalidInput(format!("page must be at least 1, got {}", page)));
    }
    if limit < 1 {
        return Err(Error::InvalidInput(format!("limit must be at least 1, got {}", limit)));
    }

    let last_verse = page.checked_mul(limit).ok_or_else(|| {
        Error::InvalidInput(format!("page {} with limit {} is out of range", page, limit))
    })?;
    let first_verse = last_verse - limit + 1;

    Ok(PageWindow {
        page,
        limit,
        first_verse,
        last_verse,
    })
}
