//! Page-number pagination shared by the list views.
//!
//! Pages are 1-indexed. An empty result set still has one (empty) page, and
//! the literal `last` selects the final page. Any other out of range or
//! non-numeric page is reported as `NotFound`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// `?page=` query parameter
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number (1-based) or "last"
    pub page: Option<String>,
}

/// A requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(usize),
    Last,
}

impl PageQuery {
    pub fn number(&self) -> AppResult<PageNumber> {
        match self.page.as_deref() {
            None | Some("") => Ok(PageNumber::Number(1)),
            Some("last") => Ok(PageNumber::Last),
            Some(raw) => raw.parse::<usize>().map(PageNumber::Number).map_err(|_| {
                AppError::NotFound("Page is not 'last', nor can it be converted to an int".to_string())
            }),
        }
    }
}

/// Pagination metadata returned next to every paginated list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    /// Current page (1-based)
    pub number: usize,
    pub num_pages: usize,
    /// Total number of objects across all pages
    pub count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    /// Number of objects preceding this page
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    /// Number of objects on this page
    pub fn len(&self) -> usize {
        self.count.saturating_sub(self.offset()).min(self.per_page)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits `count` objects into pages of `per_page`
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Validate a page number against the object count
    pub fn page(&self, number: PageNumber) -> AppResult<PageMeta> {
        let num_pages = self.num_pages();
        let number = match number {
            PageNumber::Last => num_pages,
            PageNumber::Number(0) => {
                return Err(AppError::NotFound("That page number is less than 1".to_string()))
            }
            PageNumber::Number(n) if n > num_pages => {
                return Err(AppError::NotFound("That page contains no results".to_string()))
            }
            PageNumber::Number(n) => n,
        };

        Ok(PageMeta {
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
        })
    }
}

/// Paginate an already materialised list
pub fn paginate<T>(items: Vec<T>, per_page: usize, number: PageNumber) -> AppResult<(Vec<T>, PageMeta)> {
    let meta = Paginator::new(items.len(), per_page).page(number)?;
    let page = items.into_iter().skip(meta.offset()).take(meta.per_page).collect();
    Ok((page, meta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: &str) -> PageQuery {
        PageQuery { page: Some(page.to_string()) }
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(PageQuery::default().number().unwrap(), PageNumber::Number(1));
        assert_eq!(query("last").number().unwrap(), PageNumber::Last);
        assert_eq!(query("3").number().unwrap(), PageNumber::Number(3));
        assert!(matches!(query("abc").number(), Err(AppError::NotFound(_))));
    }

    #[test]
    fn five_objects_two_per_page() {
        let items: Vec<i32> = (1..=5).collect();

        let (first, meta) = paginate(items.clone(), 2, PageNumber::Number(1)).unwrap();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(meta.num_pages, 3);
        assert!(meta.has_next && !meta.has_previous);

        let (second, _) = paginate(items.clone(), 2, PageNumber::Number(2)).unwrap();
        assert_eq!(second, vec![3, 4]);

        let (last, meta) = paginate(items.clone(), 2, PageNumber::Last).unwrap();
        assert_eq!(last, vec![5]);
        assert_eq!(meta.number, 3);
        assert!(!meta.has_next && meta.has_previous);

        assert!(matches!(
            paginate(items, 2, PageNumber::Number(4)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn empty_list_has_one_empty_page() {
        let (page, meta) = paginate(Vec::<i32>::new(), 10, PageNumber::Number(1)).unwrap();
        assert!(page.is_empty());
        assert_eq!(meta.num_pages, 1);
        assert!(meta.is_empty());
        assert!(paginate(Vec::<i32>::new(), 10, PageNumber::Number(2)).is_err());
    }

    #[test]
    fn page_zero_is_rejected() {
        assert!(Paginator::new(3, 2).page(PageNumber::Number(0)).is_err());
    }

    #[test]
    fn offsets_and_lengths() {
        let meta = Paginator::new(25, 10).page(PageNumber::Number(3)).unwrap();
        assert_eq!(meta.offset(), 20);
        assert_eq!(meta.len(), 5);
    }
}
