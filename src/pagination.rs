//! Pagination driver for list endpoints.

use crate::error::{Error, Result};
use crate::response::Pagination;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Items requested per page
pub const PAGE_SIZE: u32 = 500;

/// One page of a list response
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a list body of the shape
    /// `{"pagination": {...}, "<collection>": {"<item>": [...]}}`.
    ///
    /// A missing collection or item array is an empty page (the server omits
    /// them when there is nothing to list).
    pub fn from_value(mut body: Value, collection: &str, item: &str) -> Result<Self> {
        let pagination = match body.get_mut("pagination").map(Value::take) {
            Some(value) => serde_json::from_value(value).map_err(Error::Unmarshal)?,
            None => Pagination::default(),
        };

        let items = match body
            .get_mut(collection)
            .and_then(|c| c.get_mut(item))
            .map(Value::take)
        {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(Error::Unmarshal)?,
        };

        Ok(Page { items, pagination })
    }
}

/// Fetch every page and concatenate the items in server order.
///
/// `fetch` receives the 1-based page number and the page size. Pages are
/// requested in increasing order until `page_number * page_size` covers the
/// total the server reports. The first error aborts and is returned; items
/// collected so far are dropped.
pub fn paginate<T, F>(page_size: u32, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32, u32) -> Result<Page<T>>,
{
    let page_size = page_size.max(1);
    let mut items = Vec::new();
    let mut page_number: u32 = 1;

    loop {
        let page = fetch(page_number, page_size)?;
        let received = page.items.len();
        items.extend(page.items);

        let covered = u64::from(page_number) * u64::from(page_size);
        if covered >= page.pagination.total_available || received == 0 {
            break;
        }
        page_number += 1;
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn page(range: std::ops::Range<u32>, total: u64) -> Page<u32> {
        Page {
            items: range.collect(),
            pagination: Pagination {
                page_number: 0,
                page_size: 500,
                total_available: total,
            },
        }
    }

    #[test]
    fn test_three_pages_in_order() {
        let mut requested = Vec::new();
        let items = paginate(500, |number, size| {
            requested.push((number, size));
            Ok(match number {
                1 => page(0..500, 1037),
                2 => page(500..1000, 1037),
                3 => page(1000..1037, 1037),
                _ => panic!("page {} should not be requested", number),
            })
        })
        .unwrap();

        assert_eq!(items.len(), 1037);
        assert!(items.iter().enumerate().all(|(i, v)| i as u32 == *v));
        assert_eq!(requested, vec![(1, 500), (2, 500), (3, 500)]);
    }

    #[test]
    fn test_single_page_when_total_fits() {
        let mut calls = 0;
        let items = paginate(500, |_, _| {
            calls += 1;
            Ok(page(0..500, 500))
        })
        .unwrap();
        assert_eq!(items.len(), 500);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_error_discards_partial_results() {
        let result = paginate(500, |number, _| {
            if number == 2 {
                Err(Error::api(Some(500), "500000".into(), String::new(), String::new()))
            } else {
                Ok(page(0..500, 1500))
            }
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InternalServerError);
    }

    #[test]
    fn test_empty_page_stops() {
        let mut calls = 0;
        let items = paginate(500, |_, _| {
            calls += 1;
            Ok(page(0..0, 10_000))
        })
        .unwrap();
        assert!(items.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_page_from_value() {
        let body = json!({
            "pagination": {"pageNumber": "1", "pageSize": "500", "totalAvailable": "2"},
            "users": {"user": [{"id": "a"}, {"id": "b"}]}
        });
        let page: Page<Value> = Page::from_value(body, "users", "user").unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1]["id"], "b");
        assert_eq!(page.pagination.total_available, 2);
    }

    #[test]
    fn test_page_from_value_missing_collection() {
        let body = json!({
            "pagination": {"pageNumber": "1", "pageSize": "500", "totalAvailable": "0"},
            "users": {}
        });
        let page: Page<Value> = Page::from_value(body, "users", "user").unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_page_from_value_bad_items() {
        let body = json!({"users": {"user": "oops"}});
        let result: Result<Page<Value>> = Page::from_value(body, "users", "user");
        assert!(matches!(result, Err(Error::Unmarshal(_))));
    }
}
