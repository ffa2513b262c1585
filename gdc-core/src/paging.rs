//! Offset/limit page walker for APIs that page with `offset`/`limit`
//! query parameters and report a `paging.totalCount` (as opposed to APIs
//! with next-page links).

use crate::error::ApiError;
use crate::transport::{RequestSettings, Transport};
use serde_json::Value;

const PAGE_LIMIT: usize = 100;

/// Fetch every page of `uri` and concatenate the items found under
/// `<item_key>.items` in page order.
///
/// Fetching stops once the next offset passes the reported
/// `paging.totalCount`, or as soon as a page carries no item list.
pub async fn fetch_all_pages(
    transport: &Transport,
    uri: &str,
    item_key: &str,
) -> Result<Vec<Value>, ApiError> {
    let mut offset: usize = 0;
    let mut items = vec![];

    loop {
        let page_uri = format!("{uri}?offset={offset}&limit={PAGE_LIMIT}");
        let response = transport.get(&page_uri, RequestSettings::new()).await?;
        let data = response.data();

        let container = data.get(item_key);
        let Some(page_items) = container
            .and_then(|c| c.get("items"))
            .and_then(Value::as_array)
        else {
            break;
        };
        items.extend(page_items.iter().cloned());

        let total_count = container
            .and_then(|c| c.get("paging"))
            .and_then(|p| p.get("totalCount"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        offset += PAGE_LIMIT;
        if offset as u64 > total_count {
            break;
        }
    }

    Ok(items)
}
