//! Paginated user list fetcher.

use tracing::instrument;

use super::api::LocalJikanApi;
use super::error::FetchError;
use super::types::UserListEntry;

/// First page number of the Jikan user list resource.
const FIRST_PAGE: u32 = 1;

/// Fetches every page of a user's anime list and returns the entries in API
/// order (page 1 entries precede page 2 entries).
///
/// Continues while the pagination descriptor reports `has_next_page`; the
/// number of entries on a page is never used as a continuation signal.
/// Rate limiting is applied by the API client before each request.
///
/// # Errors
///
/// Returns the first page's `FetchError`. The whole sequence is aborted and
/// no partial list is returned.
#[instrument(skip_all, fields(username = username))]
pub async fn fetch_all_entries(
    api: &(impl LocalJikanApi + Sync),
    username: &str,
) -> Result<Vec<UserListEntry>, FetchError> {
    let mut all_entries: Vec<UserListEntry> = Vec::new();
    let mut page = FIRST_PAGE;

    loop {
        tracing::debug!(page = page, "animelist request");

        let list_page = api.user_anime_list_page(username, page).await?;
        let fetched = list_page.entries.len();
        all_entries.extend(list_page.entries);

        tracing::info!(
            page = page,
            fetched = fetched,
            total = all_entries.len(),
            last_visible_page = ?list_page.last_visible_page,
            "animelist page completed"
        );

        if !list_page.has_next_page {
            break;
        }

        let Some(next) = page.checked_add(1) else {
            tracing::warn!(page = page, "page counter overflow, stopping pagination");
            break;
        };
        page = next;
    }

    tracing::info!(pages = page, total = all_entries.len(), "animelist fetch complete");
    Ok(all_entries)
}
