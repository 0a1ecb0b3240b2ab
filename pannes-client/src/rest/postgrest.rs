use std::{collections::HashSet, fmt, time::Duration};

use reqwest::Client;
use url::Url;

use crate::domain::RawReading;
use crate::error::{check_table_name, ClientError};

/// Hosted instances cap a single response at 1000 rows.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Snapshot order: newest first, null dates last, `id` breaking ties.
const SNAPSHOT_ORDER: &str = "date.desc.nullslast,id.desc";

/// Position after the last row of a page, in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub date: Option<String>,
    pub id: i64,
}

impl PageCursor {
    fn after(row: &RawReading) -> Self {
        Self {
            date: row.date.clone(),
            id: row.id,
        }
    }

    /// PostgREST logic filter selecting rows strictly after the cursor.
    fn filter(&self) -> (&'static str, String) {
        match &self.date {
            Some(date) => {
                let date = quote_value(date);
                (
                    "or",
                    format!("(date.lt.{date},and(date.eq.{date},id.lt.{}),date.is.null)", self.id),
                )
            }
            None => ("and", format!("(date.is.null,id.lt.{})", self.id)),
        }
    }
}

/// Values inside logic filters may contain `:` `+` `,`; quote them.
fn quote_value(v: &str) -> String {
    format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Read-only client for the PostgREST endpoint (`/rest/v1`) of the data store.
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    base_url: Url,
    api_key: String,
    page_size: usize,
}

impl fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl PostgrestClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        page_size: usize,
    ) -> Result<Self, ClientError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?.join("rest/v1/")?;

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            page_size: page_size.max(1),
        })
    }

    /// URL of the page following `cursor` (or the first page).
    pub fn page_url(&self, table: &str, cursor: Option<&PageCursor>) -> Result<Url, ClientError> {
        let table = check_table_name(table)?;
        let mut url = self.base_url.join(table)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", "*")
                .append_pair("order", SNAPSHOT_ORDER)
                .append_pair("limit", &self.page_size.to_string());
            if let Some(cursor) = cursor {
                let (key, value) = cursor.filter();
                query.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    async fn fetch_page(&self, table: &str, cursor: Option<&PageCursor>) -> Result<Vec<RawReading>, ClientError> {
        let url = self.page_url(table, cursor)?;
        let resp = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch every row of `table`.
    ///
    /// Pages are keyed on the last `(date, id)` seen, so the server's own row
    /// cap and rows inserted mid-snapshot neither truncate nor duplicate the
    /// result. Paging ends on an empty page, or a page with no unseen `id`.
    pub async fn fetch_all(&self, table: &str) -> Result<Vec<RawReading>, ClientError> {
        let mut rows = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut cursor: Option<PageCursor> = None;

        loop {
            let page = self.fetch_page(table, cursor.as_ref()).await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(PageCursor::after(last));

            let before = rows.len();
            rows.extend(page.into_iter().filter(|row| seen.insert(row.id)));
            if rows.len() == before {
                break;
            }
        }

        Ok(rows)
    }
}
