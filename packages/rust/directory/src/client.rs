//! Snipe-IT REST client.

use std::time::Duration;

use checkio_shared::{CheckIoError, DirectoryConfig, Result, resolve_api_token};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use crate::AssetDirectory;
use crate::types::{ActionOutcome, Category, HardwarePage, HardwareQuery, User, messages_text};

/// User-Agent string for directory requests.
const USER_AGENT: &str = concat!("CheckIO/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a non-JSON error body carried into an error message.
const MAX_ERROR_BODY: usize = 200;

/// Upper bound on users returned by an employee-number search.
const USER_SEARCH_LIMIT: u32 = 50;

/// `{"total": n, "rows": [...]}` listing envelope.
#[derive(Debug, Deserialize)]
struct Listing<T> {
    #[serde(default = "Vec::new")]
    rows: Vec<T>,
}

/// HTTP client for a Snipe-IT `/api/v1` root.
#[derive(Debug, Clone)]
pub struct SnipeItClient {
    client: Client,
    base_url: Url,
}

impl SnipeItClient {
    /// Build a client for `config` authenticating with `token`.
    pub fn new(config: &DirectoryConfig, token: &str) -> Result<Self> {
        let base_url = config.parsed_base_url()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| CheckIoError::config("API token contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CheckIoError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Build a client reading the token from the env var named in `config`.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self> {
        let token = resolve_api_token(config)?;
        Self::new(config, &token)
    }

    /// Resolve path segments under the API root, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CheckIoError::config(format!("base URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        read_json(&url, response).await
    }

    async fn post_json(&self, url: Url, body: &Value) -> Result<Value> {
        debug!(%url, "POST");
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        read_json(&url, response).await
    }

    async fn get_listing<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let body = self.get_json(url.clone()).await?;
        reject_error_envelope(&body)?;
        let listing: Listing<T> = serde_json::from_value(body).map_err(|e| {
            CheckIoError::upstream(200, format!("{url}: unexpected listing shape: {e}"))
        })?;
        Ok(listing.rows)
    }
}

impl AssetDirectory for SnipeItClient {
    #[instrument(skip_all)]
    async fn verify(&self) -> Result<()> {
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut().append_pair("limit", "1");
        let body = self.get_json(url).await?;
        reject_error_envelope(&body)
    }

    #[instrument(skip_all, fields(category_id = %query.category_id))]
    async fn list_hardware_by_category(&self, query: &HardwareQuery) -> Result<HardwarePage> {
        let mut url = self.endpoint(&["hardware"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("category_id", &query.category_id.to_string())
                .append_pair("limit", &query.limit.to_string());
            if let Some(offset) = query.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
            if let Some(sort) = &query.sort {
                pairs.append_pair("sort", sort);
            }
        }

        let body = self.get_json(url.clone()).await?;
        reject_error_envelope(&body)?;
        let page: HardwarePage = serde_json::from_value(body).map_err(|e| {
            CheckIoError::upstream(200, format!("{url}: unexpected hardware listing shape: {e}"))
        })?;
        debug!(rows = page.rows.len(), total = page.total, "hardware page fetched");
        Ok(page)
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        let url = self.endpoint(&["categories"])?;
        self.get_listing(url).await
    }

    #[instrument(skip_all, fields(employee_number = %employee_number))]
    async fn get_user(&self, employee_number: &str) -> Result<Option<User>> {
        let wanted = employee_number.trim();
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut()
            .append_pair("employee_num", wanted)
            .append_pair("limit", &USER_SEARCH_LIMIT.to_string());

        // The filter is advisory on some upstream versions; match exactly here.
        let users: Vec<User> = self.get_listing(url).await?;
        Ok(users
            .into_iter()
            .find(|u| u.employee_num.as_deref().map(str::trim) == Some(wanted)))
    }

    async fn get_user_assets(&self, user_id: i64) -> Result<Vec<Value>> {
        let url = self.endpoint(&["users", &user_id.to_string(), "assets"])?;
        self.get_listing(url).await
    }

    #[instrument(skip_all, fields(tag = %tag))]
    async fn get_asset_by_tag(&self, tag: &str) -> Result<Option<Value>> {
        let url = self.endpoint(&["hardware", "bytag", tag.trim()])?;
        match self.get_json(url).await {
            Ok(body) if is_error_envelope(&body) => Ok(None),
            Ok(body) => Ok(Some(body)),
            Err(CheckIoError::Upstream { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, fields(asset_id = asset_id, user_id = user_id))]
    async fn checkout(&self, asset_id: i64, user_id: i64, note: &str) -> Result<ActionOutcome> {
        let url = self.endpoint(&["hardware", &asset_id.to_string(), "checkout"])?;
        let body = json!({
            "checkout_to_type": "user",
            "assigned_user": user_id,
            "note": note,
        });
        let response = self.post_json(url, &body).await?;
        Ok(ActionOutcome::from_envelope(&response))
    }

    #[instrument(skip_all, fields(asset_id = asset_id))]
    async fn checkin(&self, asset_id: i64, note: &str) -> Result<ActionOutcome> {
        let url = self.endpoint(&["hardware", &asset_id.to_string(), "checkin"])?;
        let response = self.post_json(url, &json!({ "note": note })).await?;
        Ok(ActionOutcome::from_envelope(&response))
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

fn transport_error(url: &Url, err: reqwest::Error) -> CheckIoError {
    if err.is_timeout() {
        CheckIoError::Network(format!("{url}: request timed out"))
    } else {
        CheckIoError::Network(format!("{url}: {err}"))
    }
}

/// Read a response body as JSON, turning non-2xx statuses into upstream errors.
async fn read_json(url: &Url, response: Response) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CheckIoError::Network(format!("{url}: body read failed: {e}")))?;

    if !status.is_success() {
        return Err(CheckIoError::upstream(status.as_u16(), error_summary(&body)));
    }

    serde_json::from_str(&body).map_err(|e| {
        CheckIoError::upstream(status.as_u16(), format!("{url}: response is not JSON: {e}"))
    })
}

/// `{"status": "error", "messages": ...}` delivered with a 2xx status.
fn is_error_envelope(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("error") && body.get("messages").is_some()
}

fn reject_error_envelope(body: &Value) -> Result<()> {
    if is_error_envelope(body) {
        let message = body.get("messages").map(messages_text).unwrap_or_default();
        return Err(CheckIoError::upstream(200, message));
    }
    Ok(())
}

fn error_summary(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(messages) = value.get("messages").or_else(|| value.get("message")) {
            return messages_text(messages);
        }
    }
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
