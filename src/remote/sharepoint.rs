//! SharePoint Online list store over the REST API.
//!
//! Sign-in uses the identity provider's resource-owner password grant, which
//! returns a bearer token scoped to the site's host. List access goes through
//! `_api/web/lists/getbytitle('<list>')/items` with `odata=nometadata` JSON.
//!
//! # Security Note - Logging
//!
//! The bearer token is sent through `RedactedHeader`, and the header value is
//! marked sensitive, so neither our `tracing` output nor reqwest's debug
//! logging prints it.

use std::fmt;
use std::time::Duration;

use reqwest::header;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::credential::{Credential, Session};
use crate::error::{Result, StockdeskError};
use crate::types::{Fields, ItemId, StoreItem, UserId, UserIdentity};

use super::error::{ApiError, TokenErrorBody, sharepoint_error_message};
use super::{ListStore, StoreFilter};

const ODATA_JSON: &str = "application/json;odata=nometadata";

/// Items requested per round trip while walking a list (the REST maximum)
const LIST_BATCH_SIZE: usize = 5000;

/// SharePoint error code for a list item that does not exist
const MISSING_ITEM_CODE: &str = "-2147024809";

/// SharePoint error code for a list title that does not exist
const MISSING_LIST_CODE: &str = "-2130575322";

/// Wrapper for the bearer token that redacts the value when formatted.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn new(value: String) -> Self {
        Self { value }
    }

    fn as_header_value(&self) -> Result<header::HeaderValue> {
        let mut value = header::HeaderValue::from_str(&self.value).map_err(|_| {
            StockdeskError::InvalidArgument(
                "access token contains characters not allowed in a header".to_string(),
            )
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ItemsPage {
    #[serde(default)]
    value: Vec<Fields>,
    #[serde(rename = "odata.nextLink", alias = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CurrentUser {
    id: i64,
    #[serde(default)]
    login_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    email: Option<String>,
}

/// SharePoint site store
pub struct SharePointStore {
    client: Client,
    /// Site URL, always ending in `/`
    site: Url,
    token_url: Url,
    scope: String,
    client_id: String,
}

impl SharePointStore {
    /// Create a store from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let site_url = config.site_url().ok_or_else(|| {
            StockdeskError::Config(
                "SharePoint site not configured. Set STOCKDESK_SITE_URL or run: stockdesk config set site_url <url>".to_string(),
            )
        })?;
        let client_id = config.client_id().ok_or_else(|| {
            StockdeskError::Config(
                "client id not configured. Set STOCKDESK_CLIENT_ID or run: stockdesk config set auth.client_id <id>".to_string(),
            )
        })?;

        Self::new(
            &site_url,
            &config.auth.authority,
            &config.auth.tenant,
            &client_id,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    /// Create a store for a site.
    ///
    /// Tokens come from `<authority>/<tenant>/oauth2/v2.0/token`. `timeout`
    /// bounds each request end to end; `connect_timeout` bounds connection
    /// setup.
    pub fn new(
        site_url: &str,
        authority: &str,
        tenant: &str,
        client_id: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let site = parse_site_url(site_url)?;
        let host = site.host_str().ok_or_else(|| {
            StockdeskError::Config(format!("site_url '{site_url}' has no host"))
        })?;
        let scope = format!("{}://{}/.default", site.scheme(), host);

        let authority = authority.trim_end_matches('/');
        let token_url = Url::parse(&format!("{authority}/{tenant}/oauth2/v2.0/token")).map_err(
            |e| {
                StockdeskError::Config(format!(
                    "invalid token endpoint for authority '{authority}' and tenant '{tenant}': {e}"
                ))
            },
        )?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            site,
            token_url,
            scope,
            client_id: client_id.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        self.site
            .join(&format!("_api/{path}"))
            .map_err(|e| StockdeskError::Config(format!("invalid API path '{path}': {e}")))
    }

    fn items_url(&self, list: &str) -> Result<Url> {
        self.api_url(&format!(
            "web/lists/getbytitle('{}')/items",
            escape_odata_literal(list)
        ))
    }

    fn item_url(&self, list: &str, id: ItemId) -> Result<Url> {
        self.api_url(&format!(
            "web/lists/getbytitle('{}')/items({})",
            escape_odata_literal(list),
            id
        ))
    }

    /// Send an authorized request, turning non-success statuses into errors
    async fn send(
        &self,
        request: RequestBuilder,
        session: &Session,
        operation: &'static str,
    ) -> Result<Response> {
        let auth_header = RedactedHeader::new(session.bearer());
        let response = request
            .header(header::AUTHORIZATION, auth_header.as_header_value()?)
            .header(header::ACCEPT, header::HeaderValue::from_static(ODATA_JSON))
            .send()
            .await
            .map_err(|e| ApiError::new(e.to_string(), operation))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(operation, %status, "SharePoint request failed: {body}");
        Err(ApiError::with_status(sharepoint_error_message(&body), operation, status).into())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
        operation: &'static str,
    ) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| ApiError::new(format!("malformed response: {e}"), operation).into())
    }
}

impl ListStore for SharePointStore {
    async fn authenticate(&self, credential: &Credential) -> Result<Session> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("grant_type", "password"),
            ("username", credential.principal()),
            ("password", credential.secret().expose_secret()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::new(e.to_string(), "authenticate"))?;

        let status = response.status();
        if !status.is_success() {
            let body: TokenErrorBody = response.json().await.unwrap_or_default();
            return Err(ApiError::from_token_error(status, &body).into());
        }

        let token: TokenResponse = Self::read_json(response, "authenticate").await?;
        tracing::debug!(principal = credential.principal(), "signed in");
        Ok(Session::new(
            credential.principal(),
            SecretString::from(token.access_token),
        ))
    }

    async fn load_site(&self, session: &Session) -> Result<()> {
        let mut url = self.api_url("web")?;
        url.query_pairs_mut().append_pair("$select", "Title");
        self.send(self.client.get(url), session, "load_site").await?;
        Ok(())
    }

    async fn list_items(
        &self,
        session: &Session,
        list: &str,
        filter: Option<&StoreFilter>,
    ) -> Result<Vec<StoreItem>> {
        let mut url = self.items_url(list)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("$top", &LIST_BATCH_SIZE.to_string());
            if let Some(filter) = filter {
                pairs.append_pair("$filter", &odata_filter(filter)?);
            }
        }

        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let response = self
                .send(self.client.get(url), session, "list_items")
                .await
                .map_err(|e| list_error(e, list))?;
            let page: ItemsPage = Self::read_json(response, "list_items").await?;
            for properties in page.value {
                items.push(into_store_item(properties)?);
            }
            next = page
                .next_link
                .map(|link| Url::parse(&link))
                .transpose()
                .map_err(|e| ApiError::new(format!("invalid next link: {e}"), "list_items"))?;
        }

        Ok(items)
    }

    async fn get_item(&self, session: &Session, list: &str, id: ItemId) -> Result<StoreItem> {
        let url = self.item_url(list, id)?;
        let response = self
            .send(self.client.get(url), session, "get_item")
            .await
            .map_err(|e| item_error(e, list, id))?;
        let properties: Fields = Self::read_json(response, "get_item").await?;
        into_store_item(properties)
    }

    async fn create_item(&self, session: &Session, list: &str, fields: &Fields) -> Result<ItemId> {
        let url = self.items_url(list)?;
        let request = self
            .client
            .post(url)
            .header(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static(ODATA_JSON),
            )
            .json(fields);
        let response = self
            .send(request, session, "create_item")
            .await
            .map_err(|e| list_error(e, list))?;
        let properties: Fields = Self::read_json(response, "create_item").await?;
        Ok(into_store_item(properties)?.id)
    }

    async fn update_item(
        &self,
        session: &Session,
        list: &str,
        id: ItemId,
        fields: &Fields,
    ) -> Result<()> {
        let url = self.item_url(list, id)?;
        let request = self
            .client
            .post(url)
            .header(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static(ODATA_JSON),
            )
            .header(header::IF_MATCH, header::HeaderValue::from_static("*"))
            .header("X-HTTP-Method", header::HeaderValue::from_static("MERGE"))
            .json(fields);

        self.send(request, session, "update_item")
            .await
            .map_err(|e| item_error(e, list, id))?;
        Ok(())
    }

    async fn current_user(&self, session: &Session) -> Result<UserIdentity> {
        let url = self.api_url("web/currentuser")?;
        let response = self.send(self.client.get(url), session, "current_user").await?;
        let user: CurrentUser = Self::read_json(response, "current_user").await?;
        Ok(UserIdentity {
            id: UserId(user.id),
            login_name: user.login_name,
            title: user.title,
            email: user.email.filter(|e| !e.is_empty()),
        })
    }
}

/// Parse a site URL, normalizing it to end with `/` so relative joins keep
/// the site path
fn parse_site_url(site_url: &str) -> Result<Url> {
    let mut url = Url::parse(site_url.trim())
        .map_err(|e| StockdeskError::Config(format!("invalid site_url '{site_url}': {e}")))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(StockdeskError::Config(format!(
            "site_url '{site_url}' must use https"
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Quote a value for use inside an OData string literal
fn escape_odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a filter as an OData substring predicate.
///
/// Column names are emitted bare, so only `[A-Za-z0-9_]` is accepted.
fn odata_filter(filter: &StoreFilter) -> Result<String> {
    let valid = !filter.field.is_empty()
        && filter
            .field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StockdeskError::InvalidArgument(format!(
            "invalid field name '{}' in filter",
            filter.field
        )));
    }

    Ok(format!(
        "substringof('{}', {})",
        escape_odata_literal(&filter.value),
        filter.field
    ))
}

fn into_store_item(properties: Fields) -> Result<StoreItem> {
    let id = properties
        .get("ID")
        .or_else(|| properties.get("Id"))
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            StockdeskError::Transport("malformed response: list item has no ID".to_string())
        })?;

    Ok(StoreItem {
        id: ItemId(id),
        properties,
    })
}

fn is_missing_list(error: &StockdeskError) -> bool {
    matches!(error, StockdeskError::Api { message, .. } if message.contains(MISSING_LIST_CODE))
}

fn is_missing_item(error: &StockdeskError) -> bool {
    match error {
        _ if is_missing_list(error) => false,
        StockdeskError::Api { status: 404, .. } => true,
        StockdeskError::Api { status: 400, message } => message.contains(MISSING_ITEM_CODE),
        _ => false,
    }
}

/// A list title that does not resolve is a settings problem
fn list_error(error: StockdeskError, list: &str) -> StockdeskError {
    if is_missing_list(&error) {
        return StockdeskError::Config(format!(
            "list '{list}' does not exist on the site. Check lists.inventory and lists.tickets"
        ));
    }
    error
}

fn item_error(error: StockdeskError, list: &str, id: ItemId) -> StockdeskError {
    if is_missing_item(&error) {
        return StockdeskError::NotFound {
            list: list.to_string(),
            id: id.to_string(),
        };
    }
    list_error(error, list)
}
