//! HTTP implementation of [`Backend`] for a hosted Supabase project
//!
//! Accounts go through the GoTrue admin API (`/auth/v1/admin/users`), table
//! writes through PostgREST (`/rest/v1/<table>`). Every request carries the
//! service-role key both as `apikey` and as a bearer token.

use async_trait::async_trait;
use common::{ConfigurationError, FeedKey, IdentityKey};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{
    Account, Backend, BackendError, CommentRow, DietLogRow, FeedRow, Group, GroupMemberRow,
    GroupPostRow, NewAccount, ProfileUpdate, Table, WeeklyLogRow,
};
use crate::config::BackendConfig;
use crate::error::Error;

/// SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// GoTrue error codes meaning the email is already registered
const ACCOUNT_EXISTS_CODES: &[&str] = &["email_exists", "user_already_exists"];

/// Message emitted for duplicates by GoTrue releases without `error_code`
const LEGACY_ACCOUNT_EXISTS_MESSAGE: &str = "already been registered";

const PREFER: &str = "Prefer";

/// Hosted backend client
pub struct SupabaseBackend {
    client: Client,
    base_url: String,
    account_page_size: u32,
}

impl SupabaseBackend {
    /// Create a client for the project at `base_url`
    pub fn new(
        base_url: &Url,
        service_role_key: &str,
        timeout: Duration,
        account_page_size: u32,
    ) -> Result<Self, Error> {
        let invalid_key =
            |e: reqwest::header::InvalidHeaderValue| ConfigurationError::InvalidValue {
                key: "backend.service_role_key".to_string(),
                value: "<redacted>".to_string(),
                reason: e.to_string(),
            };

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(service_role_key).map_err(invalid_key)?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {service_role_key}")).map_err(invalid_key)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            account_page_size: account_page_size.max(1),
        })
    }

    /// Create a client from validated configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, Error> {
        Self::new(
            &config.endpoint()?,
            config.service_role_key()?,
            config.request_timeout(),
            config.account_page_size,
        )
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/admin/{}", self.base_url, path)
    }

    fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn rest(&self, method: Method, table: Table) -> RequestBuilder {
        self.client.request(method, self.rest_url(table))
    }

    async fn execute(
        &self,
        table: Table,
        request: RequestBuilder,
    ) -> Result<Response, BackendError> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(table, response).await)
        }
    }

    async fn upsert<T: serde::Serialize + Sync>(
        &self,
        table: Table,
        row: &T,
        on_conflict: &str,
    ) -> Result<(), BackendError> {
        let request = self
            .rest(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .json(row);
        self.execute(table, request).await.map(|_| ())
    }

    async fn insert<T: serde::Serialize + Sync>(
        &self,
        table: Table,
        row: &T,
    ) -> Result<(), BackendError> {
        let request = self
            .rest(Method::POST, table)
            .header(PREFER, "return=minimal")
            .json(row);
        self.execute(table, request).await.map(|_| ())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<String> {
        self.error_code.clone().or_else(|| match &self.code {
            Some(Value::String(code)) => Some(code.clone()),
            _ => None,
        })
    }

    fn message(&self, fallback: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

async fn error_from_response(table: Table, response: Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    classify_error(table, status, &parsed, &body)
}

/// Map an error response onto [`BackendError`], preferring structured codes
fn classify_error(table: Table, status: StatusCode, body: &ErrorBody, raw: &str) -> BackendError {
    let code = body.code();
    let message = body.message(if raw.is_empty() {
        status.canonical_reason().unwrap_or("unknown error")
    } else {
        raw
    });

    let structured_conflict = match code.as_deref() {
        Some(code) => code == UNIQUE_VIOLATION || ACCOUNT_EXISTS_CODES.contains(&code),
        None => false,
    };
    let legacy_account_conflict = table == Table::Accounts
        && code.is_none()
        && status == StatusCode::UNPROCESSABLE_ENTITY
        && message.contains(LEGACY_ACCOUNT_EXISTS_MESSAGE);

    if structured_conflict || legacy_account_conflict {
        BackendError::AlreadyExists { table, message }
    } else {
        BackendError::Rejected {
            table,
            status: status.as_u16(),
            code,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccountPage {
    #[serde(default)]
    users: Vec<Account>,
}

#[derive(Debug, Deserialize)]
struct KeyOnly<K> {
    id: K,
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn create_account(&self, account: &NewAccount) -> Result<Account, BackendError> {
        let request = self
            .client
            .post(self.auth_url("users"))
            .json(account);
        let response = self.execute(Table::Accounts, request).await?;
        response
            .json::<Account>()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                table: Table::Accounts,
                details: e.to_string(),
            })
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, BackendError> {
        let mut accounts = Vec::new();
        let per_page = self.account_page_size;
        let mut page = 1u32;

        loop {
            let request = self
                .client
                .get(self.auth_url("users"))
                .query(&[("page", page), ("per_page", per_page)]);
            let response = self.execute(Table::Accounts, request).await?;
            let batch: AccountPage =
                response
                    .json()
                    .await
                    .map_err(|e| BackendError::InvalidResponse {
                        table: Table::Accounts,
                        details: e.to_string(),
                    })?;

            let fetched = batch.users.len();
            debug!("Fetched {} accounts from page {}", fetched, page);
            accounts.extend(batch.users);

            if fetched < per_page as usize {
                break;
            }
            page += 1;
        }

        Ok(accounts)
    }

    async fn update_profile(
        &self,
        id: &IdentityKey,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        let request = self
            .rest(Method::PATCH, Table::Profiles)
            .query(&[("id", format!("eq.{id}")), ("select", "id".to_string())])
            .header(PREFER, "return=representation")
            .json(update);
        let response = self.execute(Table::Profiles, request).await?;
        let updated: Vec<KeyOnly<IdentityKey>> =
            response
                .json()
                .await
                .map_err(|e| BackendError::InvalidResponse {
                    table: Table::Profiles,
                    details: e.to_string(),
                })?;

        if updated.iter().any(|row| row.id == *id) {
            Ok(())
        } else {
            Err(BackendError::rejected(
                Table::Profiles,
                StatusCode::NOT_FOUND.as_u16(),
                format!("no profile row for account {id}"),
            ))
        }
    }

    async fn list_groups(&self) -> Result<Vec<Group>, BackendError> {
        let request = self
            .rest(Method::GET, Table::Groups)
            .query(&[("select", "id,name")]);
        let response = self.execute(Table::Groups, request).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                table: Table::Groups,
                details: e.to_string(),
            })
    }

    async fn upsert_weekly_log(&self, row: &WeeklyLogRow) -> Result<(), BackendError> {
        self.upsert(Table::WeeklyLogs, row, "user_id,date").await
    }

    async fn insert_feed(&self, row: &FeedRow) -> Result<FeedKey, BackendError> {
        let request = self
            .rest(Method::POST, Table::Feeds)
            .query(&[("select", "id")])
            .header(PREFER, "return=representation")
            .json(row);
        let response = self.execute(Table::Feeds, request).await?;
        let created: Vec<KeyOnly<FeedKey>> =
            response
                .json()
                .await
                .map_err(|e| BackendError::InvalidResponse {
                    table: Table::Feeds,
                    details: e.to_string(),
                })?;

        created
            .into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| BackendError::InvalidResponse {
                table: Table::Feeds,
                details: "insert returned no rows".to_string(),
            })
    }

    async fn insert_comment(&self, row: &CommentRow) -> Result<(), BackendError> {
        self.insert(Table::Comments, row).await
    }

    async fn insert_group_member(&self, row: &GroupMemberRow) -> Result<(), BackendError> {
        self.insert(Table::GroupMembers, row).await
    }

    async fn insert_group_post(&self, row: &GroupPostRow) -> Result<(), BackendError> {
        self.insert(Table::GroupPosts, row).await
    }

    async fn upsert_diet_log(&self, row: &DietLogRow) -> Result<(), BackendError> {
        self.upsert(Table::DietLogs, row, "user_id,date").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> ErrorBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = classify_error(
            Table::GroupMembers,
            StatusCode::CONFLICT,
            &body(r#"{"code":"23505","message":"duplicate key value violates unique constraint \"group_members_group_id_user_id_key\""}"#),
            "",
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn test_foreign_key_violation_is_not_conflict() {
        let err = classify_error(
            Table::Comments,
            StatusCode::CONFLICT,
            &body(r#"{"code":"23503","message":"insert or update on table \"comments\" violates foreign key constraint"}"#),
            "",
        );
        match err {
            BackendError::Rejected { status, code, .. } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("23503"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_text_without_code_is_not_conflict() {
        let err = classify_error(
            Table::GroupMembers,
            StatusCode::BAD_REQUEST,
            &body(r#"{"message":"duplicate column in payload"}"#),
            "",
        );
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_account_exists_codes() {
        let modern = classify_error(
            Table::Accounts,
            StatusCode::UNPROCESSABLE_ENTITY,
            &body(r#"{"code":422,"error_code":"email_exists","msg":"A user with this email address has already been registered"}"#),
            "",
        );
        assert!(modern.is_conflict());

        let legacy = classify_error(
            Table::Accounts,
            StatusCode::UNPROCESSABLE_ENTITY,
            &body(r#"{"code":422,"msg":"A user with this email address has already been registered"}"#),
            "",
        );
        assert!(legacy.is_conflict());

        let weak_password = classify_error(
            Table::Accounts,
            StatusCode::UNPROCESSABLE_ENTITY,
            &body(r#"{"code":422,"error_code":"weak_password","msg":"Password should be at least 6 characters"}"#),
            "",
        );
        assert!(!weak_password.is_conflict());
    }

    #[test]
    fn test_message_falls_back_to_raw_body() {
        let err = classify_error(
            Table::Feeds,
            StatusCode::BAD_GATEWAY,
            &ErrorBody::default(),
            "upstream unavailable",
        );
        assert!(err.to_string().contains("upstream unavailable"));
    }
}
