// 📮 Request Handler
// Validates the account number, calls TIPS once, and wraps the outcome in
// the JSON envelope callers receive.

use crate::config::TipsConfig;
use crate::error::LookupError;
use crate::normalize::{normalize, AccountResult};
use crate::xml::parse_document;
use chrono::Datelike;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

/// Upstream query parameter (and output field) holding the account number
pub const BRT_NO: &str = "BRT-NO";

const ACCOUNT_DIGITS: usize = 9;

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// Per-invocation context; only used to tag log lines today
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub request_id: Uuid,
}

impl InvocationContext {
    pub fn new() -> Self {
        InvocationContext {
            request_id: Uuid::new_v4(),
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated account number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountQuery {
    account_number: String,
}

impl AccountQuery {
    /// Accepts any input that starts with nine ASCII digits; the whole input is kept
    pub fn parse(candidate: Option<&str>) -> Result<Self, LookupError> {
        match candidate {
            Some(s) if has_account_prefix(s) => Ok(AccountQuery {
                account_number: s.to_string(),
            }),
            _ => Err(LookupError::InvalidAccountNumber),
        }
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }
}

fn has_account_prefix(s: &str) -> bool {
    s.len() >= ACCOUNT_DIGITS && s.as_bytes()[..ACCOUNT_DIGITS].iter().all(u8::is_ascii_digit)
}

// ============================================================================
// RESPONSE ENVELOPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEcho {
    pub account_num: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountEnvelope {
    pub query: QueryEcho,
    pub data: AccountResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub query: QueryEcho,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LookupBody {
    Found(AccountEnvelope),
    Failed(ErrorEnvelope),
}

/// HTTP status plus JSON body, independent of any web framework
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResponse {
    pub status: u16,
    pub body: LookupBody,
}

impl LookupResponse {
    fn found(account_num: Option<&str>, data: AccountResult) -> Self {
        LookupResponse {
            status: 200,
            body: LookupBody::Found(AccountEnvelope {
                query: echo(account_num),
                data,
            }),
        }
    }

    fn failed(account_num: Option<&str>, err: &LookupError) -> Self {
        LookupResponse {
            status: err.status_code(),
            body: LookupBody::Failed(ErrorEnvelope {
                query: echo(account_num),
                message: err.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, LookupBody::Found(_))
    }
}

fn echo(account_num: Option<&str>) -> QueryEcho {
    QueryEcho {
        account_num: account_num.map(str::to_string),
    }
}

// ============================================================================
// HANDLER
// ============================================================================

/// Client for the TIPS account service
#[derive(Debug, Clone)]
pub struct AccountLookup {
    client: reqwest::Client,
    tips_url: String,
}

impl AccountLookup {
    pub fn new(config: &TipsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(AccountLookup {
            client,
            tips_url: config.tips_url.clone(),
        })
    }

    /// Entry point shared by the HTTP route and the CLI
    pub async fn get_account(&self, account_num: Option<&str>, ctx: &InvocationContext) -> LookupResponse {
        let span = tracing::info_span!(
            "account_lookup",
            request_id = %ctx.request_id,
            account_num = account_num.unwrap_or_default(),
        );

        async {
            let outcome = match AccountQuery::parse(account_num) {
                Ok(query) => self.lookup(&query).await,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(data) => {
                    tracing::info!(years = data.years.len(), "Account lookup complete");
                    LookupResponse::found(account_num, data)
                }
                Err(err) => {
                    log_failure(&err);
                    LookupResponse::failed(account_num, &err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fetch and normalize one account; exactly one upstream request, no retries
    pub async fn lookup(&self, query: &AccountQuery) -> Result<AccountResult, LookupError> {
        let xml = self.fetch(query).await?;
        let document = parse_document(&xml)?;
        let current_year = chrono::Local::now().year();

        Ok(normalize(&document, current_year)?)
    }

    async fn fetch(&self, query: &AccountQuery) -> Result<String, LookupError> {
        tracing::debug!(url = %self.tips_url, "Requesting account from TIPS");

        let response = self
            .client
            .get(&self.tips_url)
            .query(&[(BRT_NO, query.account_number())])
            .send()
            .await
            .map_err(LookupError::UpstreamUnreachable)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::AccountNotFound);
        }
        if !status.is_success() {
            return Err(LookupError::UpstreamStatus(status.as_u16()));
        }

        response.text().await.map_err(LookupError::UpstreamUnreachable)
    }
}

fn log_failure(err: &LookupError) {
    match err {
        LookupError::InvalidAccountNumber | LookupError::AccountNotFound => {
            tracing::warn!(status = err.status_code(), "{}", err)
        }
        LookupError::UpstreamStatus(code) => {
            tracing::warn!(upstream_status = code, "TIPS returned an error status")
        }
        LookupError::UpstreamUnreachable(source) => {
            tracing::error!(error = %source, "{}", err)
        }
        LookupError::Normalization(source) => {
            tracing::error!(error = %source, "Could not normalize TIPS response")
        }
    }
}
