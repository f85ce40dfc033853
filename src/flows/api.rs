//! Authenticated API flow: login, API key lifecycle, notifications, logout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{expect_failure, expect_message, expect_success};
use crate::client::JsonObject;
use crate::ensure;
use crate::error::{HarnessError, HarnessResult};
use crate::runner::{Flow, FlowContext, StepFuture};

pub const MSG_ALREADY_LOGGED_IN: &str = "You are already logged in";

/// API key as listed by `apiKey/fetch` and returned by `apiKey/create`.
///
/// Fields beyond the three the flow works with are kept in `extra`, so two
/// records compare equal only when every field matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub uid: Value,
    pub api_key: String,
    pub valid_until: Value,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl ApiKeyRecord {
    /// Value for the `id` form field of refresh and revoke
    pub fn id(&self) -> String {
        match &self.uid {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Whether `new` is the same as or later than `old`.
///
/// Numbers compare numerically, strings numerically when both parse as
/// integers and lexically otherwise. `None` when the two can't be compared.
pub fn valid_until_not_before(new: &Value, old: &Value) -> Option<bool> {
    match (new, old) {
        (Value::Number(a), Value::Number(b)) => Some(a.as_f64()? >= b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(a), Ok(b)) => Some(a >= b),
            _ => Some(a >= b),
        },
        _ => None,
    }
}

fn api(method: &str) -> String {
    format!("/api/{}", method)
}

pub fn flow() -> Flow<FlowContext> {
    Flow::new("API")
        .step("Testing login…", test_login)
        .step("Testing already logged in…", test_already_logged_in)
        .step("Testing get api keys empty…", test_get_api_keys_empty)
        .step("Testing create api key…", test_create_api_key)
        .step("Testing refresh api key…", test_refresh_api_key)
        .step("Testing revoke api key…", test_revoke_api_key)
        .step("Testing fetch notifications…", test_fetch_notifications)
        .step("Testing logout…", test_logout)
}

async fn login(ctx: &FlowContext) -> HarnessResult<JsonObject> {
    let form = [
        ("username", ctx.admin.username.as_str()),
        ("password", ctx.admin.password.as_str()),
    ];
    let obj = ctx.session.post_json(&api("user/login"), &form).await?;
    expect_success(&obj, "login")?;
    Ok(obj)
}

/// Decode an api key object. A record of the wrong shape fails the step as
/// an assertion naming the record.
fn parse_api_key(value: &Value, action: &str) -> HarnessResult<ApiKeyRecord> {
    serde_json::from_value(value.clone()).map_err(|e| {
        HarnessError::assertion(format!("{}: malformed api key {}: {}", action, value, e))
    })
}

async fn fetch_raw_api_keys(ctx: &FlowContext) -> HarnessResult<Vec<Value>> {
    let obj = ctx.session.post_json(&api("apiKey/fetch"), &[]).await?;
    expect_success(&obj, "fetch api keys")?;

    let keys = match obj.get("api_keys") {
        Some(Value::Array(keys)) => keys.clone(),
        other => {
            return Err(HarnessError::assertion(format!(
                "fetch api keys: expected an api_keys list, got {}",
                other.map(|v| v.to_string()).unwrap_or_else(|| "nothing".to_string())
            )))
        }
    };

    Ok(keys)
}

async fn fetch_api_keys(ctx: &FlowContext) -> HarnessResult<Vec<ApiKeyRecord>> {
    fetch_raw_api_keys(ctx)
        .await?
        .iter()
        .map(|key| parse_api_key(key, "fetch api keys"))
        .collect()
}

fn current_key(ctx: &FlowContext) -> HarnessResult<ApiKeyRecord> {
    ctx.api_key
        .clone()
        .ok_or_else(|| HarnessError::assertion("no api key has been created"))
}

fn test_login(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        login(ctx).await?;
        Ok(())
    })
}

fn test_already_logged_in(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let obj = login(ctx).await?;
        expect_message(&obj, "repeated login", MSG_ALREADY_LOGGED_IN)
    })
}

fn test_get_api_keys_empty(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let keys = fetch_api_keys(ctx).await?;
        ensure!(keys.is_empty(), "expected no api keys, got {}", keys.len());
        Ok(())
    })
}

fn test_create_api_key(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let obj = ctx.session.post_json(&api("apiKey/create"), &[]).await?;
        expect_success(&obj, "create api key")?;

        let created = obj
            .get("api_key")
            .cloned()
            .ok_or_else(|| HarnessError::assertion("create api key: no api_key in response"))?;

        let keys = fetch_raw_api_keys(ctx).await?;
        ensure!(keys.len() == 1, "expected exactly one api key, got {}", keys.len());
        ensure!(
            keys[0] == created,
            "listed api key differs from the created one:\n  created: {}\n  listed:  {}",
            created,
            keys[0]
        );

        ctx.api_key = Some(parse_api_key(&created, "create api key")?);
        Ok(())
    })
}

fn test_refresh_api_key(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let key = current_key(ctx)?;
        let id = key.id();
        let obj = ctx
            .session
            .post_json(&api("apiKey/refresh"), &[("id", id.as_str())])
            .await?;
        expect_success(&obj, "refresh api key")?;

        let valid_until = obj
            .get("valid_until")
            .cloned()
            .ok_or_else(|| HarnessError::assertion("refresh api key: no valid_until in response"))?;
        match valid_until_not_before(&valid_until, &key.valid_until) {
            Some(true) => {}
            Some(false) => {
                return Err(HarnessError::assertion(format!(
                    "refreshed valid_until {} is before {}",
                    valid_until, key.valid_until
                )))
            }
            None => {
                return Err(HarnessError::assertion(format!(
                    "cannot compare valid_until {} with {}",
                    valid_until, key.valid_until
                )))
            }
        }

        if let Some(key) = ctx.api_key.as_mut() {
            key.valid_until = valid_until;
        }
        Ok(())
    })
}

fn test_revoke_api_key(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let id = current_key(ctx)?.id();
        let obj = ctx
            .session
            .post_json(&api("apiKey/revoke"), &[("id", id.as_str())])
            .await?;
        expect_success(&obj, "revoke api key")?;

        let keys = fetch_api_keys(ctx).await?;
        ensure!(
            keys.is_empty(),
            "expected no api keys after revoke, got {}",
            keys.len()
        );
        ctx.api_key = None;
        Ok(())
    })
}

fn test_fetch_notifications(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let obj = ctx
            .session
            .post_json(&api("notifications/fetch"), &[])
            .await?;
        expect_success(&obj, "fetch notifications")
    })
}

fn test_logout(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let obj = ctx.session.post_json(&api("user/logout"), &[]).await?;
        expect_success(&obj, "logout")?;

        let obj = ctx.session.post_json(&api("user/logout"), &[]).await?;
        expect_failure(&obj, "second logout")
    })
}
