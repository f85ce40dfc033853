//! The two user journeys exercised against a fresh installation

pub mod api;
pub mod install;

use serde_json::Value;

use crate::client::JsonObject;
use crate::ensure;
use crate::error::HarnessResult;

/// Value of the `msg` field, empty when absent
pub fn message(obj: &JsonObject) -> &str {
    obj.get("msg").and_then(Value::as_str).unwrap_or("")
}

pub fn success_flag(obj: &JsonObject) -> Option<bool> {
    obj.get("success").and_then(Value::as_bool)
}

/// `success` must be `true`
pub fn expect_success(obj: &JsonObject, action: &str) -> HarnessResult<()> {
    ensure!(
        success_flag(obj) == Some(true),
        "{}: expected success=true, got {} ({})",
        action,
        display_flag(obj),
        message(obj)
    );
    Ok(())
}

/// `success` must be `false`
pub fn expect_failure(obj: &JsonObject, action: &str) -> HarnessResult<()> {
    ensure!(
        success_flag(obj) == Some(false),
        "{}: expected success=false, got {} ({})",
        action,
        display_flag(obj),
        message(obj)
    );
    Ok(())
}

/// `msg` must equal `expected` exactly
pub fn expect_message(obj: &JsonObject, action: &str, expected: &str) -> HarnessResult<()> {
    ensure!(
        message(obj) == expected,
        "{}: expected message {:?}, got {:?}",
        action,
        expected,
        message(obj)
    );
    Ok(())
}

/// A rejected submission: `success=false` with exactly `expected` as message
pub fn expect_rejection(obj: &JsonObject, action: &str, expected: &str) -> HarnessResult<()> {
    expect_failure(obj, action)?;
    expect_message(obj, action, expected)
}

fn display_flag(obj: &JsonObject) -> String {
    obj.get("success")
        .map(|v| v.to_string())
        .unwrap_or_else(|| "nothing".to_string())
}
