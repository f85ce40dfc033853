//! Response checks applied to everything the application serves.
//!
//! A response passes when it was delivered with status 200, carries no
//! interpreter diagnostic rendered into the body, and, for structured
//! endpoints, decodes to a JSON object.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::session::{HttpResponse, JsonObject};
use crate::error::{HarnessError, HarnessResult};

/// Labels the interpreter prints in bold in front of a diagnostic
pub const DIAGNOSTIC_KEYWORDS: [&str; 5] =
    ["Fatal error", "Warning", "Notice", "Parse error", "Deprecated"];

fn diagnostic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!("<b>({})</b>:", DIAGNOSTIC_KEYWORDS.join("|"))).unwrap()
    })
}

/// Status must be exactly 200
pub fn check_transport(res: &HttpResponse) -> HarnessResult<()> {
    if res.status != 200 {
        return Err(HarnessError::Transport {
            path: res.path.clone(),
            status: res.status,
            reason: res.reason.clone(),
        });
    }
    Ok(())
}

/// Lines of `body` that look like a leaked interpreter diagnostic
pub fn leaked_diagnostics(body: &str) -> Vec<String> {
    let pattern = diagnostic_pattern();
    body.lines()
        .filter(|line| pattern.is_match(line))
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

pub fn check_leaks(res: &HttpResponse) -> HarnessResult<()> {
    let lines = leaked_diagnostics(&res.body);
    if !lines.is_empty() {
        return Err(HarnessError::LeakedDiagnostic {
            path: res.path.clone(),
            lines,
        });
    }
    Ok(())
}

/// Decode the body as a JSON object. Arrays, scalars and garbage are all
/// protocol errors carrying the raw body.
pub fn parse_object(res: &HttpResponse) -> HarnessResult<JsonObject> {
    match serde_json::from_str::<Value>(&res.body) {
        Ok(Value::Object(obj)) => Ok(obj),
        _ => Err(HarnessError::Protocol {
            path: res.path.clone(),
            body: res.body.clone(),
        }),
    }
}

/// Transport and leak checks, for HTML pages
pub fn validate_page(res: &HttpResponse) -> HarnessResult<()> {
    check_transport(res)?;
    check_leaks(res)
}

/// All three checks, for endpoints that answer with JSON
pub fn validate_json(res: &HttpResponse) -> HarnessResult<JsonObject> {
    validate_page(res)?;
    parse_object(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            path: "/".to_string(),
            status,
            reason: "OK".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_transport_rejects_non_200() {
        let mut res = response(500, "");
        res.reason = "Internal Server Error".to_string();
        let err = check_transport(&res).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server returned: 500 Internal Server Error (/)"
        );
        assert!(check_transport(&response(200, "")).is_ok());
    }

    #[test]
    fn test_transport_rejects_other_success_codes() {
        assert!(check_transport(&response(204, "")).is_err());
    }

    #[test]
    fn test_detects_each_diagnostic_keyword() {
        for keyword in DIAGNOSTIC_KEYWORDS {
            let body = format!(
                "<html>\n<br />\n<b>{}</b>:  Undefined index: foo in <b>/var/www/index.php</b> on line <b>3</b><br />\n</html>",
                keyword
            );
            let lines = leaked_diagnostics(&body);
            assert_eq!(lines.len(), 1, "keyword {keyword} not detected");
            assert!(lines[0].contains(keyword));
        }
    }

    #[test]
    fn test_unbolded_keywords_are_not_diagnostics() {
        let body = "Warning: this is plain text\n<b>Warning</b> without colon";
        assert!(leaked_diagnostics(body).is_empty());
    }

    #[test]
    fn test_leak_fails_even_with_200() {
        let res = response(200, "{\"success\":true}\n<b>Notice</b>: Undefined variable");
        let err = validate_json(&res).unwrap_err();
        match err {
            HarnessError::LeakedDiagnostic { lines, .. } => {
                assert_eq!(lines, vec!["<b>Notice</b>: Undefined variable".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_object_rejects_arrays_and_scalars() {
        for body in ["[]", "42", "\"ok\"", "not json", ""] {
            let err = parse_object(&response(200, body)).unwrap_err();
            match err {
                HarnessError::Protocol { body: raw, .. } => assert_eq!(raw, body),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_object_accepts_object() {
        let obj = validate_json(&response(200, r#"{"success":false,"msg":"x"}"#)).unwrap();
        assert_eq!(obj["msg"], "x");
    }
}
