pub mod dealers;
pub mod leads;
pub mod records;

use std::collections::HashMap;

use crate::middleware::error_handling::AppError;

/// Looks up a required query parameter; absent or blank fails validation
/// with the endpoint's own error/message wording, before any store access.
pub(crate) fn require_param<'a>(
    params: &'a HashMap<String, String>,
    name: &str,
    error: &'static str,
    message: &'static str,
) -> Result<&'a str, AppError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request(error, message))
}

/// Optional query parameter: absent and blank are both "not supplied".
pub(crate) fn optional_param(params: &HashMap<String, String>, name: &str) -> Option<String> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn display_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_param_treats_blank_as_missing() {
        let mut params = HashMap::new();
        params.insert("state".to_string(), "".to_string());
        assert!(require_param(&params, "state", "Missing required parameter", "x").is_err());

        params.insert("state".to_string(), "Karnataka".to_string());
        assert_eq!(
            require_param(&params, "state", "Missing required parameter", "x").unwrap(),
            "Karnataka"
        );
    }

    #[test]
    fn display_json_strips_string_quotes() {
        assert_eq!(display_json(&serde_json::json!("abc")), "abc");
        assert_eq!(display_json(&serde_json::json!(42)), "42");
        assert_eq!(display_json(&serde_json::json!(true)), "true");
    }
}
