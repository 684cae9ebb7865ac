//! `${ENV_VAR}` interpolation over a parsed config tree.
//!
//! Runs once at load time. Only string values that are exactly `${NAME}`
//! are substituted; anything else, including unset variables, stays literal.

use toml::Value;

/// Resolve every exact `${NAME}` string in the tree from the process environment.
pub fn interpolate(value: Value) -> Value {
    interpolate_with(value, &|name| std::env::var(name).ok())
}

/// Same as [`interpolate`] with a custom variable lookup.
pub fn interpolate_with(value: Value, lookup: &dyn Fn(&str) -> Option<String>) -> Value {
    match value {
        Value::String(s) => Value::String(resolve(&s, lookup).unwrap_or(s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| interpolate_with(item, lookup))
                .collect(),
        ),
        Value::Table(table) => Value::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, interpolate_with(v, lookup)))
                .collect(),
        ),
        other => other,
    }
}

/// Variable name of an exact `${NAME}` reference.
pub fn var_name(value: &str) -> Option<&str> {
    let name = value.strip_prefix("${")?.strip_suffix('}')?;
    if name.is_empty() || name.contains(|c| matches!(c, '$' | '{' | '}')) {
        return None;
    }
    Some(name)
}

fn resolve(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    var_name(value).and_then(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "API_KEY" => Some("sk-test".to_string()),
            "REGION" => Some("eu-central-1".to_string()),
            _ => None,
        }
    }

    fn expand(src: &str) -> Value {
        let table: toml::Table = toml::from_str(src).unwrap();
        interpolate_with(Value::Table(table), &lookup)
    }

    #[test]
    fn test_exact_reference_is_resolved() {
        let value = expand(r#"key = "${API_KEY}""#);
        assert_eq!(value["key"].as_str(), Some("sk-test"));
    }

    #[test]
    fn test_unset_variable_stays_literal() {
        let value = expand(r#"key = "${NOT_SET_ANYWHERE}""#);
        assert_eq!(value["key"].as_str(), Some("${NOT_SET_ANYWHERE}"));
    }

    #[test]
    fn test_partial_tokens_stay_literal() {
        let value = expand(
            r#"
            prefixed = "Bearer ${API_KEY}"
            unterminated = "${API_KEY"
            empty = "${}"
            nested = "${${API_KEY}}"
            "#,
        );
        assert_eq!(value["prefixed"].as_str(), Some("Bearer ${API_KEY}"));
        assert_eq!(value["unterminated"].as_str(), Some("${API_KEY"));
        assert_eq!(value["empty"].as_str(), Some("${}"));
        assert_eq!(value["nested"].as_str(), Some("${${API_KEY}}"));
    }

    #[test]
    fn test_nested_tables_and_arrays() {
        let value = expand(
            r#"
            regions = ["${REGION}", "us-east-1"]
            [providers.bedrock]
            aws_region = "${REGION}"
            max_tokens = 10
            "#,
        );
        assert_eq!(value["regions"][0].as_str(), Some("eu-central-1"));
        assert_eq!(value["regions"][1].as_str(), Some("us-east-1"));
        assert_eq!(
            value["providers"]["bedrock"]["aws_region"].as_str(),
            Some("eu-central-1")
        );
        assert_eq!(value["providers"]["bedrock"]["max_tokens"].as_integer(), Some(10));
    }

    #[test]
    fn test_var_name() {
        assert_eq!(var_name("${HOME}"), Some("HOME"));
        assert_eq!(var_name("HOME"), None);
        assert_eq!(var_name("${}"), None);
    }
}
