use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::env;
use tracing::{debug, warn};

const PLACEHOLDER: &str = r"\$\{(\w+)\}|\$(\w+)";

fn placeholder_regex() -> Result<Regex> {
    Regex::new(PLACEHOLDER).context("Invalid placeholder pattern")
}

fn var_name<'a>(caps: &Captures<'a>) -> Option<&'a str> {
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME.
///
/// Placeholders whose variable is not set are left untouched; the validator
/// reports them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = placeholder_regex()?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &Captures| {
        let placeholder = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let Some(name) = var_name(caps) else {
            return placeholder.to_string();
        };
        match env::var(name) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", name);
                value
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", name);
                missing_vars.push(name.to_string());
                placeholder.to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may use defaults or fail validation): {:?}",
            missing_vars
        );
    }

    Ok(result.into_owned())
}

/// Get environment variable with a default value
pub fn get_env_or_default(var_name: &str, default: &str) -> String {
    match env::var(var_name) {
        Ok(value) => value,
        Err(_) => {
            debug!(
                "Environment variable '{}' not set, using default: \"{}\"",
                var_name, default
            );
            default.to_string()
        }
    }
}

/// Names of the placeholders still present in `content`, in order.
pub fn unresolved_env_vars(content: &str) -> Vec<String> {
    match placeholder_regex() {
        Ok(re) => re
            .captures_iter(content)
            .filter_map(|caps| var_name(&caps).map(str::to_string))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    !unresolved_env_vars(content).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_both_forms() {
        env::set_var("BUSWATCH_SUBST_TEST_A", "alpha");
        env::set_var("BUSWATCH_SUBST_TEST_B", "beta");

        let out = substitute_env_vars("a: ${BUSWATCH_SUBST_TEST_A}\nb: $BUSWATCH_SUBST_TEST_B\n").unwrap();
        assert_eq!(out, "a: alpha\nb: beta\n");
    }

    #[test]
    fn test_unset_variable_is_kept() {
        let out = substitute_env_vars("key: \"${BUSWATCH_SUBST_TEST_UNSET}\"").unwrap();
        assert_eq!(out, "key: \"${BUSWATCH_SUBST_TEST_UNSET}\"");
        assert!(has_unresolved_env_vars(&out));
        assert_eq!(unresolved_env_vars(&out), vec!["BUSWATCH_SUBST_TEST_UNSET"]);
    }

    #[test]
    fn test_plain_text_has_no_placeholders() {
        assert!(!has_unresolved_env_vars("postgres://localhost/buswatch"));
        assert_eq!(
            get_env_or_default("BUSWATCH_SUBST_TEST_NOPE", "fallback"),
            "fallback"
        );
    }
}
