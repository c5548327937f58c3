//! Environment variable expansion for configuration strings.
//!
//! Supports `${VAR}` (error if unset) and `${VAR:-default}`. Path fields
//! additionally expand a leading `~` to the home directory.

use crate::ConfigError;

/// Expand `${}` references in a plain string value.
///
/// Bare `$VAR` is left alone, and strings without `${` are returned as-is.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| unset_error(field, &e.var_name))
}

/// Expand `${}` references and a leading `~` in a path value.
pub(crate) fn expand_path(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") && !value.starts_with('~') {
        return Ok(value.to_owned());
    }

    shellexpand::full_with_context(value, home_dir, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| unset_error(field, &e.var_name))
}

fn lookup(var: &str) -> Result<Option<String>, std::env::VarError> {
    std::env::var(var).map(Some)
}

fn home_dir() -> Option<String> {
    std::env::var("HOME").ok()
}

fn unset_error(field: &str, var_name: &str) -> ConfigError {
    ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{var_name}}} not set"),
    }
}
