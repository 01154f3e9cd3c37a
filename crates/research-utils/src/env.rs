//! Environment variable helpers for provider configuration

/// Read an environment variable, falling back to a default
pub fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read a required environment variable
pub fn require_env(name: &str) -> Result<String, String> {
    std::env::var(name).map_err(|_| format!("{name} environment variable not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("RESEARCH_UNSET_VAR_FOR_TEST", "fallback"), "fallback");
    }

    #[test]
    fn test_require_env_missing() {
        let err = require_env("RESEARCH_UNSET_VAR_FOR_TEST").unwrap_err();
        assert!(err.contains("RESEARCH_UNSET_VAR_FOR_TEST"));
    }
}
