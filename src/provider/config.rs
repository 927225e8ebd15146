use crate::provider::error::ProviderError;

/// Environment variable holding the provider's base URL.
pub const API_URL_VAR: &str = "API_URL";
/// Environment variable holding the `authorization` header value.
pub const AUTHORIZATION_VAR: &str = "AUTHORIZATION";
/// Environment variable holding the `api_key` header value.
pub const API_KEY_VAR: &str = "API_KEY";

/// Connection settings for the forecast provider.
///
/// Every request carries the `authorization` and `api_key` headers;
/// endpoints are resolved against `base_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub authorization: String,
    pub api_key: String,
}

impl ProviderConfig {
    pub fn new(
        base_url: impl Into<String>,
        authorization: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            authorization: authorization.into(),
            api_key: api_key.into(),
        }
    }

    /// Reads the configuration from `API_URL`, `AUTHORIZATION` and
    /// `API_KEY`, honoring a `.env` file in the working directory.
    ///
    /// # Errors
    ///
    /// [`ProviderError::MissingEnvVar`] naming the first absent variable.
    pub fn from_env() -> Result<Self, ProviderError> {
        dotenv::dotenv().ok();
        Ok(Self {
            base_url: required(API_URL_VAR)?,
            authorization: required(AUTHORIZATION_VAR)?,
            api_key: required(API_KEY_VAR)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ProviderError> {
    std::env::var(name).map_err(|_| ProviderError::MissingEnvVar { name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_is_named_in_the_error() {
        std::env::remove_var(API_KEY_VAR);
        std::env::set_var(API_URL_VAR, "http://localhost:9");
        std::env::set_var(AUTHORIZATION_VAR, "token");
        let err = ProviderConfig::from_env().unwrap_err();
        assert!(matches!(err, ProviderError::MissingEnvVar { name } if name == API_KEY_VAR));
        std::env::remove_var(API_URL_VAR);
        std::env::remove_var(AUTHORIZATION_VAR);
    }
}
