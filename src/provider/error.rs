use reqwest::StatusCode;
use thiserror::Error;

/// Errors from provider configuration and HTTP calls.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("environment variable {name} is not set")]
    MissingEnvVar { name: &'static str },

    #[error("failed to build the HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP status {status}")]
    HttpStatus {
        url: String,
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} could not be decoded")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} carried no data payload")]
    EmptyPayload { url: String },
}
