use thiserror::Error;

/// Errors raised while talking to the episode API or mapping its records
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API request failed ({status}) for {url}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    DecodeFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Episode '{id}' has an unreadable publish date '{value}'")]
    InvalidDate { id: String, value: String },
}

/// Errors raised by the audio backend
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio output: {0}")]
    OutputUnavailable(#[from] rodio::StreamError),

    #[error("Failed to enumerate audio devices: {0}")]
    Devices(#[from] rodio::cpal::DevicesError),

    #[error("Failed to fetch audio from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode audio from {url}: {source}")]
    DecodeFailed {
        url: String,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("Audio task is no longer running")]
    BackendGone,
}
