// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Errors raised at the external service boundary

use thiserror::Error;

/// Failure of a single external call. Never fatal to the session loop.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned no content")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unrecognized risk level '{0}'")]
    UnknownRiskLevel(String),

    #[error("no API key configured (set {0})")]
    MissingApiKey(String),
}
