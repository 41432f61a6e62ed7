/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use num_enum::TryFromPrimitive;
use std::io;
use thiserror::Error;

/// Error conditions that can be returned
#[derive(Error, Debug)]
pub enum FlickrError {
    #[error("Configuration error. {0}")]
    Config(String),

    #[error("Request network error")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    #[error("API Response is malformed: {0}")]
    Protocol(String),

    #[error("API Response could not be deserialized: {0}")]
    Deserialization(#[from] quick_xml::DeError),

    #[error("API Response was error: {code}, msg: {message}")]
    Service { code: u32, message: String },

    #[error("Authorization error. {0}")]
    Auth(String),

    #[error("Invalid parameter. {0}")]
    InvalidParameter(String),

    #[error("Client not found")]
    ClientNotFound(),

    #[error("URL Parse error")]
    UrlParsing(#[from] url::ParseError),

    #[error("Token store error: {0}")]
    TokenStore(#[from] serde_json::Error),
}

impl FlickrError {
    /// The well known service code carried by a [`FlickrError::Service`] error, if any
    pub fn service_code(&self) -> Option<ServiceErrorCode> {
        match self {
            Self::Service { code, .. } => ServiceErrorCode::try_from(*code).ok(),
            _ => None,
        }
    }

    /// True when the service rejected the auth token attached to the call
    pub fn is_invalid_token(&self) -> bool {
        self.service_code() == Some(ServiceErrorCode::InvalidAuthToken)
    }

    /// Network level failures which a caller may choose to retry.
    ///
    /// [`FlickrError::Io`] is local, such as an unreadable upload file, and
    /// is not a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus(_))
    }

    /// The response did not match the expected envelope or payload shape
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Deserialization(_))
    }
}

/// Error codes shared by every method of the REST API.
///
/// Code `1` is method specific but nearly always means "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum ServiceErrorCode {
    NotFound = 1,
    InvalidSignature = 96,
    MissingSignature = 97,
    InvalidAuthToken = 98,
    InsufficientPermissions = 99,
    InvalidApiKey = 100,
    ServiceUnavailable = 105,
    InvalidFrob = 108,
    FormatNotFound = 111,
    MethodNotFound = 112,
    BadUrl = 116,
}
