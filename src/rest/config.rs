/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::FlickrError;
use std::time::Duration;

// REST endpoint every API method is called through
pub const REST_URL: &str = "https://api.flickr.com/services/rest/";

// The user visits this to approve an application
pub const AUTH_URL: &str = "https://www.flickr.com/services/auth/";

pub const UPLOAD_URL: &str = "https://up.flickr.com/services/upload/";

pub const REPLACE_URL: &str = "https://up.flickr.com/services/replace/";

/// Number of items requested per page of a list call
pub const PAGE_SIZE: u32 = 500;

/// Maximum number of pages a list call will fetch
pub const MAX_PAGES: u32 = 10;

/// API credentials issued to the application.
///
/// Requests are signed if and only if a shared secret is present.
#[derive(Default, Clone)]
pub struct Creds {
    api_key: String,
    shared_secret: Option<String>,
}

impl Creds {
    /// Creates credentials from the API key and optional shared secret
    pub fn from_tokens(api_key: &str, shared_secret: Option<&str>) -> Self {
        Self {
            api_key: api_key.into(),
            shared_secret: shared_secret.filter(|s| !s.is_empty()).map(Into::into),
        }
    }

    /// Reads `FLICKR_API_KEY` and the optional `FLICKR_SHARED_SECRET` from the environment
    pub fn from_env() -> Result<Self, FlickrError> {
        let api_key = std::env::var("FLICKR_API_KEY")
            .map_err(|_| FlickrError::Config("FLICKR_API_KEY is not set".into()))?;
        let shared_secret = std::env::var("FLICKR_SHARED_SECRET").ok();
        Ok(Self::from_tokens(&api_key, shared_secret.as_deref()))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn shared_secret(&self) -> Option<&str> {
        self.shared_secret.as_deref()
    }

    pub fn is_signing(&self) -> bool {
        self.shared_secret.is_some()
    }
}

impl std::fmt::Debug for Creds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creds")
            .field("api_key", &"xxx")
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "xxx"))
            .finish()
    }
}

/// Everything a [`crate::rest::Client`] needs to talk to the service.
#[derive(Debug, Clone)]
pub struct Config {
    pub creds: Creds,
    pub rest_url: String,
    pub auth_url: String,
    pub upload_url: String,
    pub replace_url: String,

    /// Items requested per page by list calls
    pub page_size: u32,

    /// Page cap for list calls, 0 turns the cap off
    pub max_pages: u32,

    /// Transport timeout, `None` keeps the HTTP client's default
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(creds: Creds) -> Self {
        Self {
            creds,
            rest_url: REST_URL.into(),
            auth_url: AUTH_URL.into(),
            upload_url: UPLOAD_URL.into(),
            replace_url: REPLACE_URL.into(),
            page_size: PAGE_SIZE,
            max_pages: MAX_PAGES,
            timeout: None,
        }
    }

    pub fn with_rest_url(mut self, url: impl Into<String>) -> Self {
        self.rest_url = url.into();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    pub fn with_replace_url(mut self, url: impl Into<String>) -> Self {
        self.replace_url = url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fails when the credentials were never configured
    pub(crate) fn validate(&self) -> Result<(), FlickrError> {
        if self.creds.api_key.trim().is_empty() {
            return Err(FlickrError::Config("API key not set".into()));
        }
        if self.page_size == 0 {
            return Err(FlickrError::Config("page size must be at least 1".into()));
        }
        Ok(())
    }
}
