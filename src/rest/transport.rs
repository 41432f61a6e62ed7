/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::{FlickrError, HttpMethod};
use reqwest::header::CONTENT_TYPE;
use std::io::Read;
use std::time::Duration;

/// Body of an outgoing call
pub enum HttpBody {
    Empty,
    Text(String),
    /// Fixed-length streamed body, `len` must equal the number of bytes `reader` yields
    Stream {
        reader: Box<dyn Read + Send>,
        len: u64,
    },
}

impl std::fmt::Debug for HttpBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Stream { len, .. } => f.debug_struct("Stream").field("len", len).finish(),
        }
    }
}

/// A fully prepared HTTP exchange
#[derive(Debug)]
pub struct HttpCall {
    pub method: HttpMethod,
    pub url: String,
    pub content_type: Option<String>,
    pub body: HttpBody,
}

/// Performs the HTTP exchange and hands back the raw response body.
///
/// Calls block the current thread until the exchange completes or fails.
pub trait Transport: Send + Sync {
    fn execute(&self, call: HttpCall) -> Result<String, FlickrError>;
}

/// Default [`Transport`] backed by a blocking reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    https_client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FlickrError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            https_client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, call: HttpCall) -> Result<String, FlickrError> {
        let mut req = match call.method {
            HttpMethod::Get => self.https_client.get(&call.url),
            HttpMethod::Post | HttpMethod::Multipart => self.https_client.post(&call.url),
        };
        if let Some(content_type) = call.content_type {
            req = req.header(CONTENT_TYPE, content_type);
        }
        req = match call.body {
            HttpBody::Empty => req,
            HttpBody::Text(text) => req.body(text),
            HttpBody::Stream { reader, len } => {
                req.body(reqwest::blocking::Body::sized(reader, len))
            }
        };

        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FlickrError::HttpStatus(status.as_u16()));
        }
        Ok(resp.text()?)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish()
    }
}
