/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::multipart::MultipartBody;
use crate::rest::signer::{SIGNATURE_PARAM, sign};
use crate::rest::{
    Client, FlickrError, HttpBody, HttpCall, HttpMethod, ProgressObserver, Upload,
};
use log::{debug, error};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Value of a request parameter
#[derive(Debug, Clone)]
pub enum ParamValue {
    Text(String),
    /// Only valid on [`HttpMethod::Multipart`] requests
    File(Upload),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Upload> for ParamValue {
    fn from(value: Upload) -> Self {
        Self::File(value)
    }
}

/// A single call to the service.
///
/// Every request carries the configured API key. It carries an auth token when
/// built for a user, either explicitly with [`Request::for_user`] or implicitly
/// from the calling thread's auth context with [`Request::new`].
///
/// Sending consumes the request, a request is never reused.
#[derive(Clone)]
pub struct Request {
    client: Client,
    method: HttpMethod,
    base_url: String,
    parameters: BTreeMap<String, ParamValue>,
    auth_user: Option<String>,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl Request {
    /// Creates a request authenticated as the calling thread's auth context user, if any
    pub fn new(client: &Client, method: HttpMethod, base_url: &str) -> Result<Self, FlickrError> {
        let user = client.auth_context();
        Self::for_user(client, method, base_url, user.as_deref())
    }

    /// Creates a request against the REST endpoint for the given API method
    pub fn call(
        client: &Client,
        method: HttpMethod,
        api_method: &str,
    ) -> Result<Self, FlickrError> {
        let mut req = Self::new(client, method, &client.config().rest_url)?;
        req.set_parameter("method", api_method);
        Ok(req)
    }

    /// Creates a request authenticated as `user`, ignoring any thread auth context.
    ///
    /// Fails with [`FlickrError::Auth`] when `user` has no valid token.
    pub fn for_user(
        client: &Client,
        method: HttpMethod,
        base_url: &str,
        user: Option<&str>,
    ) -> Result<Self, FlickrError> {
        let mut req = Self::unauthenticated(client, method, base_url)?;
        if let Some(nsid) = user {
            let token = client.token_for(nsid)?.ok_or_else(|| {
                FlickrError::Auth(format!("Can't get token for unauthorized user {nsid}"))
            })?;
            req.set_parameter("auth_token", token.token());
            req.auth_user = Some(nsid.to_string());
        }
        Ok(req)
    }

    /// Creates a request carrying only the API key
    pub fn unauthenticated(
        client: &Client,
        method: HttpMethod,
        base_url: &str,
    ) -> Result<Self, FlickrError> {
        client.config().validate()?;
        let mut req = Self {
            client: client.clone(),
            method,
            base_url: base_url.to_string(),
            parameters: BTreeMap::new(),
            auth_user: None,
            observers: Vec::new(),
        };
        req.set_parameter("api_key", client.config().creds.api_key());
        Ok(req)
    }

    /// Sets a parameter, replacing any previous value with the same name
    pub fn set_parameter(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> &mut Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// User whose token was attached, if any
    pub fn auth_user(&self) -> Option<&str> {
        self.auth_user.as_deref()
    }

    /// Registers an observer notified while file parameters are streamed
    pub fn add_progress_observer(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// The URL the request is sent to.
    ///
    /// GET requests carry every parameter in the query string, sorted by name,
    /// followed by the signature when signing is enabled.
    pub fn url(&self) -> Result<String, FlickrError> {
        match self.method {
            HttpMethod::Get => Ok(format!("{}?{}", self.base_url, self.encoded_params()?)),
            HttpMethod::Post | HttpMethod::Multipart => Ok(self.base_url.clone()),
        }
    }

    fn text_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().filter_map(|(name, value)| match value {
            ParamValue::Text(text) => Some((name.as_str(), text.as_str())),
            ParamValue::File(_) => None,
        })
    }

    fn signature(&self) -> Option<String> {
        self.client
            .config()
            .creds
            .shared_secret()
            .map(|secret| sign(secret, self.text_params()))
    }

    fn encoded_params(&self) -> Result<String, FlickrError> {
        let mut pairs = Vec::with_capacity(self.parameters.len() + 1);
        for (name, value) in &self.parameters {
            match value {
                ParamValue::Text(text) => pairs.push(format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(text)
                )),
                ParamValue::File(_) => {
                    return Err(FlickrError::InvalidParameter(format!(
                        "file parameter `{name}` requires a multipart request"
                    )));
                }
            }
        }
        if let Some(signature) = self.signature() {
            pairs.push(format!("{SIGNATURE_PARAM}={signature}"));
        }
        Ok(pairs.join("&"))
    }

    fn into_http_call(mut self) -> Result<HttpCall, FlickrError> {
        match self.method {
            HttpMethod::Get => Ok(HttpCall {
                method: HttpMethod::Get,
                url: self.url()?,
                content_type: None,
                body: HttpBody::Empty,
            }),
            HttpMethod::Post => Ok(HttpCall {
                method: HttpMethod::Post,
                url: self.base_url.clone(),
                content_type: Some(FORM_CONTENT_TYPE.to_string()),
                body: HttpBody::Text(self.encoded_params()?),
            }),
            HttpMethod::Multipart => {
                let signature = self.signature().ok_or_else(|| {
                    FlickrError::Config("multipart uploads require a shared secret".into())
                })?;
                self.parameters
                    .insert(SIGNATURE_PARAM.to_string(), ParamValue::Text(signature));
                let body = MultipartBody::new(&self.parameters, &self.observers)?;
                Ok(HttpCall {
                    method: HttpMethod::Multipart,
                    url: self.base_url.clone(),
                    content_type: Some(body.content_type()),
                    body: HttpBody::Stream {
                        len: body.len,
                        reader: Box::new(body.reader),
                    },
                })
            }
        }
    }

    /// Sends the request and verifies the response envelope.
    ///
    /// A rejected auth token evicts the user's cached and persisted token before
    /// the error is returned.
    pub fn send(self) -> Result<Response, FlickrError> {
        let client = self.client.clone();
        let sent_token = match (&self.auth_user, self.parameters.get("auth_token")) {
            (Some(nsid), Some(ParamValue::Text(token))) => Some((nsid.clone(), token.clone())),
            _ => None,
        };
        if let Some(ParamValue::Text(api_method)) = self.parameters.get("method") {
            debug!("{} {} method={}", self.method, self.base_url, api_method);
        } else {
            debug!("{} {}", self.method, self.base_url);
        }

        let call = self.into_http_call()?;
        let body = client.transport().execute(call)?;
        match Response::from_body(body) {
            Err(err) if err.is_invalid_token() => {
                if let Some((nsid, token)) = sent_token {
                    client.evict_token(&nsid, &token);
                }
                Err(err)
            }
            other => other,
        }
    }

    /// Sends the request and deserializes the payload as `T`
    pub fn fetch<T: DeserializeOwned>(self) -> Result<T, FlickrError> {
        self.send()?.payload()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("parameters", &self.parameters.keys().collect::<Vec<_>>())
            .field("auth_user", &self.auth_user)
            .finish()
    }
}

/// A successful response.
///
/// The envelope has been checked, the payload is left for the caller to
/// deserialize into whatever shape the called method returns.
#[derive(Debug, Clone)]
pub struct Response {
    body: String,
}

impl Response {
    pub(crate) fn from_body(body: String) -> Result<Self, FlickrError> {
        let envelope: Envelope = quick_xml::de::from_str(&body)
            .map_err(|e| FlickrError::Protocol(format!("unparsable response: {e}")))?;
        match envelope.stat.as_deref() {
            Some("ok") => Ok(Self { body }),
            Some(_) => {
                let err = envelope.err.ok_or_else(|| {
                    FlickrError::Protocol("failure response without an err element".into())
                })?;
                Err(FlickrError::Service {
                    code: err.code(),
                    message: err.msg,
                })
            }
            None => Err(FlickrError::Protocol(
                "response envelope is missing the stat attribute".into(),
            )),
        }
    }

    /// Deserializes the payload, the envelope root's attributes and children map onto `T`
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, FlickrError> {
        Ok(quick_xml::de::from_str(&self.body)?)
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

// Uniform wrapper around every response
#[derive(Deserialize, Debug)]
struct Envelope {
    #[serde(rename = "@stat")]
    stat: Option<String>,

    err: Option<ErrorElement>,
}

#[derive(Deserialize, Debug)]
struct ErrorElement {
    #[serde(rename = "@code")]
    code: Option<String>,

    #[serde(default, rename = "@msg")]
    msg: String,
}

impl ErrorElement {
    fn code(&self) -> u32 {
        match self.code.as_deref().map(str::parse::<u32>) {
            Some(Ok(code)) => code,
            _ => {
                error!("Unexpected error code returned, continuing: {:?}", self.code);
                0
            }
        }
    }
}
