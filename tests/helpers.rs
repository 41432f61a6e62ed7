/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use flickr::rest::{
    Client, Config, Creds, FlickrError, HttpBody, HttpCall, HttpMethod, MemoryTokenStore,
    TokenStore, Transport,
};
use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Mutex};

pub(crate) const API_KEY: &str = "test-api-key";
pub(crate) const SECRET: &str = "test-shared-secret";

/// What the client handed to the transport
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: HttpMethod,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub declared_len: Option<u64>,
}

#[allow(dead_code)]
impl RecordedCall {
    /// Query string pairs for GET, form pairs for url-encoded POST
    pub fn params(&self) -> Vec<(String, String)> {
        let encoded = match self.method {
            HttpMethod::Get => self.url.split_once('?').map(|(_, q)| q.to_string()),
            HttpMethod::Post => Some(self.body_text()),
            HttpMethod::Multipart => None,
        };
        encoded
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.params()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Replays canned response bodies in order and records every call
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<String, FlickrError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn push(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_err(&self, err: FlickrError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

impl Transport for MockTransport {
    fn execute(&self, call: HttpCall) -> Result<String, FlickrError> {
        let (body, declared_len) = match call.body {
            HttpBody::Empty => (Vec::new(), None),
            HttpBody::Text(text) => (text.into_bytes(), None),
            HttpBody::Stream { mut reader, len } => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                assert_eq!(buf.len() as u64, len, "declared length differs from body");
                (buf, Some(len))
            }
        };
        self.calls.lock().unwrap().push(RecordedCall {
            method: call.method,
            url: call.url,
            content_type: call.content_type,
            body,
            declared_len,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FlickrError::Protocol("no canned response left".into())))
    }
}

pub(crate) struct Harness {
    pub client: Client,
    pub transport: Arc<MockTransport>,
    pub store: Arc<MemoryTokenStore>,
}

#[allow(dead_code)]
pub(crate) fn test_config(shared_secret: Option<&str>) -> Config {
    Config::new(Creds::from_tokens(API_KEY, shared_secret))
}

#[allow(dead_code)]
pub(crate) fn harness() -> Harness {
    harness_with(test_config(Some(SECRET)))
}

#[allow(dead_code)]
pub(crate) fn harness_with(config: Config) -> Harness {
    init_logging();
    let transport = Arc::new(MockTransport::default());
    let store = Arc::new(MemoryTokenStore::default());
    let client = Client::builder(config)
        .transport(transport.clone())
        .token_store(store.clone())
        .build()
        .unwrap();
    Harness {
        client,
        transport,
        store,
    }
}

#[allow(dead_code)]
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub(crate) fn ok(inner: &str) -> String {
    format!(r#"<?xml version="1.0" encoding="utf-8" ?><rsp stat="ok">{inner}</rsp>"#)
}

#[allow(dead_code)]
pub(crate) fn fail(code: u32, msg: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?><rsp stat="fail"><err code="{code}" msg="{msg}" /></rsp>"#
    )
}

#[allow(dead_code)]
pub(crate) fn frob(frob: &str) -> String {
    ok(&format!("<frob>{frob}</frob>"))
}

#[allow(dead_code)]
pub(crate) fn auth(token: &str, perms: &str, nsid: &str, username: &str) -> String {
    ok(&format!(
        r#"<auth><token>{token}</token><perms>{perms}</perms><user nsid="{nsid}" username="{username}" fullname="" /></auth>"#
    ))
}

#[allow(dead_code)]
pub(crate) fn photo_xml(id: &str) -> String {
    format!(
        r#"<photo id="{id}" owner="12345@N01" secret="abc" server="65535" title="Photo {id}" ispublic="1" isfriend="0" isfamily="0" />"#
    )
}

/// A `<photos>` page holding `ids`, `pages` omitted when `None`
#[allow(dead_code)]
pub(crate) fn photos_page<I>(pages: Option<u32>, ids: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let photos: String = ids.into_iter().map(|id| photo_xml(&id)).collect();
    let pages = pages
        .map(|p| format!(r#" pages="{p}""#))
        .unwrap_or_default();
    ok(&format!(r#"<photos page="1"{pages} perpage="500">{photos}</photos>"#))
}

/// Completes a mocked authentication as `nsid` holding `perms`
#[allow(dead_code)]
pub(crate) fn authenticate(h: &Harness, nsid: &str, perms: flickr::rest::Permission) {
    let perms: &'static str = perms.into();
    h.transport.push(frob("frob-1"));
    h.transport.push(auth(&format!("token-{nsid}"), perms, nsid, "tester"));
    h.client.begin_auth(perms.parse().unwrap()).unwrap();
    h.client.complete_auth().unwrap();
}

#[allow(dead_code)]
pub(crate) fn stored(h: &Harness, key: &str) -> Option<String> {
    h.store.get(key).unwrap()
}

#[allow(dead_code)]
pub(crate) fn get_read_only_creds() -> anyhow::Result<Creds> {
    let api_key = std::env::var("FLICKR_API_KEY")?;
    Ok(Creds::from_tokens(&api_key, None))
}

#[allow(dead_code)]
pub(crate) fn get_signing_creds() -> anyhow::Result<Creds> {
    let api_key = std::env::var("FLICKR_API_KEY")?;
    let shared_secret = std::env::var("FLICKR_SHARED_SECRET")?;
    Ok(Creds::from_tokens(&api_key, Some(shared_secret.as_str())))
}
