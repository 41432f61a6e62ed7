/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::parsers::{from_flag, from_ticket_status, from_unix_timestamp};
use crate::rest::{
    Client, ContentType, FlickrError, HttpMethod, ProgressObserver, Request, SafetyLevel,
    TicketStatus, Upload,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Result of an upload or replace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Processed synchronously, holds the photo id
    Photo(String),
    /// Queued for asynchronous processing, holds the ticket id to poll with [`check_tickets`]
    Ticket(String),
}

/// A new photo to upload.
///
/// Uploads are made as the calling thread's auth context user, who needs
/// [`Permission::Write`](crate::rest::Permission::Write).
///
/// ```rust,no_run
/// use flickr::rest::{Client, FlickrError, PhotoUpload, Upload, UploadOutcome};
///
/// fn upload(client: &Client) -> Result<UploadOutcome, FlickrError> {
///     PhotoUpload::new(Upload::from_path("/tmp/beach.jpg"))
///         .title("Beach")
///         .tags(["summer", "sea"])
///         .public(false)
///         .send(client)
/// }
/// ```
#[derive(Clone)]
pub struct PhotoUpload {
    file: Upload,
    title: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    is_public: Option<bool>,
    is_friend: Option<bool>,
    is_family: Option<bool>,
    safety_level: Option<SafetyLevel>,
    content_type: Option<ContentType>,
    hidden: Option<bool>,
    asynchronous: bool,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl PhotoUpload {
    pub fn new(file: Upload) -> Self {
        Self {
            file,
            title: None,
            description: None,
            tags: Vec::new(),
            is_public: None,
            is_friend: None,
            is_family: None,
            safety_level: None,
            content_type: None,
            hidden: None,
            asynchronous: false,
            observers: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    pub fn friend(mut self, is_friend: bool) -> Self {
        self.is_friend = Some(is_friend);
        self
    }

    pub fn family(mut self, is_family: bool) -> Self {
        self.is_family = Some(is_family);
        self
    }

    pub fn safety_level(mut self, level: SafetyLevel) -> Self {
        self.safety_level = Some(level);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Hides the photo from public searches
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Returns a ticket immediately instead of waiting for processing
    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn into_request(self, client: &Client) -> Result<Request, FlickrError> {
        let mut req = Request::new(client, HttpMethod::Multipart, &client.config().upload_url)?;
        req.set_parameter("photo", self.file);

        if let Some(title) = self.title.filter(|t| !t.is_empty()) {
            req.set_parameter("title", title);
        }
        if let Some(description) = self.description.filter(|d| !d.is_empty()) {
            req.set_parameter("description", description);
        }
        if !self.tags.is_empty() {
            req.set_parameter("tags", self.tags.join(" "));
        }

        let flags = [
            ("is_public", self.is_public),
            ("is_friend", self.is_friend),
            ("is_family", self.is_family),
        ];
        for (name, flag) in flags {
            if let Some(flag) = flag {
                req.set_parameter(name, flag_param(flag));
            }
        }
        if let Some(level) = self.safety_level {
            req.set_parameter("safety_level", u8::from(level).to_string());
        }
        if let Some(content_type) = self.content_type {
            req.set_parameter("content_type", u8::from(content_type).to_string());
        }
        if let Some(hidden) = self.hidden {
            req.set_parameter("hidden", if hidden { "2" } else { "1" });
        }
        if self.asynchronous {
            req.set_parameter("async", "1");
        }

        for observer in self.observers {
            req.add_progress_observer(observer);
        }
        Ok(req)
    }

    /// Uploads the photo
    pub fn send(self, client: &Client) -> Result<UploadOutcome, FlickrError> {
        self.into_request(client)?
            .fetch::<UploadResponse>()?
            .into_outcome()
    }
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file", &self.file.label())
            .field("title", &self.title)
            .field("tags", &self.tags)
            .field("asynchronous", &self.asynchronous)
            .finish_non_exhaustive()
    }
}

fn flag_param(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

/// Replaces the image of an existing photo
pub fn replace_photo(
    client: &Client,
    photo_id: &str,
    file: Upload,
    asynchronous: bool,
) -> Result<UploadOutcome, FlickrError> {
    if photo_id.is_empty() {
        return Err(FlickrError::InvalidParameter(
            "can't replace a photo without its id".into(),
        ));
    }
    let mut req = Request::new(client, HttpMethod::Multipart, &client.config().replace_url)?
        .with_parameter("photo", file)
        .with_parameter("photo_id", photo_id);
    if asynchronous {
        req.set_parameter("async", "1");
    }
    req.fetch::<UploadResponse>()?.into_outcome()
}

// Response of the upload and replace endpoints
#[derive(Deserialize, Debug)]
struct UploadResponse {
    photoid: Option<String>,
    ticketid: Option<String>,
}

impl UploadResponse {
    fn into_outcome(self) -> Result<UploadOutcome, FlickrError> {
        let clean = |id: String| Some(id.trim().to_string()).filter(|id| !id.is_empty());
        if let Some(id) = self.photoid.and_then(clean) {
            return Ok(UploadOutcome::Photo(id));
        }
        if let Some(id) = self.ticketid.and_then(clean) {
            return Ok(UploadOutcome::Ticket(id));
        }
        Err(FlickrError::Protocol(
            "upload response has neither a photo id nor a ticket id".into(),
        ))
    }
}

/// State of an asynchronous upload
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(default, rename = "@complete", deserialize_with = "from_ticket_status")]
    pub status: TicketStatus,

    /// The ticket id is unknown to the service
    #[serde(default, rename = "@invalid", deserialize_with = "from_flag")]
    pub invalid: bool,

    #[serde(default, rename = "@photoid")]
    pub photo_id: Option<String>,

    #[serde(default, rename = "@imported", deserialize_with = "from_unix_timestamp")]
    pub imported: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
struct TicketsResponse {
    uploader: TicketList,
}

#[derive(Deserialize, Debug)]
struct TicketList {
    #[serde(default)]
    ticket: Vec<Ticket>,
}

/// Polls the processing state of asynchronous uploads
pub fn check_tickets(client: &Client, ticket_ids: &[&str]) -> Result<Vec<Ticket>, FlickrError> {
    if ticket_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(
        Request::call(client, HttpMethod::Get, "flickr.photos.upload.checkTickets")?
            .with_parameter("tickets", ticket_ids.join(","))
            .fetch::<TicketsResponse>()?
            .uploader
            .ticket,
    )
}
