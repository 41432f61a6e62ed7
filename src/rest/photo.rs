/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::macros::list_envelope;
use crate::rest::paginator::Paginator;
use crate::rest::parsers::{from_empty_str_to_none, from_flag, from_unix_timestamp};
use crate::rest::upload::{UploadOutcome, replace_photo};
use crate::rest::{Client, FlickrError, HttpMethod, PrivacyFilter, Request, TagMode, Upload};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const PHOTOS_ORIGIN: &str = "https://www.flickr.com/photos/";

/// A photo as listed by the search and list methods.
///
/// See [Flickr API Docs](https://www.flickr.com/services/api/flickr.photos.search.html) for more
/// details on the individual fields.
#[derive(Deserialize, Debug, Clone)]
pub struct Photo {
    #[serde(skip)]
    pub(crate) client: Option<Client>,

    #[serde(rename = "@id")]
    pub id: String,

    // Missing from photoset listings, where the set's owner applies
    #[serde(default, rename = "@owner", deserialize_with = "from_empty_str_to_none")]
    pub owner: Option<String>,

    #[serde(default, rename = "@secret")]
    pub secret: String,

    #[serde(default, rename = "@server")]
    pub server: String,

    #[serde(default, rename = "@title")]
    pub title: String,

    #[serde(default, rename = "@ispublic", deserialize_with = "from_flag")]
    pub is_public: bool,

    #[serde(default, rename = "@isfriend", deserialize_with = "from_flag")]
    pub is_friend: bool,

    #[serde(default, rename = "@isfamily", deserialize_with = "from_flag")]
    pub is_family: bool,

    // Only present when requested through `extras=date_upload`
    #[serde(default, rename = "@dateupload", deserialize_with = "from_unix_timestamp")]
    pub date_uploaded: Option<DateTime<Utc>>,
}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Photo {}

impl Photo {
    /// Photos tagged with any of `tags`, or with all of them when `join_all` is set
    pub fn find_by_tags(
        client: &Client,
        tags: &[&str],
        join_all: bool,
    ) -> Result<Paginator<PhotoListResponse>, FlickrError> {
        let mode = if join_all { TagMode::All } else { TagMode::Any };
        let search = PhotoSearch {
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            tag_mode: mode,
            ..Default::default()
        };
        Self::search(client, &search)
    }

    /// Photos matching the search.
    ///
    /// Unauthenticated calls see public photos only. When the thread's auth
    /// context is set, private photos visible to that user are included.
    pub fn search(
        client: &Client,
        search: &PhotoSearch,
    ) -> Result<Paginator<PhotoListResponse>, FlickrError> {
        let mut req = Request::call(client, HttpMethod::Get, "flickr.photos.search")?;
        search.apply(&mut req)?;
        Ok(Paginator::new(req))
    }

    /// The latest public photos
    pub fn recent(client: &Client) -> Result<Paginator<PhotoListResponse>, FlickrError> {
        let req = Request::call(client, HttpMethod::Get, "flickr.photos.getRecent")?;
        Ok(Paginator::new(req))
    }

    /// The photos of a photoset
    pub fn from_photoset(
        client: &Client,
        photoset_id: &str,
    ) -> Result<Paginator<PhotoListResponse>, FlickrError> {
        let req = Request::call(client, HttpMethod::Get, "flickr.photosets.getPhotos")?
            .with_parameter("photoset_id", photoset_id);
        Ok(Paginator::new(req))
    }

    /// The web page displaying this photo, `None` when the owner is unknown
    pub fn page_url(&self) -> Result<Option<String>, FlickrError> {
        let Some(owner) = &self.owner else {
            return Ok(None);
        };
        let page = url::Url::parse(PHOTOS_ORIGIN)?
            .join(&format!("{owner}/"))?
            .join(&self.id)?;
        Ok(Some(page.into()))
    }

    /// Replaces the image of this photo, keeping its metadata
    pub fn replace(
        &self,
        upload: Upload,
        asynchronous: bool,
    ) -> Result<UploadOutcome, FlickrError> {
        let client = self.client.as_ref().ok_or(FlickrError::ClientNotFound())?;
        replace_photo(client, &self.id, upload, asynchronous)
    }
}

/// Terms of a photo search, at least one of user, tags, text, privacy or
/// upload date must be given
#[derive(Debug, Clone, Default)]
pub struct PhotoSearch {
    /// Restrict to the photos of this user
    pub user: Option<String>,
    pub tags: Vec<String>,
    pub tag_mode: TagMode,
    /// Free text matched against title, description and tags
    pub text: Option<String>,
    pub privacy: Option<PrivacyFilter>,
    pub min_upload_date: Option<DateTime<Utc>>,
}

impl PhotoSearch {
    fn apply(&self, req: &mut Request) -> Result<(), FlickrError> {
        let mut has_term = false;

        if let Some(user) = &self.user {
            has_term = true;
            req.set_parameter("user_id", user);
        }

        if !self.tags.is_empty() {
            has_term = true;
            let mode: &'static str = self.tag_mode.into();
            req.set_parameter("tags", self.tags.join(","));
            req.set_parameter("tag_mode", mode);
        }

        if let Some(text) = &self.text {
            has_term = true;
            req.set_parameter("text", text);
        }

        if let Some(privacy) = self.privacy {
            has_term = true;
            req.set_parameter("privacy_filter", u8::from(privacy).to_string());
        }

        if let Some(date) = self.min_upload_date {
            has_term = true;
            req.set_parameter("min_upload_date", date.timestamp().to_string());
        }

        if !has_term {
            return Err(FlickrError::InvalidParameter(
                "photo search needs at least one search term".into(),
            ));
        }
        Ok(())
    }
}

/// Response of the photo list methods, either a `<photos>` or a `<photoset>` page
#[derive(Deserialize, Debug)]
pub struct PhotoListResponse {
    photos: Option<PhotoContainer>,
    photoset: Option<PhotoContainer>,
}

#[derive(Deserialize, Debug)]
struct PhotoContainer {
    #[serde(rename = "@pages")]
    pages: Option<u32>,

    #[serde(default, rename = "photo")]
    items: Vec<Photo>,
}

list_envelope!(PhotoListResponse, Photo, photos, photoset);
