/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::group::GroupListResponse;
use crate::rest::paginator::Paginator;
use crate::rest::parsers::{from_empty_str_to_none, from_flag};
use crate::rest::photo::PhotoListResponse;
use crate::rest::{Client, FlickrError, HttpMethod, Request};
use serde::Deserialize;

/// Holds information returned from `flickr.people.getInfo`.
///
/// See [Flickr API Docs](https://www.flickr.com/services/api/flickr.people.getInfo.html) for more
/// details on the individual fields.
#[derive(Deserialize, Debug, Clone)]
pub struct User {
    #[serde(skip)]
    pub(crate) client: Option<Client>,

    #[serde(rename = "@nsid")]
    pub nsid: String,

    #[serde(default, rename = "@ispro", deserialize_with = "from_flag")]
    pub is_pro: bool,

    #[serde(default)]
    pub username: String,

    #[serde(default, deserialize_with = "from_empty_str_to_none")]
    pub realname: Option<String>,

    #[serde(default, deserialize_with = "from_empty_str_to_none")]
    pub location: Option<String>,

    #[serde(default, rename = "photosurl", deserialize_with = "from_empty_str_to_none")]
    pub photos_url: Option<String>,

    #[serde(default, rename = "profileurl", deserialize_with = "from_empty_str_to_none")]
    pub profile_url: Option<String>,

    #[serde(default)]
    photos: Option<PhotoStats>,
}

#[derive(Deserialize, Debug, Clone)]
struct PhotoStats {
    count: Option<u64>,
}

impl User {
    /// Returns information for the user with the given id
    pub fn from_nsid(client: &Client, nsid: &str) -> Result<Self, FlickrError> {
        Request::call(client, HttpMethod::Get, "flickr.people.getInfo")?
            .with_parameter("user_id", nsid)
            .fetch::<UserResponse>()
            .map(|mut v| {
                v.person.client = Some(client.clone());
                v.person
            })
    }

    /// Looks a user up by screen name
    pub fn find_by_username(client: &Client, username: &str) -> Result<Self, FlickrError> {
        let found = Request::call(client, HttpMethod::Get, "flickr.people.findByUsername")?
            .with_parameter("username", username)
            .fetch::<FoundUserResponse>()?;
        Self::from_nsid(client, &found.user.nsid)
    }

    /// Looks a user up by email address
    pub fn find_by_email(client: &Client, email: &str) -> Result<Self, FlickrError> {
        let found = Request::call(client, HttpMethod::Get, "flickr.people.findByEmail")?
            .with_parameter("find_email", email)
            .fetch::<FoundUserResponse>()?;
        Self::from_nsid(client, &found.user.nsid)
    }

    /// Number of photos the user has posted, if reported
    pub fn photo_count(&self) -> Option<u64> {
        self.photos.as_ref().and_then(|p| p.count)
    }

    /// Every public photo of this user
    pub fn public_photos(&self) -> Result<Paginator<PhotoListResponse>, FlickrError> {
        let client = self.client.as_ref().ok_or(FlickrError::ClientNotFound())?;
        let req = Request::call(client, HttpMethod::Get, "flickr.people.getPublicPhotos")?
            .with_parameter("user_id", &self.nsid);
        Ok(Paginator::new(req))
    }

    /// Groups this user publicly belongs to
    pub fn public_groups(&self) -> Result<Paginator<GroupListResponse>, FlickrError> {
        let client = self.client.as_ref().ok_or(FlickrError::ClientNotFound())?;
        let req = Request::call(client, HttpMethod::Get, "flickr.people.getPublicGroups")?
            .with_parameter("user_id", &self.nsid);
        Ok(Paginator::new(req))
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.nsid == other.nsid
    }
}

impl Eq for User {}

#[derive(Deserialize, Debug)]
struct UserResponse {
    person: User,
}

// findByUsername and findByEmail only return the id
#[derive(Deserialize, Debug)]
struct FoundUserResponse {
    user: FoundUser,
}

#[derive(Deserialize, Debug)]
struct FoundUser {
    #[serde(rename = "@nsid")]
    nsid: String,
}
