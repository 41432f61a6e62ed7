/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::macros::list_envelope;
use crate::rest::paginator::Paginator;
use crate::rest::parsers::from_flag;
use crate::rest::photo::PhotoListResponse;
use crate::rest::{Client, FlickrError, HttpMethod, Request};
use serde::Deserialize;

/// A group as listed by the group search and membership methods
#[derive(Deserialize, Debug, Clone)]
pub struct Group {
    #[serde(skip)]
    pub(crate) client: Option<Client>,

    #[serde(rename = "@nsid", alias = "@id")]
    pub id: String,

    #[serde(default, rename = "@name")]
    pub name: String,

    #[serde(default, rename = "@eighteenplus", deserialize_with = "from_flag")]
    pub is_adult: bool,
}

impl Group {
    /// Groups whose name or description matches `text`
    pub fn search(
        client: &Client,
        text: &str,
    ) -> Result<Paginator<GroupListResponse>, FlickrError> {
        if text.trim().is_empty() {
            return Err(FlickrError::InvalidParameter(
                "group search needs some text".into(),
            ));
        }
        let req = Request::call(client, HttpMethod::Get, "flickr.groups.search")?
            .with_parameter("text", text);
        Ok(Paginator::new(req))
    }

    /// Photos in the group's pool
    pub fn photos(&self) -> Result<Paginator<PhotoListResponse>, FlickrError> {
        let client = self.client.as_ref().ok_or(FlickrError::ClientNotFound())?;
        let req = Request::call(client, HttpMethod::Get, "flickr.groups.pools.getPhotos")?
            .with_parameter("group_id", &self.id);
        Ok(Paginator::new(req))
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Group {}

#[derive(Deserialize, Debug)]
pub struct GroupListResponse {
    groups: Option<GroupContainer>,
}

#[derive(Deserialize, Debug)]
struct GroupContainer {
    #[serde(rename = "@pages")]
    pages: Option<u32>,

    #[serde(default, rename = "group")]
    items: Vec<Group>,
}

list_envelope!(GroupListResponse, Group, groups);
