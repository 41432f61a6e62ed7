/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # Flickr
//!
//! A blocking client for the Flickr REST API.
//!
//! For further details on the methods refer to the [Flickr API Docs](https://www.flickr.com/services/api/)
//!
//! ## Features
//!
//! - Request signing with the application's shared secret
//! - Token based authentication
//!     - Browser approval round trip (frob exchange)
//!     - Tokens persisted through a pluggable [`rest::TokenStore`]
//!     - Per thread "acting as" user for multi user servers
//! - Paged lists flattened into an iterator
//! - Users, photos and groups (Read only)
//! - Photo upload and replace with progress reporting
//! - Lower level interface for handling the raw communication
//!
//! *If you want to use this library for more than is currently implemented,
//! [`rest::Request`] is a way to call any API method directly*
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! flickr = "0.1.0"
//! ```
//!
//! ## Usage
//!
//! **You will need to acquire an API key/secret from Flickr prior to using the API**
//!
//! ```rust,no_run
//! use flickr::rest::{Client, Creds, Photo, User};
//!
//! fn list_tagged(api_key: &str, secret: &str) -> Result<(), flickr::rest::FlickrError> {
//!     let client = Client::new(Creds::from_tokens(api_key, Some(secret)))?;
//!
//!     // Public data needs no authentication
//!     let user = User::find_by_username(&client, "someone")?;
//!     for photo in user.public_photos()? {
//!         let photo = photo?;
//!         println!("{}: {}", photo.id, photo.title);
//!     }
//!
//!     // At most 10 pages of 500 photos by default
//!     let sunsets = Photo::find_by_tags(&client, &["sunset", "beach"], true)?.fetch_all()?;
//!     println!("{} sunsets", sunsets.len());
//!     Ok(())
//! }
//! ```
//!
pub mod rest;
