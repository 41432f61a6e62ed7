/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod group;
mod macros;
pub mod multipart;
pub mod paginator;
mod parsers;
pub mod photo;
pub mod progress;
pub mod properties;
pub mod request;
pub mod signer;
pub mod store;
pub mod transport;
pub mod upload;
pub mod user;

pub use auth::*;
pub use client::*;
pub use config::*;
pub use errors::*;
pub use group::*;
pub use multipart::*;
pub use paginator::*;
pub use photo::*;
pub use progress::*;
pub use properties::*;
pub use request::*;
pub use signer::*;
pub use store::*;
pub use transport::*;
pub use upload::*;
pub use user::*;
