/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Authorization tier granted to a token.
///
/// Ordered `Read < Write < Delete`; a higher level also grants every lower one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Delete,
}

impl Permission {
    /// Whether a token holding `self` may perform an action needing `required`
    pub fn satisfies(self, required: Permission) -> bool {
        self >= required
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum HttpMethod {
    #[strum(to_string = "GET")]
    Get,
    #[strum(to_string = "POST")]
    Post,
    /// multipart/form-data POST, used to send files
    #[strum(to_string = "POST multipart")]
    Multipart,
}

/// Join mode for multi-tag searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum TagMode {
    /// Any tag in the list (OR)
    #[default]
    Any,
    /// Every tag in the list (AND)
    All,
}

/// Privacy filter applied to searches of the authenticated user's photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PrivacyFilter {
    Public = 1,
    Friends = 2,
    Family = 3,
    FriendsAndFamily = 4,
    Private = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SafetyLevel {
    Safe = 1,
    Moderate = 2,
    Restricted = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ContentType {
    Photo = 1,
    Screenshot = 2,
    Other = 3,
}

/// Processing state of an asynchronous upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TicketStatus {
    #[default]
    NotCompleted = 0,
    Completed = 1,
    Failed = 2,
}
