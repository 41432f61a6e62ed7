/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::{Permission, TicketStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::Error;
use std::str::FromStr;

// Parses permission names such as "write"
pub fn from_permission<'de, D>(deserializer: D) -> Result<Option<Permission>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Permission::from_str(s.trim())
        .map(Some)
        .map_err(|_| D::Error::custom(format!("unknown permission `{s}`")))
}

// Parses "1"/"0" flags
pub fn from_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(matches!(s.trim(), "1" | "true"))
}

// Parses strings that may be "" and sets to None
pub fn from_empty_str_to_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s.is_empty() { Ok(None) } else { Ok(Some(s)) }
}

// Parses seconds since the epoch, "" or "0" means unset
pub fn from_unix_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    match s.trim() {
        "" | "0" => Ok(None),
        secs => {
            let secs = secs
                .parse::<i64>()
                .map_err(|_| D::Error::custom(format!("invalid timestamp `{s}`")))?;
            Ok(DateTime::from_timestamp(secs, 0))
        }
    }
}

// Parses the numeric completion state of an upload ticket
pub fn from_ticket_status<'de, D>(deserializer: D) -> Result<TicketStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    s.trim()
        .parse::<u8>()
        .ok()
        .and_then(|v| TicketStatus::try_from(v).ok())
        .ok_or_else(|| D::Error::custom(format!("unknown ticket status `{s}`")))
}
