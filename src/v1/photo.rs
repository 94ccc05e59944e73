/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::parsers::{from_empty_str_to_none, from_lenient_datetime};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::hash::{Hash, Hasher};

/// Pixel dimensions of a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoSize {
    pub width: u32,
    pub height: u32,
}

/// A photo in the feed.
///
/// Two photos are equal when their ids are equal.
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: String,
    pub size: PhotoSize,
    pub created_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub thumb_url: String,
    pub full_url: String,
    pub is_liked: bool,
}

impl From<PhotoRecord> for Photo {
    fn from(record: PhotoRecord) -> Self {
        Self {
            id: record.id,
            size: PhotoSize {
                width: record.width,
                height: record.height,
            },
            created_at: record.created_at,
            description: record.description,
            thumb_url: record.urls.thumb,
            full_url: record.urls.full,
            is_liked: record.liked_by_user,
        }
    }
}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Photo {}

impl Hash for Photo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "id: {}, {}x{}, liked: {}", self.id, self.size.width, self.size.height, self.is_liked)
    }
}

/// Photo as returned by `GET /photos` and the like endpoints
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct PhotoRecord {
    pub(crate) id: String,

    #[serde(default)]
    width: u32,

    #[serde(default)]
    height: u32,

    #[serde(default, deserialize_with = "from_lenient_datetime")]
    created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "from_empty_str_to_none")]
    description: Option<String>,

    urls: PhotoUrls,

    #[serde(default)]
    liked_by_user: bool,
}

#[derive(Deserialize, Debug, Clone)]
struct PhotoUrls {
    thumb: String,

    full: String,
    // #[serde(rename = "raw")]
    // raw: String,

    // #[serde(rename = "regular")]
    // regular: String,
}

// Expected response from a like/unlike request
#[derive(Deserialize, Debug)]
pub(crate) struct LikeResponse {
    pub(crate) photo: PhotoRecord,
}
