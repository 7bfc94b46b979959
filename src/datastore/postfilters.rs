//! Ways to filter posts based on their fields. Filter semantics work just like SQL:
//! If a field is unset, its filter won't be applied.
//! If set, filter out posts that don't match the filter.
use serde::Deserialize;

/// Filters that can be applied to queries on the datastore.
#[derive(Default, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct PostFilters {
    pub author_id: Option<i32>,
    pub group_id: Option<i32>,
    /// Only posts whose author is followed by this user.
    pub followed_by: Option<i32>,
    pub text_contains: Option<String>,
}

impl PostFilters {
    pub fn by_author(author_id: i32) -> Self {
        Self {
            author_id: Some(author_id),
            ..Default::default()
        }
    }

    pub fn by_group(group_id: i32) -> Self {
        Self {
            group_id: Some(group_id),
            ..Default::default()
        }
    }

    pub fn feed_of(user_id: i32) -> Self {
        Self {
            followed_by: Some(user_id),
            ..Default::default()
        }
    }
}

/// A window into an ordered post listing.
#[derive(Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub struct Slice {
    #[serde(default)]
    pub offset: i64,
    /// Maximum number of posts to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for Slice {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> i64 {
    100
}
