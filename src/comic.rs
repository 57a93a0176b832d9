use serde::{Deserialize, Serialize};
use std::fmt;

/// One strip as returned by the comic API.
///
/// Field names on the wire follow the API (`num`, `img`, `alt`); extra fields
/// such as `safe_title` or `transcript` are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    #[serde(rename = "num")]
    pub identifier: u32,
    pub title: String,
    #[serde(rename = "img")]
    pub image_url: String,
    #[serde(rename = "alt")]
    pub alt_text: String,
}

/// What to ask the gateway for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComicId {
    Latest,
    Number(u32),
}

impl ComicId {
    /// Whether `comic` is an answer to this id. `Latest` only matches once the
    /// newest number is known.
    pub fn matches(self, comic: &Comic, known_latest: Option<u32>) -> bool {
        match self {
            ComicId::Number(n) => comic.identifier == n,
            ComicId::Latest => known_latest == Some(comic.identifier),
        }
    }
}

impl fmt::Display for ComicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComicId::Latest => f.write_str("latest"),
            ComicId::Number(n) => write!(f, "{n}"),
        }
    }
}
