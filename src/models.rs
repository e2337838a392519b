use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    /// Encoded genre list, see [`crate::genres`].
    #[serde(skip_serializing)]
    pub genres: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    #[serde(skip_serializing)]
    pub genres: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Show {
    pub id: i64,
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenuePayload {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    #[serde(alias = "website_link")]
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    #[serde(default)]
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistPayload {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    #[serde(alias = "website_link")]
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    #[serde(default)]
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// `start_time` stays a string until [`crate::schedule::parse_start_time`] has looked at it.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowPayload {
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: String,
}
