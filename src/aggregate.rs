//! View models for the listing and detail pages.
//!
//! Every function here works on records the caller already loaded and on a
//! reference instant the caller picked, so nothing in this module touches
//! the database or the clock.

use crate::genres;
use crate::models::{Artist, Show, Venue};
use crate::schedule::{classify, is_upcoming};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("show {show_id} references missing {entity} {id}")]
    DanglingReference {
        show_id: i64,
        entity: &'static str,
        id: i64,
    },
}

/// A record shows can point at.
pub trait ShowParty {
    const KIND: &'static str;

    fn id(&self) -> i64;
    fn name(&self) -> &str;
    /// The id of this kind of party on `show`.
    fn party_id(show: &Show) -> i64;
}

impl ShowParty for Venue {
    const KIND: &'static str = "venue";

    fn id(&self) -> i64 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn party_id(show: &Show) -> i64 {
        show.venue_id
    }
}

impl ShowParty for Artist {
    const KIND: &'static str = "artist";

    fn id(&self) -> i64 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn party_id(show: &Show) -> i64 {
        show.artist_id
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct PartySummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CityArea {
    pub city: String,
    pub state: String,
    pub venues: Vec<PartySummary>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ArtistShow {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct VenueShow {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct VenueDetail {
    #[serde(flatten)]
    pub venue: Venue,
    pub genres: Vec<String>,
    pub past_shows: Vec<ArtistShow>,
    pub upcoming_shows: Vec<ArtistShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ArtistDetail {
    #[serde(flatten)]
    pub artist: Artist,
    pub genres: Vec<String>,
    pub past_shows: Vec<VenueShow>,
    pub upcoming_shows: Vec<VenueShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<PartySummary>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ArtistSummary {
    pub id: i64,
    pub name: String,
}

/// Edit-form prefill: the stored record with its genres decoded.
#[derive(Debug, PartialEq, Serialize)]
pub struct EditForm<T> {
    #[serde(flatten)]
    pub record: T,
    pub genres: Vec<String>,
}

pub fn index_by_id<P: ShowParty>(parties: Vec<P>) -> HashMap<i64, P> {
    parties.into_iter().map(|p| (p.id(), p)).collect()
}

fn upcoming_counts<P: ShowParty>(shows: &[Show], reference: NaiveDateTime) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for show in shows.iter().filter(|s| is_upcoming(s, reference)) {
        *counts.entry(P::party_id(show)).or_insert(0) += 1;
    }
    counts
}

fn summarize<P: ShowParty>(party: &P, counts: &HashMap<i64, usize>) -> PartySummary {
    PartySummary {
        id: party.id(),
        name: party.name().to_string(),
        num_upcoming_shows: counts.get(&party.id()).copied().unwrap_or(0),
    }
}

fn resolve<'a, P: ShowParty>(
    by_id: &'a HashMap<i64, P>,
    show: &Show,
) -> Result<&'a P, AggregateError> {
    let id = P::party_id(show);
    by_id.get(&id).ok_or(AggregateError::DanglingReference {
        show_id: show.id,
        entity: P::KIND,
        id,
    })
}

/// Groups venues by `(city, state)`. Groups appear in the order their first
/// venue appears in `venues`; venues keep their input order inside a group.
pub fn group_venues_by_city(
    venues: &[Venue],
    shows: &[Show],
    reference: NaiveDateTime,
) -> Vec<CityArea> {
    let counts = upcoming_counts::<Venue>(shows, reference);
    let mut areas: Vec<CityArea> = Vec::new();
    let mut slots: HashMap<(&str, &str), usize> = HashMap::new();

    for venue in venues {
        let slot = *slots
            .entry((venue.city.as_str(), venue.state.as_str()))
            .or_insert_with(|| {
                areas.push(CityArea {
                    city: venue.city.clone(),
                    state: venue.state.clone(),
                    venues: Vec::new(),
                });
                areas.len() - 1
            });
        areas[slot].venues.push(summarize(venue, &counts));
    }
    areas
}

/// `shows` may contain other venues' shows; only this venue's are used.
pub fn venue_detail(
    venue: &Venue,
    shows: &[Show],
    artists_by_id: &HashMap<i64, Artist>,
    reference: NaiveDateTime,
) -> Result<VenueDetail, AggregateError> {
    let own: Vec<Show> = shows
        .iter()
        .filter(|s| s.venue_id == venue.id)
        .cloned()
        .collect();
    let (past, upcoming) = classify(&own, reference);

    let to_entry = |show: &Show| -> Result<ArtistShow, AggregateError> {
        let artist = resolve(artists_by_id, show)?;
        Ok(ArtistShow {
            artist_id: artist.id,
            artist_name: artist.name.clone(),
            artist_image_link: artist.image_link.clone(),
            start_time: show.start_time,
        })
    };
    let past_shows = past.into_iter().map(to_entry).collect::<Result<Vec<_>, _>>()?;
    let upcoming_shows = upcoming
        .into_iter()
        .map(to_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VenueDetail {
        venue: venue.clone(),
        genres: genres::decode_or_empty(&venue.genres, Venue::KIND, venue.id),
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

pub fn artist_detail(
    artist: &Artist,
    shows: &[Show],
    venues_by_id: &HashMap<i64, Venue>,
    reference: NaiveDateTime,
) -> Result<ArtistDetail, AggregateError> {
    let own: Vec<Show> = shows
        .iter()
        .filter(|s| s.artist_id == artist.id)
        .cloned()
        .collect();
    let (past, upcoming) = classify(&own, reference);

    let to_entry = |show: &Show| -> Result<VenueShow, AggregateError> {
        let venue = resolve(venues_by_id, show)?;
        Ok(VenueShow {
            venue_id: venue.id,
            venue_name: venue.name.clone(),
            venue_image_link: venue.image_link.clone(),
            start_time: show.start_time,
        })
    };
    let past_shows = past.into_iter().map(to_entry).collect::<Result<Vec<_>, _>>()?;
    let upcoming_shows = upcoming
        .into_iter()
        .map(to_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ArtistDetail {
        artist: artist.clone(),
        genres: genres::decode_or_empty(&artist.genres, Artist::KIND, artist.id),
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

/// Case-insensitive substring match on the name. An empty query matches everything.
pub fn search<P: ShowParty>(
    parties: &[P],
    shows: &[Show],
    query: &str,
    reference: NaiveDateTime,
) -> SearchResults {
    let needle = query.to_lowercase();
    let counts = upcoming_counts::<P>(shows, reference);
    let data: Vec<PartySummary> = parties
        .iter()
        .filter(|p| p.name().to_lowercase().contains(&needle))
        .map(|p| summarize(p, &counts))
        .collect();
    SearchResults {
        count: data.len(),
        data,
    }
}

pub fn list_shows(
    shows: &[Show],
    venues_by_id: &HashMap<i64, Venue>,
    artists_by_id: &HashMap<i64, Artist>,
) -> Result<Vec<ShowListing>, AggregateError> {
    shows
        .iter()
        .map(|show| {
            let venue = resolve(venues_by_id, show)?;
            let artist = resolve(artists_by_id, show)?;
            Ok(ShowListing {
                venue_id: venue.id,
                venue_name: venue.name.clone(),
                artist_id: artist.id,
                artist_name: artist.name.clone(),
                artist_image_link: artist.image_link.clone(),
                start_time: show.start_time,
            })
        })
        .collect()
}

pub fn list_artists(artists: &[Artist]) -> Vec<ArtistSummary> {
    artists
        .iter()
        .map(|a| ArtistSummary {
            id: a.id,
            name: a.name.clone(),
        })
        .collect()
}

pub fn venue_form(venue: Venue) -> EditForm<Venue> {
    let genres = genres::decode_or_empty(&venue.genres, Venue::KIND, venue.id);
    EditForm {
        record: venue,
        genres,
    }
}

pub fn artist_form(artist: Artist) -> EditForm<Artist> {
    let genres = genres::decode_or_empty(&artist.genres, Artist::KIND, artist.id);
    EditForm {
        record: artist,
        genres,
    }
}
