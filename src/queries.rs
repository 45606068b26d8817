//! Read-side aggregation. Every query takes the comparison instant from the
//! caller, so one request classifies all of its shows against the same `now`.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::unicode_lower;
use crate::error::Error;
use crate::models::{Artist, Show, Venue};
use crate::schema::{artists, shows, venues};
use crate::views::{
    ArtistDetail, ArtistListItem, Booking, SearchResults, ShowListItem, Summary, VenueArea,
    VenueDetail,
};

/// A show at exactly `now` has already started, so it counts as past.
pub fn is_upcoming(start_time: &NaiveDateTime, now: &NaiveDateTime) -> bool {
    start_time > now
}

fn partition(
    bookings: impl Iterator<Item = Booking>,
    now: &NaiveDateTime,
) -> (Vec<Booking>, Vec<Booking>) {
    bookings.partition(|booking| !is_upcoming(&booking.start_time, now))
}

fn summarize(id: i32, name: String, shows: &[Show], now: &NaiveDateTime) -> Summary {
    Summary {
        id,
        name,
        show_count: shows.len(),
        upcoming_show_count: shows
            .iter()
            .filter(|show| is_upcoming(&show.start_time, now))
            .count(),
    }
}

/// Escapes LIKE wildcards so the search term only ever matches literally.
/// The term is lower-cased to compare against `unicode_lower(name)`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn venue_summaries(
    conn: &mut SqliteConnection,
    venues: Vec<Venue>,
    now: &NaiveDateTime,
) -> Result<Vec<Summary>, Error> {
    let shows = Show::belonging_to(&venues)
        .select(Show::as_select())
        .load(conn)?;
    Ok(shows
        .grouped_by(&venues)
        .into_iter()
        .zip(venues)
        .map(|(shows, venue)| summarize(venue.id, venue.name, &shows, now))
        .collect())
}

fn artist_summaries(
    conn: &mut SqliteConnection,
    artists: Vec<Artist>,
    now: &NaiveDateTime,
) -> Result<Vec<Summary>, Error> {
    let shows = Show::belonging_to(&artists)
        .select(Show::as_select())
        .load(conn)?;
    Ok(shows
        .grouped_by(&artists)
        .into_iter()
        .zip(artists)
        .map(|(shows, artist)| summarize(artist.id, artist.name, &shows, now))
        .collect())
}

pub fn venue_areas(
    conn: &mut SqliteConnection,
    now: &NaiveDateTime,
) -> Result<Vec<VenueArea>, Error> {
    let locations: Vec<(String, String)> = venues::table
        .select((venues::city, venues::state))
        .distinct()
        .order((venues::state.asc(), venues::city.asc()))
        .load(conn)?;

    let mut areas = Vec::with_capacity(locations.len());
    for (city, state) in locations {
        let local = venues::table
            .filter(venues::city.eq(&city))
            .filter(venues::state.eq(&state))
            .order((venues::name.asc(), venues::id.asc()))
            .select(Venue::as_select())
            .load(conn)?;
        let venues = venue_summaries(conn, local, now)?;
        areas.push(VenueArea {
            city,
            state,
            venues,
        });
    }
    Ok(areas)
}

pub fn search_venues(
    conn: &mut SqliteConnection,
    term: &str,
    now: &NaiveDateTime,
) -> Result<SearchResults, Error> {
    let found = venues::table
        .filter(unicode_lower(venues::name).like(like_pattern(term)).escape('\\'))
        .order((venues::name.asc(), venues::id.asc()))
        .select(Venue::as_select())
        .load(conn)?;
    Ok(SearchResults::new(venue_summaries(conn, found, now)?))
}

pub fn search_artists(
    conn: &mut SqliteConnection,
    term: &str,
    now: &NaiveDateTime,
) -> Result<SearchResults, Error> {
    let found = artists::table
        .filter(unicode_lower(artists::name).like(like_pattern(term)).escape('\\'))
        .order((artists::name.asc(), artists::id.asc()))
        .select(Artist::as_select())
        .load(conn)?;
    Ok(SearchResults::new(artist_summaries(conn, found, now)?))
}

pub fn find_venue(conn: &mut SqliteConnection, id: i32) -> Result<Venue, Error> {
    venues::table
        .find(id)
        .select(Venue::as_select())
        .first(conn)
        .optional()?
        .ok_or(Error::VenueNotFound(id))
}

pub fn find_artist(conn: &mut SqliteConnection, id: i32) -> Result<Artist, Error> {
    artists::table
        .find(id)
        .select(Artist::as_select())
        .first(conn)
        .optional()?
        .ok_or(Error::ArtistNotFound(id))
}

pub fn venue_detail(
    conn: &mut SqliteConnection,
    id: i32,
    now: &NaiveDateTime,
) -> Result<VenueDetail, Error> {
    let venue = find_venue(conn, id)?;
    let rows: Vec<(Show, Artist)> = Show::belonging_to(&venue)
        .inner_join(artists::table)
        .order((shows::start_time.asc(), shows::id.asc()))
        .select((Show::as_select(), Artist::as_select()))
        .load(conn)?;
    let bookings = rows.into_iter().map(|(show, artist)| Booking {
        counterpart_id: artist.id,
        counterpart_name: artist.name,
        counterpart_image_link: artist.image_link,
        start_time: show.start_time,
    });
    let (past_shows, upcoming_shows) = partition(bookings, now);
    Ok(VenueDetail {
        venue,
        past_shows,
        upcoming_shows,
    })
}

pub fn artist_detail(
    conn: &mut SqliteConnection,
    id: i32,
    now: &NaiveDateTime,
) -> Result<ArtistDetail, Error> {
    let artist = find_artist(conn, id)?;
    let rows: Vec<(Show, Venue)> = Show::belonging_to(&artist)
        .inner_join(venues::table)
        .order((shows::start_time.asc(), shows::id.asc()))
        .select((Show::as_select(), Venue::as_select()))
        .load(conn)?;
    let bookings = rows.into_iter().map(|(show, venue)| Booking {
        counterpart_id: venue.id,
        counterpart_name: venue.name,
        counterpart_image_link: venue.image_link,
        start_time: show.start_time,
    });
    let (past_shows, upcoming_shows) = partition(bookings, now);
    Ok(ArtistDetail {
        artist,
        past_shows,
        upcoming_shows,
    })
}

pub fn list_artists(conn: &mut SqliteConnection) -> Result<Vec<ArtistListItem>, Error> {
    let rows: Vec<(i32, String)> = artists::table
        .order((artists::name.asc(), artists::id.asc()))
        .select((artists::id, artists::name))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| ArtistListItem { id, name })
        .collect())
}

/// Every show whose venue and artist both still exist.
pub fn list_shows(conn: &mut SqliteConnection) -> Result<Vec<ShowListItem>, Error> {
    let rows: Vec<(i32, String, i32, String, Option<String>, NaiveDateTime)> = shows::table
        .inner_join(venues::table)
        .inner_join(artists::table)
        .order((shows::start_time.asc(), shows::id.asc()))
        .select((
            venues::id,
            venues::name,
            artists::id,
            artists::name,
            artists::image_link,
            shows::start_time,
        ))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(
            |(venue_id, venue_name, artist_id, artist_name, artist_image_link, start_time)| {
                ShowListItem {
                    venue_id,
                    venue_name,
                    artist_id,
                    artist_name,
                    artist_image_link,
                    start_time,
                }
            },
        )
        .collect())
}
