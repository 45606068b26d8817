//! Typed, presentation-ready projections built by the query layer.

use chrono::NaiveDateTime;

use crate::models::{Artist, Venue};

fn display_time(start_time: &NaiveDateTime) -> String {
    start_time.format("%a %b %-d, %Y %-I:%M%p").to_string()
}

/// Venues sharing one (city, state) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct VenueArea {
    pub city: String,
    pub state: String,
    pub venues: Vec<Summary>,
}

/// A venue or artist as it appears in listings and search results.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub id: i32,
    pub name: String,
    pub show_count: usize,
    pub upcoming_show_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchResults {
    pub count: usize,
    pub results: Vec<Summary>,
}

impl SearchResults {
    pub fn new(results: Vec<Summary>) -> SearchResults {
        SearchResults {
            count: results.len(),
            results,
        }
    }
}

/// The other end of a show: the artist when looking at a venue, and the
/// venue when looking at an artist.
#[derive(Clone, Debug, PartialEq)]
pub struct Booking {
    pub counterpart_id: i32,
    pub counterpart_name: String,
    pub counterpart_image_link: Option<String>,
    pub start_time: NaiveDateTime,
}

impl Booking {
    pub fn when(&self) -> String {
        display_time(&self.start_time)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VenueDetail {
    pub venue: Venue,
    pub past_shows: Vec<Booking>,
    pub upcoming_shows: Vec<Booking>,
}

impl VenueDetail {
    pub fn past_shows_count(&self) -> usize {
        self.past_shows.len()
    }

    pub fn upcoming_shows_count(&self) -> usize {
        self.upcoming_shows.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtistDetail {
    pub artist: Artist,
    pub past_shows: Vec<Booking>,
    pub upcoming_shows: Vec<Booking>,
}

impl ArtistDetail {
    pub fn past_shows_count(&self) -> usize {
        self.past_shows.len()
    }

    pub fn upcoming_shows_count(&self) -> usize {
        self.upcoming_shows.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtistListItem {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShowListItem {
    pub venue_id: i32,
    pub venue_name: String,
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: NaiveDateTime,
}

impl ShowListItem {
    pub fn when(&self) -> String {
        display_time(&self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn times_read_like_a_listing() {
        let start_time = NaiveDate::from_ymd_opt(2019, 5, 21)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();
        let booking = Booking {
            counterpart_id: 4,
            counterpart_name: "Guns N Petals".to_owned(),
            counterpart_image_link: None,
            start_time,
        };
        assert_eq!(booking.when(), "Tue May 21, 2019 9:30PM");
    }
}
