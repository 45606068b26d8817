use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde_derive::Deserialize;
use url::form_urlencoded;

use crate::error::{Error, FieldError};
use crate::models::{Artist, Genres, NewArtist, NewShow, NewVenue, Venue};

pub const GENRE_CHOICES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

pub const STATE_CHOICES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR",
    "MD", "MA", "MI", "MN", "MS", "MO", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY",
];

const START_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

lazy_static! {
    static ref PHONE: Regex = Regex::new(r"^(\(\d{3}\) ?|\d{3}[-. ]?)\d{3}[-. ]?\d{4}$").unwrap();
}

/// One `<option>` of a select box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub selected: bool,
}

fn state_choices(selected: &str) -> Vec<Choice> {
    STATE_CHOICES
        .iter()
        .map(|&value| Choice {
            value,
            selected: value.eq_ignore_ascii_case(selected.trim()),
        })
        .collect()
}

fn genre_choices(selected: &[String]) -> Vec<Choice> {
    GENRE_CHOICES
        .iter()
        .map(|&value| Choice {
            value,
            selected: selected.iter().any(|genre| genre == value),
        })
        .collect()
}

const REQUIRED: &str = "This field is required.";

fn parse_pairs(body: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(body).into_owned().collect()
}

fn is_checked(value: &str) -> bool {
    matches!(value, "y" | "on" | "true" | "1")
}

fn blank_to_none(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

/// Collects every field failure so the form can report them all at once.
#[derive(Default)]
struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    fn required(&mut self, field: &'static str, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            self.errors.push(FieldError::new(field, REQUIRED));
        }
        value.to_owned()
    }

    fn state(&mut self, value: &str) -> String {
        let value = value.trim().to_uppercase();
        if value.is_empty() {
            self.errors.push(FieldError::new("state", REQUIRED));
        } else if !STATE_CHOICES.contains(&value.as_str()) {
            self.errors
                .push(FieldError::new("state", format!("Unknown state: {}", value)));
        }
        value
    }

    fn phone(&mut self, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            self.errors.push(FieldError::new("phone", REQUIRED));
        } else if !PHONE.is_match(value) {
            self.errors.push(FieldError::new(
                "phone",
                "Phone numbers look like 123-123-1234.",
            ));
        }
        value.to_owned()
    }

    fn genres(&mut self, genres: &[String]) -> Genres {
        if genres.is_empty() {
            self.errors
                .push(FieldError::new("genres", "Pick at least one genre."));
        }
        let mut picked: Vec<String> = Vec::with_capacity(genres.len());
        for genre in genres {
            if !GENRE_CHOICES.contains(&genre.as_str()) {
                self.errors
                    .push(FieldError::new("genres", format!("Unknown genre: {}", genre)));
            } else if picked.contains(genre) {
                self.errors
                    .push(FieldError::new("genres", format!("{} was picked twice.", genre)));
            } else {
                picked.push(genre.clone());
            }
        }
        Genres(picked)
    }

    fn link(&mut self, field: &'static str, value: &str) -> Option<String> {
        let value = blank_to_none(value)?;
        match url::Url::parse(&value) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(value),
            _ => {
                self.errors.push(FieldError::new(field, "Invalid URL."));
                Some(value)
            }
        }
    }

    fn id(&mut self, field: &'static str, value: &str) -> i32 {
        let value = value.trim();
        if value.is_empty() {
            self.errors.push(FieldError::new(field, REQUIRED));
            return 0;
        }
        match value.parse::<i32>() {
            Ok(id) if id > 0 => id,
            _ => {
                self.errors
                    .push(FieldError::new(field, "Ids are positive whole numbers."));
                0
            }
        }
    }

    fn start_time(&mut self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            self.errors.push(FieldError::new("start_time", REQUIRED));
            return None;
        }
        let parsed = START_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok());
        if parsed.is_none() {
            self.errors.push(FieldError::new(
                "start_time",
                "Times look like 2019-05-21 21:30:00.",
            ));
        }
        parsed
    }

    fn finish<T>(self, value: T) -> Result<T, Error> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(Error::Validation(self.errors))
        }
    }
}

/// Raw venue submission, kept verbatim so a rejected form can be re-displayed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub image_link: String,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

impl VenueForm {
    pub fn from_form_body(body: &[u8]) -> VenueForm {
        let mut form = VenueForm::default();
        for (key, value) in parse_pairs(body) {
            match key.as_str() {
                "name" => form.name = value,
                "city" => form.city = value,
                "state" => form.state = value,
                "address" => form.address = value,
                "phone" => form.phone = value,
                "genres" => form.genres.push(value),
                "image_link" => form.image_link = value,
                "facebook_link" => form.facebook_link = value,
                "website_link" => form.website_link = value,
                "seeking_talent" => form.seeking_talent = is_checked(&value),
                "seeking_description" => form.seeking_description = value,
                _ => {}
            }
        }
        form
    }

    pub fn from_venue(venue: &Venue) -> VenueForm {
        VenueForm {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone(),
            phone: venue.phone.clone(),
            genres: venue.genres.0.clone(),
            image_link: venue.image_link.clone().unwrap_or_default(),
            facebook_link: venue.facebook_link.clone().unwrap_or_default(),
            website_link: venue.website_link.clone().unwrap_or_default(),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn state_choices(&self) -> Vec<Choice> {
        state_choices(&self.state)
    }

    pub fn genre_choices(&self) -> Vec<Choice> {
        genre_choices(&self.genres)
    }

    pub fn display_name(&self) -> &str {
        self.name.trim()
    }

    pub fn validate(&self) -> Result<NewVenue, Error> {
        let mut v = Validator::default();
        let venue = NewVenue {
            name: v.required("name", &self.name),
            city: v.required("city", &self.city),
            state: v.state(&self.state),
            address: v.required("address", &self.address),
            phone: v.phone(&self.phone),
            genres: v.genres(&self.genres),
            image_link: v.link("image_link", &self.image_link),
            facebook_link: v.link("facebook_link", &self.facebook_link),
            website_link: v.link("website_link", &self.website_link),
            seeking_talent: self.seeking_talent,
            seeking_description: blank_to_none(&self.seeking_description),
        };
        v.finish(venue)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub image_link: String,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
}

impl ArtistForm {
    pub fn from_form_body(body: &[u8]) -> ArtistForm {
        let mut form = ArtistForm::default();
        for (key, value) in parse_pairs(body) {
            match key.as_str() {
                "name" => form.name = value,
                "city" => form.city = value,
                "state" => form.state = value,
                "phone" => form.phone = value,
                "genres" => form.genres.push(value),
                "image_link" => form.image_link = value,
                "facebook_link" => form.facebook_link = value,
                "website_link" => form.website_link = value,
                "seeking_venue" => form.seeking_venue = is_checked(&value),
                "seeking_description" => form.seeking_description = value,
                _ => {}
            }
        }
        form
    }

    pub fn from_artist(artist: &Artist) -> ArtistForm {
        ArtistForm {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone(),
            genres: artist.genres.0.clone(),
            image_link: artist.image_link.clone().unwrap_or_default(),
            facebook_link: artist.facebook_link.clone().unwrap_or_default(),
            website_link: artist.website_link.clone().unwrap_or_default(),
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn state_choices(&self) -> Vec<Choice> {
        state_choices(&self.state)
    }

    pub fn genre_choices(&self) -> Vec<Choice> {
        genre_choices(&self.genres)
    }

    pub fn display_name(&self) -> &str {
        self.name.trim()
    }

    pub fn validate(&self) -> Result<NewArtist, Error> {
        let mut v = Validator::default();
        let artist = NewArtist {
            name: v.required("name", &self.name),
            city: v.required("city", &self.city),
            state: v.state(&self.state),
            phone: v.phone(&self.phone),
            genres: v.genres(&self.genres),
            image_link: v.link("image_link", &self.image_link),
            facebook_link: v.link("facebook_link", &self.facebook_link),
            website_link: v.link("website_link", &self.website_link),
            seeking_venue: self.seeking_venue,
            seeking_description: blank_to_none(&self.seeking_description),
        };
        v.finish(artist)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

impl ShowForm {
    pub fn from_form_body(body: &[u8]) -> Result<ShowForm, Error> {
        Ok(serde_urlencoded::from_bytes(body)?)
    }

    pub fn validate(&self) -> Result<NewShow, Error> {
        let mut v = Validator::default();
        let artist_id = v.id("artist_id", &self.artist_id);
        let venue_id = v.id("venue_id", &self.venue_id);
        let start_time = v.start_time(&self.start_time);
        match start_time {
            Some(start_time) => v.finish(NewShow {
                venue_id,
                artist_id,
                start_time,
            }),
            None => Err(Error::Validation(v.errors)),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchForm {
    pub search_term: String,
}

impl SearchForm {
    pub fn from_form_body(body: &[u8]) -> Result<SearchForm, Error> {
        Ok(serde_urlencoded::from_bytes(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names(err: Error) -> Vec<&'static str> {
        match err {
            Error::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn venue_form_collects_repeated_genres() {
        let form = VenueForm::from_form_body(
            b"name=The+Musical+Hop&city=San+Francisco&state=CA&address=1015+Folsom+Street\
              &phone=123-123-1234&genres=Jazz&genres=Reggae&seeking_talent=y\
              &website_link=https%3A%2F%2Fwww.themusicalhop.com",
        );
        assert_eq!(form.genres, vec!["Jazz", "Reggae"]);
        assert!(form.seeking_talent);

        let venue = form.validate().unwrap();
        assert_eq!(venue.name, "The Musical Hop");
        assert_eq!(venue.genres, Genres(vec!["Jazz".to_owned(), "Reggae".to_owned()]));
        assert_eq!(
            venue.website_link.as_deref(),
            Some("https://www.themusicalhop.com")
        );
        assert_eq!(venue.facebook_link, None);
        assert_eq!(venue.seeking_description, None);
    }

    #[test]
    fn venue_form_reports_every_bad_field() {
        let form = VenueForm::from_form_body(
            b"name=&city=Nowhere&state=ZZ&phone=call+me&genres=Polka&image_link=not+a+url",
        );
        assert_eq!(
            field_names(form.validate().unwrap_err()),
            vec!["name", "state", "address", "phone", "genres", "image_link"]
        );
    }

    #[test]
    fn repeated_genre_is_rejected() {
        let mut form = VenueForm::from_form_body(
            b"name=The+Musical+Hop&city=San+Francisco&state=CA&address=1015+Folsom+Street\
              &phone=123-123-1234&genres=Jazz&genres=Reggae&genres=Jazz",
        );
        assert_eq!(form.genres, vec!["Jazz", "Reggae", "Jazz"]);
        assert_eq!(field_names(form.validate().unwrap_err()), vec!["genres"]);

        form.genres.pop();
        assert_eq!(
            form.validate().unwrap().genres,
            Genres(vec!["Jazz".to_owned(), "Reggae".to_owned()])
        );
    }

    #[test]
    fn phone_formats() {
        for phone in &["123-123-1234", "(415) 000-1234", "415.000.1234", "4150001234"] {
            let mut v = Validator::default();
            v.phone(phone);
            assert!(v.errors.is_empty(), "{} should be accepted", phone);
        }
        for phone in &["12-123-1234", "phone", "123-123-12345"] {
            let mut v = Validator::default();
            v.phone(phone);
            assert_eq!(v.errors.len(), 1, "{} should be rejected", phone);
        }
    }

    #[test]
    fn links_must_be_http() {
        let mut v = Validator::default();
        assert_eq!(v.link("facebook_link", "  "), None);
        assert!(v.errors.is_empty());
        v.link("facebook_link", "ftp://example.com/");
        assert_eq!(v.errors.len(), 1);
    }

    #[test]
    fn artist_form_round_trips_through_edit_prefill() {
        let form = ArtistForm::from_form_body(
            b"name=Guns+N+Petals&city=San+Francisco&state=ca&phone=326-123-5000\
              &genres=Rock+n+Roll&seeking_venue=on\
              &seeking_description=Looking+for+shows",
        );
        let new_artist = form.validate().unwrap();
        assert_eq!(new_artist.state, "CA");
        let artist = Artist {
            id: 4,
            name: new_artist.name,
            city: new_artist.city,
            state: new_artist.state,
            phone: new_artist.phone,
            genres: new_artist.genres,
            image_link: new_artist.image_link,
            facebook_link: new_artist.facebook_link,
            website_link: new_artist.website_link,
            seeking_venue: new_artist.seeking_venue,
            seeking_description: new_artist.seeking_description,
        };
        let prefilled = ArtistForm::from_artist(&artist);
        assert_eq!(prefilled.genres, vec!["Rock n Roll"]);
        assert!(prefilled.seeking_venue);
        assert_eq!(prefilled.seeking_description, "Looking for shows");
    }

    #[test]
    fn show_form_accepts_datetime_local_input() {
        let form = ShowForm::from_form_body(
            b"artist_id=4&venue_id=1&start_time=2019-05-21T21%3A30",
        )
        .unwrap();
        let show = form.validate().unwrap();
        assert_eq!((show.artist_id, show.venue_id), (4, 1));
        assert_eq!(show.start_time.to_string(), "2019-05-21 21:30:00");
    }

    #[test]
    fn show_form_rejects_bad_ids_and_times() {
        let form = ShowForm::from_form_body(b"artist_id=-1&venue_id=x&start_time=tomorrow")
            .unwrap();
        assert_eq!(
            field_names(form.validate().unwrap_err()),
            vec!["artist_id", "venue_id", "start_time"]
        );
    }

    #[test]
    fn choices_mark_the_submitted_values() {
        let form = VenueForm {
            state: "ny".to_owned(),
            genres: vec!["Jazz".to_owned(), "Soul".to_owned()],
            ..VenueForm::default()
        };
        let states: Vec<&str> = form
            .state_choices()
            .into_iter()
            .filter(|c| c.selected)
            .map(|c| c.value)
            .collect();
        assert_eq!(states, vec!["NY"]);
        let genres: Vec<&str> = form
            .genre_choices()
            .into_iter()
            .filter(|c| c.selected)
            .map(|c| c.value)
            .collect();
        assert_eq!(genres, vec!["Jazz", "Soul"]);
        assert_eq!(form.genre_choices().len(), GENRE_CHOICES.len());
    }

    #[test]
    fn search_term_defaults_to_empty() {
        assert_eq!(SearchForm::from_form_body(b"").unwrap().search_term, "");
        assert_eq!(
            SearchForm::from_form_body(b"search_term=hop").unwrap().search_term,
            "hop"
        );
    }
}
