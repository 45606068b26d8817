//! Write-side operations. Each one runs in a single transaction: an `Err`
//! anywhere inside rolls the whole thing back.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::Error;
use crate::models::{Artist, NewArtist, NewShow, NewVenue, Show, Venue};
use crate::schema::{artists, shows, venues};

pub fn create_venue(conn: &mut SqliteConnection, venue: &NewVenue) -> Result<Venue, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        Ok(diesel::insert_into(venues::table)
            .values(venue)
            .returning(Venue::as_returning())
            .get_result(conn)?)
    })
}

pub fn update_venue(
    conn: &mut SqliteConnection,
    id: i32,
    venue: &NewVenue,
) -> Result<Venue, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        diesel::update(venues::table.find(id))
            .set(venue)
            .returning(Venue::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(Error::VenueNotFound(id))
    })
}

/// Removes the venue and every show booked there, returning how many shows went
/// with it.
pub fn delete_venue(conn: &mut SqliteConnection, id: i32) -> Result<usize, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        let removed_shows =
            diesel::delete(shows::table.filter(shows::venue_id.eq(id))).execute(conn)?;
        match diesel::delete(venues::table.find(id)).execute(conn)? {
            0 => Err(Error::VenueNotFound(id)),
            _ => Ok(removed_shows),
        }
    })
}

pub fn create_artist(conn: &mut SqliteConnection, artist: &NewArtist) -> Result<Artist, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        Ok(diesel::insert_into(artists::table)
            .values(artist)
            .returning(Artist::as_returning())
            .get_result(conn)?)
    })
}

pub fn update_artist(
    conn: &mut SqliteConnection,
    id: i32,
    artist: &NewArtist,
) -> Result<Artist, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        diesel::update(artists::table.find(id))
            .set(artist)
            .returning(Artist::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(Error::ArtistNotFound(id))
    })
}

/// Books a show once both ends are known to exist.
pub fn create_show(conn: &mut SqliteConnection, show: &NewShow) -> Result<Show, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        let artist: Option<i32> = artists::table
            .find(show.artist_id)
            .select(artists::id)
            .first(conn)
            .optional()?;
        if artist.is_none() {
            return Err(Error::UnknownArtist(show.artist_id));
        }
        let venue: Option<i32> = venues::table
            .find(show.venue_id)
            .select(venues::id)
            .first(conn)
            .optional()?;
        if venue.is_none() {
            return Err(Error::UnknownVenue(show.venue_id));
        }
        Ok(diesel::insert_into(shows::table)
            .values(show)
            .returning(Show::as_returning())
            .get_result(conn)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{at, database, new_artist, new_venue};
    use crate::models::Genres;
    use crate::queries;

    fn show_count(conn: &mut SqliteConnection) -> i64 {
        shows::table.count().get_result(conn).unwrap()
    }

    #[test]
    fn created_venue_matches_submission() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        let mut submitted = new_venue("The Musical Hop", "San Francisco", "CA");
        submitted.genres = Genres(vec!["Jazz".to_owned(), "Reggae".to_owned(), "Swing".to_owned()]);
        submitted.website_link = Some("https://www.themusicalhop.com".to_owned());
        submitted.seeking_talent = true;
        submitted.seeking_description = Some("Looking for a local artist".to_owned());

        let venue = create_venue(conn, &submitted).unwrap();
        assert_eq!(venue.name, submitted.name);
        assert_eq!(venue.city, submitted.city);
        assert_eq!(venue.state, submitted.state);
        assert_eq!(venue.address, submitted.address);
        assert_eq!(venue.phone, submitted.phone);
        assert_eq!(venue.genres, submitted.genres);
        assert_eq!(venue.website_link, submitted.website_link);
        assert_eq!(venue.seeking_talent, submitted.seeking_talent);
        assert_eq!(venue.seeking_description, submitted.seeking_description);

        let fetched = queries::find_venue(conn, venue.id).unwrap();
        assert_eq!(fetched, venue);
    }

    #[test]
    fn update_overwrites_every_field() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        let venue = create_venue(conn, &new_venue("The Musical Hop", "San Francisco", "CA"))
            .unwrap();
        let mut changes = new_venue("The Dueling Pianos Bar", "New York", "NY");
        changes.seeking_description = None;
        changes.image_link = None;

        let updated = update_venue(conn, venue.id, &changes).unwrap();
        assert_eq!(updated.id, venue.id);
        assert_eq!(updated.name, "The Dueling Pianos Bar");
        assert_eq!(updated.city, "New York");

        assert!(matches!(
            update_venue(conn, venue.id + 100, &changes),
            Err(Error::VenueNotFound(_))
        ));
    }

    #[test]
    fn artists_can_be_created_and_edited() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        let artist = create_artist(conn, &new_artist("Guns N Petals")).unwrap();
        assert_eq!(artist.genres, Genres(vec!["Rock n Roll".to_owned()]));

        let mut changes = new_artist("Guns N Petals");
        changes.seeking_venue = false;
        changes.seeking_description = None;
        let updated = update_artist(conn, artist.id, &changes).unwrap();
        assert!(!updated.seeking_venue);
        assert_eq!(updated.seeking_description, None);

        assert!(matches!(
            update_artist(conn, 404, &changes),
            Err(Error::ArtistNotFound(404))
        ));
    }

    #[test]
    fn show_with_unknown_references_is_not_persisted() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        let venue = create_venue(conn, &new_venue("The Musical Hop", "San Francisco", "CA"))
            .unwrap();
        let artist = create_artist(conn, &new_artist("Guns N Petals")).unwrap();
        let when = at(2019, 5, 21, 21, 30);

        let missing_artist = NewShow {
            venue_id: venue.id,
            artist_id: artist.id + 1,
            start_time: when,
        };
        assert!(matches!(
            create_show(conn, &missing_artist),
            Err(Error::UnknownArtist(_))
        ));

        let missing_venue = NewShow {
            venue_id: venue.id + 1,
            artist_id: artist.id,
            start_time: when,
        };
        assert!(matches!(
            create_show(conn, &missing_venue),
            Err(Error::UnknownVenue(_))
        ));
        assert_eq!(show_count(conn), 0);
    }

    #[test]
    fn booking_scenario() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        let venue = create_venue(conn, &new_venue("The Musical Hop", "San Francisco", "CA"))
            .unwrap();
        let artist = create_artist(conn, &new_artist("Guns N Petals")).unwrap();
        let show = create_show(
            conn,
            &NewShow {
                venue_id: venue.id,
                artist_id: artist.id,
                start_time: at(2019, 5, 21, 21, 30),
            },
        )
        .unwrap();
        assert_eq!(show.venue_id, venue.id);

        let detail = queries::venue_detail(conn, venue.id, &at(2024, 1, 1, 0, 0)).unwrap();
        assert_eq!(detail.past_shows_count(), 1);
        assert_eq!(detail.upcoming_shows_count(), 0);
    }

    #[test]
    fn deleting_a_venue_removes_its_shows() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        let hop = create_venue(conn, &new_venue("The Musical Hop", "San Francisco", "CA"))
            .unwrap();
        let park = create_venue(
            conn,
            &new_venue("Park Square Live Music & Coffee", "San Francisco", "CA"),
        )
        .unwrap();
        let artist = create_artist(conn, &new_artist("The Wild Sax Band")).unwrap();
        for (venue_id, day) in &[(hop.id, 1), (hop.id, 8), (park.id, 15)] {
            create_show(
                conn,
                &NewShow {
                    venue_id: *venue_id,
                    artist_id: artist.id,
                    start_time: at(2035, 4, *day, 20, 0),
                },
            )
            .unwrap();
        }

        assert_eq!(delete_venue(conn, hop.id).unwrap(), 2);
        assert_eq!(show_count(conn), 1);
        assert!(matches!(
            queries::venue_detail(conn, hop.id, &at(2024, 1, 1, 0, 0)),
            Err(Error::VenueNotFound(_))
        ));
        assert!(matches!(
            delete_venue(conn, hop.id),
            Err(Error::VenueNotFound(_))
        ));
        assert!(queries::artist_detail(conn, artist.id, &at(2024, 1, 1, 0, 0)).is_ok());
    }

    fn reject(conn: &mut SqliteConnection, event: &str, table: &str) {
        diesel::sql_query(format!(
            "CREATE TRIGGER reject_{event}_{table} BEFORE {event} ON {table} \
             BEGIN SELECT RAISE(ABORT, '{table} are read-only'); END",
        ))
        .execute(conn)
        .unwrap();
    }

    #[test]
    fn failed_delete_keeps_the_shows() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        let venue = create_venue(conn, &new_venue("The Musical Hop", "San Francisco", "CA"))
            .unwrap();
        let artist = create_artist(conn, &new_artist("Guns N Petals")).unwrap();
        for day in 1..=2 {
            create_show(
                conn,
                &NewShow {
                    venue_id: venue.id,
                    artist_id: artist.id,
                    start_time: at(2035, 4, day, 20, 0),
                },
            )
            .unwrap();
        }
        reject(conn, "DELETE", "venues");

        assert!(matches!(
            delete_venue(conn, venue.id),
            Err(Error::Database(_))
        ));
        assert_eq!(show_count(conn), 2);
        assert!(queries::find_venue(conn, venue.id).is_ok());
    }

    #[test]
    fn failed_insert_leaves_no_row() {
        let (_dir, database) = database();
        let conn = &mut database.connect().unwrap();
        reject(conn, "INSERT", "venues");

        let err = create_venue(conn, &new_venue("The Musical Hop", "San Francisco", "CA"))
            .unwrap_err();
        assert_eq!(err.status_code(), gotham::hyper::StatusCode::INTERNAL_SERVER_ERROR);
        let venues: i64 = venues::table.count().get_result(conn).unwrap();
        assert_eq!(venues, 0);
    }
}
