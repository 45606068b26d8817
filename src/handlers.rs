use chrono::{Local, NaiveDateTime};
use gotham::handler::HandlerResult;
use gotham::helpers::http::response::{create_empty_response, create_response};
use gotham::hyper::header::{HeaderValue, CACHE_CONTROL, LOCATION};
use gotham::hyper::{body, Body, Response, StatusCode};
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};
use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, FieldError};
use crate::forms::{ArtistForm, SearchForm, ShowForm, VenueForm};
use crate::outcome::Outcome;
use crate::router::AppState;
use crate::templates::{self, statics::StaticFile};
use crate::{mutations, queries};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct IdPath {
    id: String,
}

impl IdPath {
    /// The route only admits digits, but those can still overflow `i32`.
    fn id(state: &State) -> Result<i32, Error> {
        let raw = &IdPath::borrow_from(state).id;
        raw.parse().map_err(|_| Error::IdOutOfRange(raw.clone()))
    }
}

/// Set by the redirect that follows a successful edit.
#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct ProfileQuery {
    #[serde(default)]
    updated: bool,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct StaticPath {
    name: String,
}

/// Read once per request; every show on the page is classified against it.
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn render<F>(f: F) -> Result<Vec<u8>, Error>
where
    F: FnOnce(&mut Vec<u8>) -> std::io::Result<()>,
{
    let mut buf = Vec::new();
    f(&mut buf)?;
    Ok(buf)
}

fn html(state: &State, status: StatusCode, page: Result<Vec<u8>, Error>) -> Response<Body> {
    match page {
        Ok(body) => create_response(state, status, mime::TEXT_HTML_UTF_8, body),
        Err(err) => err.as_response(state),
    }
}

fn redirect(state: &State, to: &str) -> Response<Body> {
    let mut response = create_empty_response(state, StatusCode::SEE_OTHER);
    if let Ok(location) = HeaderValue::from_str(to) {
        response.headers_mut().insert(LOCATION, location);
    }
    response
}

fn field_errors(err: &Error) -> &[FieldError] {
    match err {
        Error::Validation(errors) => errors,
        _ => &[],
    }
}

async fn read_body(state: &mut State) -> Result<body::Bytes, Error> {
    Ok(body::to_bytes(Body::take_from(state)).await?)
}

async fn read_edit(state: &mut State) -> Result<(i32, body::Bytes), Error> {
    let id = IdPath::id(state)?;
    Ok((id, read_body(state).await?))
}

pub fn index(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let page = render(|buf| templates::home_html(buf, &app.site_name, None));
    let response = html(&state, StatusCode::OK, page);
    (state, response)
}

pub fn not_found(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let page = render(|buf| templates::not_found_html(buf, &app.site_name));
    let response = html(&state, StatusCode::NOT_FOUND, page);
    (state, response)
}

pub fn static_file(state: State) -> (State, Response<Body>) {
    let name = &StaticPath::borrow_from(&state).name;
    match StaticFile::get(name) {
        Some(file) => {
            let mut response =
                create_response(&state, StatusCode::OK, file.mime.clone(), file.content);
            response.headers_mut().insert(
                CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            );
            (state, response)
        }
        None => not_found(state),
    }
}

pub fn venues(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let page = app
        .database
        .run(|conn| queries::venue_areas(conn, &now()))
        .and_then(|areas| render(|buf| templates::venues_html(buf, &app.site_name, &areas)));
    let response = html(&state, StatusCode::OK, page);
    (state, response)
}

#[derive(Clone, Copy)]
enum Directory {
    Venues,
    Artists,
}

impl Directory {
    fn path(self) -> &'static str {
        match self {
            Directory::Venues => "venues",
            Directory::Artists => "artists",
        }
    }
}

fn search_response(state: &State, body: &[u8], directory: Directory) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let page = SearchForm::from_form_body(body).and_then(|form| {
        log::info!("Searching {} for {:?}", directory.path(), form.search_term);
        let results = app.database.run(|conn| match directory {
            Directory::Venues => queries::search_venues(conn, &form.search_term, &now()),
            Directory::Artists => queries::search_artists(conn, &form.search_term, &now()),
        })?;
        render(|buf| {
            templates::search_html(
                buf,
                &app.site_name,
                directory.path(),
                &form.search_term,
                &results,
            )
        })
    });
    html(state, StatusCode::OK, page)
}

pub async fn search_venues(mut state: State) -> HandlerResult {
    let response = match read_body(&mut state).await {
        Ok(body) => search_response(&state, &body, Directory::Venues),
        Err(err) => err.as_response(&state),
    };
    Ok((state, response))
}

pub fn show_venue(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let updated = ProfileQuery::borrow_from(&state).updated;
    let page = IdPath::id(&state)
        .and_then(|id| app.database.run(|conn| queries::venue_detail(conn, id, &now())))
        .and_then(|detail| {
            let flash = updated.then(|| Outcome::updated("Venue", &detail.venue.name));
            render(|buf| templates::venue_html(buf, &app.site_name, flash.as_ref(), &detail))
        });
    let response = html(&state, StatusCode::OK, page);
    (state, response)
}

fn venue_form_page(
    state: &State,
    status: StatusCode,
    flash: Option<&Outcome>,
    action: &str,
    heading: &str,
    form: &VenueForm,
    errors: &[FieldError],
) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let page = render(|buf| {
        templates::venue_form_html(buf, &app.site_name, flash, action, heading, form, errors)
    });
    html(state, status, page)
}

pub fn create_venue_form(state: State) -> (State, Response<Body>) {
    let response = venue_form_page(
        &state,
        StatusCode::OK,
        None,
        "/venues/create",
        "List a new venue",
        &VenueForm::default(),
        &[],
    );
    (state, response)
}

fn create_venue_response(state: &State, body: &[u8]) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let form = VenueForm::from_form_body(body);
    let created = form
        .validate()
        .and_then(|venue| app.database.run(|conn| mutations::create_venue(conn, &venue)));
    match created {
        Ok(venue) => {
            let outcome = Outcome::listed("Venue", &venue.name);
            log::info!("{} (id {})", outcome.message, venue.id);
            let page = render(|buf| templates::home_html(buf, &app.site_name, Some(&outcome)));
            html(state, StatusCode::OK, page)
        }
        Err(err) => {
            log::warn!("Could not create venue: {}", err);
            let outcome = Outcome::not_listed("Venue", form.display_name());
            venue_form_page(
                state,
                err.status_code(),
                Some(&outcome),
                "/venues/create",
                "List a new venue",
                &form,
                field_errors(&err),
            )
        }
    }
}

pub async fn create_venue_submission(mut state: State) -> HandlerResult {
    let response = match read_body(&mut state).await {
        Ok(body) => create_venue_response(&state, &body),
        Err(err) => err.as_response(&state),
    };
    Ok((state, response))
}

pub fn edit_venue_form(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let found =
        IdPath::id(&state).and_then(|id| app.database.run(|conn| queries::find_venue(conn, id)));
    let response = match found {
        Ok(venue) => venue_form_page(
            &state,
            StatusCode::OK,
            None,
            &format!("/venues/{}/edit", venue.id),
            &format!("Edit venue {}", venue.name),
            &VenueForm::from_venue(&venue),
            &[],
        ),
        Err(err) => err.as_response(&state),
    };
    (state, response)
}

fn edit_venue_response(state: &State, id: i32, body: &[u8]) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let form = VenueForm::from_form_body(body);
    let updated = app.database.run(|conn| {
        queries::find_venue(conn, id)?;
        let venue = form.validate()?;
        mutations::update_venue(conn, id, &venue)
    });
    match updated {
        Ok(venue) => {
            log::info!("{}", Outcome::updated("Venue", &venue.name).message);
            redirect(state, &format!("/venues/{}?updated=true", id))
        }
        Err(err) if err.is_not_found() => err.as_response(state),
        Err(err) => {
            log::warn!("Could not update venue {}: {}", id, err);
            let outcome = Outcome::not_updated("Venue", form.display_name());
            venue_form_page(
                state,
                err.status_code(),
                Some(&outcome),
                &format!("/venues/{}/edit", id),
                &format!("Edit venue {}", form.display_name()),
                &form,
                field_errors(&err),
            )
        }
    }
}

pub async fn edit_venue_submission(mut state: State) -> HandlerResult {
    let response = match read_edit(&mut state).await {
        Ok((id, body)) => edit_venue_response(&state, id, &body),
        Err(err) => err.as_response(&state),
    };
    Ok((state, response))
}

#[derive(Serialize)]
struct DeleteResponse {
    redirected: bool,
    url: &'static str,
    success: bool,
    message: String,
}

pub fn delete_venue(state: State) -> (State, Response<Body>) {
    let raw_id = IdPath::borrow_from(&state).id.as_str();
    let app = AppState::borrow_from(&state);
    let deleted = IdPath::id(&state)
        .and_then(|id| app.database.run(|conn| mutations::delete_venue(conn, id)));
    let (status, outcome) = match deleted {
        Ok(removed_shows) => {
            log::info!("Deleted venue {} and {} of its shows", raw_id, removed_shows);
            (StatusCode::OK, Outcome::deleted("Venue", raw_id))
        }
        Err(err) => {
            log::error!("Could not delete venue {}: {}", raw_id, err);
            (err.status_code(), Outcome::not_deleted("Venue", raw_id))
        }
    };
    let payload = DeleteResponse {
        redirected: true,
        url: "/",
        success: outcome.is_success(),
        message: outcome.message,
    };
    let response = match serde_json::to_string(&payload) {
        Ok(json) => create_response(&state, status, mime::APPLICATION_JSON, json),
        Err(err) => Error::from(err).as_response(&state),
    };
    (state, response)
}

pub fn artists(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let page = app
        .database
        .run(queries::list_artists)
        .and_then(|artists| render(|buf| templates::artists_html(buf, &app.site_name, &artists)));
    let response = html(&state, StatusCode::OK, page);
    (state, response)
}

pub async fn search_artists(mut state: State) -> HandlerResult {
    let response = match read_body(&mut state).await {
        Ok(body) => search_response(&state, &body, Directory::Artists),
        Err(err) => err.as_response(&state),
    };
    Ok((state, response))
}

pub fn show_artist(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let updated = ProfileQuery::borrow_from(&state).updated;
    let page = IdPath::id(&state)
        .and_then(|id| app.database.run(|conn| queries::artist_detail(conn, id, &now())))
        .and_then(|detail| {
            let flash = updated.then(|| Outcome::updated("Artist", &detail.artist.name));
            render(|buf| templates::artist_html(buf, &app.site_name, flash.as_ref(), &detail))
        });
    let response = html(&state, StatusCode::OK, page);
    (state, response)
}

fn artist_form_page(
    state: &State,
    status: StatusCode,
    flash: Option<&Outcome>,
    action: &str,
    heading: &str,
    form: &ArtistForm,
    errors: &[FieldError],
) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let page = render(|buf| {
        templates::artist_form_html(buf, &app.site_name, flash, action, heading, form, errors)
    });
    html(state, status, page)
}

pub fn create_artist_form(state: State) -> (State, Response<Body>) {
    let response = artist_form_page(
        &state,
        StatusCode::OK,
        None,
        "/artists/create",
        "List a new artist",
        &ArtistForm::default(),
        &[],
    );
    (state, response)
}

fn create_artist_response(state: &State, body: &[u8]) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let form = ArtistForm::from_form_body(body);
    let created = form
        .validate()
        .and_then(|artist| app.database.run(|conn| mutations::create_artist(conn, &artist)));
    match created {
        Ok(artist) => {
            let outcome = Outcome::listed("Artist", &artist.name);
            log::info!("{} (id {})", outcome.message, artist.id);
            let page = render(|buf| templates::home_html(buf, &app.site_name, Some(&outcome)));
            html(state, StatusCode::OK, page)
        }
        Err(err) => {
            log::warn!("Could not create artist: {}", err);
            let outcome = Outcome::not_listed("Artist", form.display_name());
            artist_form_page(
                state,
                err.status_code(),
                Some(&outcome),
                "/artists/create",
                "List a new artist",
                &form,
                field_errors(&err),
            )
        }
    }
}

pub async fn create_artist_submission(mut state: State) -> HandlerResult {
    let response = match read_body(&mut state).await {
        Ok(body) => create_artist_response(&state, &body),
        Err(err) => err.as_response(&state),
    };
    Ok((state, response))
}

pub fn edit_artist_form(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let found =
        IdPath::id(&state).and_then(|id| app.database.run(|conn| queries::find_artist(conn, id)));
    let response = match found {
        Ok(artist) => artist_form_page(
            &state,
            StatusCode::OK,
            None,
            &format!("/artists/{}/edit", artist.id),
            &format!("Edit artist {}", artist.name),
            &ArtistForm::from_artist(&artist),
            &[],
        ),
        Err(err) => err.as_response(&state),
    };
    (state, response)
}

fn edit_artist_response(state: &State, id: i32, body: &[u8]) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let form = ArtistForm::from_form_body(body);
    let updated = app.database.run(|conn| {
        queries::find_artist(conn, id)?;
        let artist = form.validate()?;
        mutations::update_artist(conn, id, &artist)
    });
    match updated {
        Ok(artist) => {
            log::info!("{}", Outcome::updated("Artist", &artist.name).message);
            redirect(state, &format!("/artists/{}?updated=true", id))
        }
        Err(err) if err.is_not_found() => err.as_response(state),
        Err(err) => {
            log::warn!("Could not update artist {}: {}", id, err);
            let outcome = Outcome::not_updated("Artist", form.display_name());
            artist_form_page(
                state,
                err.status_code(),
                Some(&outcome),
                &format!("/artists/{}/edit", id),
                &format!("Edit artist {}", form.display_name()),
                &form,
                field_errors(&err),
            )
        }
    }
}

pub async fn edit_artist_submission(mut state: State) -> HandlerResult {
    let response = match read_edit(&mut state).await {
        Ok((id, body)) => edit_artist_response(&state, id, &body),
        Err(err) => err.as_response(&state),
    };
    Ok((state, response))
}

pub fn shows(state: State) -> (State, Response<Body>) {
    let app = AppState::borrow_from(&state);
    let page = app
        .database
        .run(queries::list_shows)
        .and_then(|shows| render(|buf| templates::shows_html(buf, &app.site_name, &shows)));
    let response = html(&state, StatusCode::OK, page);
    (state, response)
}

fn show_form_page(
    state: &State,
    status: StatusCode,
    flash: Option<&Outcome>,
    form: &ShowForm,
    errors: &[FieldError],
) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let page = render(|buf| templates::show_form_html(buf, &app.site_name, flash, form, errors));
    html(state, status, page)
}

pub fn create_show_form(state: State) -> (State, Response<Body>) {
    let response = show_form_page(&state, StatusCode::OK, None, &ShowForm::default(), &[]);
    (state, response)
}

fn create_show_response(state: &State, body: &[u8]) -> Response<Body> {
    let app = AppState::borrow_from(state);
    let form = match ShowForm::from_form_body(body) {
        Ok(form) => form,
        Err(err) => return err.as_response(state),
    };
    let created = form
        .validate()
        .and_then(|show| app.database.run(|conn| mutations::create_show(conn, &show)));
    match created {
        Ok(show) => {
            let outcome = Outcome::listed("Show at", &show.start_time.to_string());
            log::info!("{} (id {})", outcome.message, show.id);
            let page = render(|buf| templates::home_html(buf, &app.site_name, Some(&outcome)));
            html(state, StatusCode::OK, page)
        }
        Err(err) => {
            log::warn!("Could not create show: {}", err);
            let outcome = Outcome::not_listed("Show at", form.start_time.trim());
            show_form_page(
                state,
                err.status_code(),
                Some(&outcome),
                &form,
                field_errors(&err),
            )
        }
    }
}

pub async fn create_show_submission(mut state: State) -> HandlerResult {
    let response = match read_body(&mut state).await {
        Ok(body) => create_show_response(&state, &body),
        Err(err) => err.as_response(&state),
    };
    Ok((state, response))
}
