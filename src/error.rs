use gotham::helpers::http::response::create_response;
use gotham::hyper::{Body, Response, StatusCode};
use gotham::state::{FromState, State};
use thiserror::Error;

use crate::router::AppState;
use crate::templates;

/// A single rejected form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> FieldError {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn plural(errors: &[FieldError]) -> &'static str {
    if errors.len() == 1 {
        ""
    } else {
        "s"
    }
}

fn field_names(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Venue not found: {0}")]
    VenueNotFound(i32),
    #[error("Artist not found: {0}")]
    ArtistNotFound(i32),
    #[error("No record has id {0}")]
    IdOutOfRange(String),
    #[error("No venue with id {0}")]
    UnknownVenue(i32),
    #[error("No artist with id {0}")]
    UnknownArtist(i32),
    #[error("Invalid field{}: {}", plural(.0), field_names(.0))]
    Validation(Vec<FieldError>),
    #[error("Malformed form submission")]
    Form(#[from] serde_urlencoded::de::Error),
    #[error("Database connection error")]
    DatabaseConnection(#[from] diesel::ConnectionError),
    #[error("Database error")]
    Database(#[from] diesel::result::Error),
    #[error("Could not run database migrations")]
    Migration(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Could not read request body")]
    Body(#[from] gotham::hyper::Error),
    #[error("Could not render page")]
    Render(#[from] std::io::Error),
    #[error("Could not encode response")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            VenueNotFound(..) | ArtistNotFound(..) | IdOutOfRange(..) => StatusCode::NOT_FOUND,
            UnknownVenue(..) | UnknownArtist(..) | Validation(..) | Form(..) => {
                StatusCode::BAD_REQUEST
            }
            DatabaseConnection(..) | Database(..) | Migration(..) | Body(..) | Render(..)
            | Json(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == StatusCode::NOT_FOUND
    }

    /// Renders the dedicated 404/500 page, or a plain-text body for client errors.
    pub fn as_response(&self, state: &State) -> Response<Body> {
        let status = self.status_code();
        let site_name = AppState::borrow_from(state).site_name.as_str();
        let mut buf = Vec::new();
        let rendered = match status {
            StatusCode::NOT_FOUND => templates::not_found_html(&mut buf, site_name),
            StatusCode::INTERNAL_SERVER_ERROR => {
                log::error!("{}: {:?}", self, self);
                templates::server_error_html(&mut buf, site_name)
            }
            _ => {
                return create_response(
                    state,
                    status,
                    mime::TEXT_PLAIN_UTF_8,
                    format!("Error: {}", self),
                )
            }
        };
        match rendered {
            Ok(()) => create_response(state, status, mime::TEXT_HTML_UTF_8, buf),
            Err(err) => {
                log::error!("Could not render error page: {}", err);
                create_response(
                    state,
                    status,
                    mime::TEXT_PLAIN_UTF_8,
                    format!("Error: {}", self),
                )
            }
        }
    }
}
