use gotham::middleware::logger::RequestLogger;
use gotham::middleware::state::StateMiddleware;
use gotham::pipeline::{new_pipeline, single_pipeline};
use gotham::router::{builder::*, Router};
use gotham_derive::StateData;

use crate::db::Database;
use crate::handlers::{self, IdPath, ProfileQuery, StaticPath};

/// Shared by every request: where the data lives and what the site is called.
#[derive(Clone, StateData)]
pub struct AppState {
    pub database: Database,
    pub site_name: String,
}

impl AppState {
    pub fn new(database: Database, site_name: impl Into<String>) -> AppState {
        AppState {
            database,
            site_name: site_name.into(),
        }
    }
}

pub fn router(app: AppState) -> Router {
    let pipeline = new_pipeline()
        .add(RequestLogger::new(log::Level::Info))
        .add(StateMiddleware::new(app))
        .build();
    let (chain, pipelines) = single_pipeline(pipeline);

    build_router(chain, pipelines, |route| {
        route.get("/").to(handlers::index);
        route
            .get("/static/:name")
            .with_path_extractor::<StaticPath>()
            .to(handlers::static_file);

        route.get("/venues").to(handlers::venues);
        route.post("/venues/search").to_async(handlers::search_venues);
        route.get("/venues/create").to(handlers::create_venue_form);
        route
            .post("/venues/create")
            .to_async(handlers::create_venue_submission);
        route
            .get("/venues/:id:[0-9]+")
            .with_path_extractor::<IdPath>()
            .with_query_string_extractor::<ProfileQuery>()
            .to(handlers::show_venue);
        route
            .delete("/venues/:id:[0-9]+")
            .with_path_extractor::<IdPath>()
            .to(handlers::delete_venue);
        route
            .get("/venues/:id:[0-9]+/edit")
            .with_path_extractor::<IdPath>()
            .to(handlers::edit_venue_form);
        route
            .post("/venues/:id:[0-9]+/edit")
            .with_path_extractor::<IdPath>()
            .to_async(handlers::edit_venue_submission);

        route.get("/artists").to(handlers::artists);
        route.post("/artists/search").to_async(handlers::search_artists);
        route.get("/artists/create").to(handlers::create_artist_form);
        route
            .post("/artists/create")
            .to_async(handlers::create_artist_submission);
        route
            .get("/artists/:id:[0-9]+")
            .with_path_extractor::<IdPath>()
            .with_query_string_extractor::<ProfileQuery>()
            .to(handlers::show_artist);
        route
            .get("/artists/:id:[0-9]+/edit")
            .with_path_extractor::<IdPath>()
            .to(handlers::edit_artist_form);
        route
            .post("/artists/:id:[0-9]+/edit")
            .with_path_extractor::<IdPath>()
            .to_async(handlers::edit_artist_submission);

        route.get("/shows").to(handlers::shows);
        route.get("/shows/create").to(handlers::create_show_form);
        route
            .post("/shows/create")
            .to_async(handlers::create_show_submission);

        route.get("/*").to(handlers::not_found);
    })
}
