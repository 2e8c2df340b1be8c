#[macro_use]
extern crate rocket;

pub mod article;
pub mod config;
pub mod db;
pub mod errors;
pub mod follows;
pub mod profile;
pub mod types;
pub mod users;
mod utils;

use rocket::request::Request;
use rocket::response::content::RawJson;
use rocket::{Build, Rocket};
use serde_json::json;

use crate::config::Config;

fn error_body(message: &str) -> RawJson<String> {
    let json = json!({
        "errors": {
            "body": [message]
        }
    });
    RawJson(json.to_string())
}

#[catch(401)]
fn unauthorized(_req: &Request) -> RawJson<String> {
    error_body("unauthorized")
}

#[catch(404)]
fn not_found(_req: &Request) -> RawJson<String> {
    error_body("entity not found")
}

#[catch(422)]
fn unprocessable(_req: &Request) -> RawJson<String> {
    error_body("unprocessable request")
}

#[catch(500)]
fn internal(_req: &Request) -> RawJson<String> {
    error_body("internal server error")
}

/// Builds the server: opens the pool, installs the schema and mounts the
/// article routes.
pub fn rocket(config: Config) -> errors::Result<Rocket<Build>> {
    let pool = db::init_pool(&config)?;
    Ok(rocket::build()
        .manage(pool)
        .manage(config)
        .mount(
            "/api/articles",
            routes![
                article::list,
                article::personal_feed,
                article::create,
                article::get,
                article::update,
                article::delete,
                article::favorite,
                article::unfavorite,
            ],
        )
        .register("/", catchers![unauthorized, not_found, unprocessable, internal]))
}
