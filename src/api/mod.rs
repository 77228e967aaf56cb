use rocket::{
    http::{Status, StatusClass},
    response::status::Custom,
    serde::json::Json,
    Catcher, Request, Route,
};

use crate::error::{Error, ErrorBody, ErrorKind, Result};
use crate::model::{
    common::election::ElectionId,
    db::election::Election,
    mongodb::{u32_id_filter, Coll},
};

pub mod admin;
pub mod auth;
pub mod public;
pub mod voter;

#[cfg(test)]
mod testing;

/// Where [`routes`] are mounted.
pub const BASE: &str = "/api";

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(auth::routes());
    routes.extend(voter::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Give failures raised by Rocket itself (unmatched routes, unparseable
/// bodies, failed guards) the same JSON shape as handler errors.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request<'_>) -> Custom<Json<ErrorBody>> {
    let (status, kind) = match status.code {
        // Rocket reports malformed JSON bodies as 422.
        400 | 422 => (Status::BadRequest, ErrorKind::ValidationError),
        401 => (status, ErrorKind::Unauthorized),
        403 => (status, ErrorKind::Forbidden),
        404 => (status, ErrorKind::NotFound),
        409 => (status, ErrorKind::Conflict),
        _ if status.class() == StatusClass::ServerError => (status, ErrorKind::Internal),
        _ => (status, ErrorKind::ValidationError),
    };
    let message = status.reason().unwrap_or("Request failed").to_string();
    Custom(status, Json(ErrorBody { kind, message }))
}

/// Look up an election, or fail with `NotFound`.
pub(crate) async fn find_election(
    elections: &Coll<Election>,
    election_id: ElectionId,
) -> Result<Election> {
    elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))
}
