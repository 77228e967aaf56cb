#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;
use config::{ConfigFairing, DatabaseFairing};
use logging::AccessLogFairing;

/// Assemble the server: routes, error catchers and every fairing.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount(api::BASE, api::routes())
        .register("/", api::catchers())
        .attach(AccessLogFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
}

/// Connect to the database configured in `Rocket.toml`.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Failed to connect to database")
}

/// A fresh database name, so tests can run in parallel.
#[cfg(test)]
pub(crate) fn database() -> String {
    use rand::Rng;
    format!("test{}", rand::thread_rng().gen::<u32>())
}

/// A server using the given database in place of the production one.
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    config::prepare_database(&db)
        .await
        .expect("Failed to prepare test database");
    rocket::build()
        .mount(api::BASE, api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .manage(client)
        .manage(db)
}
