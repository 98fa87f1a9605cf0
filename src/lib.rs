#[macro_use]
extern crate diesel;
#[macro_use]
extern crate log;
#[macro_use]
extern crate diesel_migrations;

#[macro_use]
mod util;

pub mod api;
pub mod error;
pub mod manifest;
pub mod migrations;
pub mod models;
pub mod query;
#[rustfmt::skip]
pub mod schema;
pub mod socket;
pub mod tweets;
pub mod users;

#[cfg(test)]
mod testing;

pub use api::Api;
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use util::r2d2::SqlitePool;

#[doc(hidden)]
pub mod private {
    pub mod util {
        pub use crate::util::r2d2;
    }
}
