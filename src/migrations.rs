//! Schema migrations embedded from the `migrations/` directory.

embed_migrations!("migrations");

pub use self::embedded_migrations::{run, run_with_output};
