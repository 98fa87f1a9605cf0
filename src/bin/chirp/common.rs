use std::ffi::OsStr;
use std::fs;
use std::future::Future;
use std::io;
use std::path::Path;

use anyhow::Context as _;
use chirp::Manifest;
use diesel::prelude::*;

#[derive(Clone, structopt::StructOpt)]
pub struct Opt {
    #[structopt(long = "manifest-path", help = "Path to the manifest file")]
    manifest_path: Option<String>,
}

pub struct RmGuard<P: AsRef<Path>>(pub P);

const TOML: &str = "Chirp.toml";
const JSON: &str = "Chirp.json";

impl Opt {
    pub fn search_manifest<F, T>(&self, f: F) -> io::Result<(T, &str)>
    where
        F: Fn(&Path) -> io::Result<T>,
    {
        if let Some(ref path) = self.manifest_path {
            f(path.as_ref()).map(|t| (t, &**path))
        } else {
            match f(TOML.as_ref()) {
                Ok(t) => Ok((t, TOML)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    f(JSON.as_ref()).map(|t| (t, JSON))
                }
                Err(e) => Err(e),
            }
        }
    }

    /// Opens the manifest, or falls back to the defaults if no manifest file exists
    /// and no path was given explicitly.
    pub fn open_manifest(&self) -> anyhow::Result<Manifest> {
        let (buf, path) = match self.search_manifest(|path| fs::read(path)) {
            Ok(found) => found,
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.manifest_path.is_none() => {
                debug!("no manifest found; using the default configuration");
                return Ok(Manifest::new());
            }
            Err(e) => return Err(e).context("could not open the manifest"),
        };

        let mut manifest: Manifest = match Path::new(path).extension().and_then(OsStr::to_str) {
            // `from_slice` is faster than `from_reader`.
            // See <https://github.com/serde-rs/json/issues/160>.
            Some("json") => json::from_slice(&buf).context("failed to parse the manifest")?,
            _ => toml::from_slice(&buf).context("failed to parse the manifest")?,
        };
        manifest.resolve_paths(path);
        Ok(manifest)
    }
}

impl<P: AsRef<Path>> Drop for RmGuard<P> {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

pub fn establish(manifest: &Manifest) -> anyhow::Result<SqliteConnection> {
    let conn = SqliteConnection::establish(&manifest.database_url())
        .context("failed to connect to the database")?;
    chirp::query::pragma_foreign_keys_on().execute(&conn)?;
    Ok(conn)
}

#[cfg(unix)]
pub fn quit_signal() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = int.recv() => info!("received SIGINT"),
            _ = term.recv() => info!("received SIGTERM"),
        }
    })
}

#[cfg(windows)]
pub fn quit_signal() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::{ctrl_c, windows::ctrl_break};

    let mut cb = ctrl_break()?;
    Ok(async move {
        tokio::select! {
            _ = ctrl_c() => info!("received Ctrl-C"),
            _ = cb.recv() => info!("received Ctrl-Break"),
        }
    })
}
