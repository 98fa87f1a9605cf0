use std::borrow::Cow;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{de, Deserialize};

use crate::socket;

#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    pub database_url: Option<Box<str>>,
    pub bind: Option<socket::Addr>,
}

pub const DEFAULT_PORT: u16 = 8080;

impl Manifest {
    pub fn new() -> Self {
        Default::default()
    }

    /// Resolves relative paths in the manifest against the directory of the manifest file
    /// located at `manifest_path`.
    pub fn resolve_paths(&mut self, manifest_path: &str) {
        let base = match Path::new(manifest_path).parent().and_then(Path::to_str) {
            Some(base) => base,
            None => return,
        };
        if let Some(new) = self
            .database_url
            .as_ref()
            .and_then(|path| resolve_database_uri(path, base))
        {
            self.database_url = Some(new);
        }
        if let Some(socket::Addr::Unix(ref mut path)) = self.bind {
            if path.is_relative() && !base.is_empty() {
                *path = Path::new(base).join(&*path);
            }
        }
    }

    pub fn database_url(&self) -> Cow<'_, str> {
        if let Some(ref url) = self.database_url {
            Cow::Borrowed(url)
        } else if let Ok(url) = dotenv::var("DATABASE_URL") {
            Cow::Owned(url)
        } else {
            Cow::Borrowed("chirp.sqlite3")
        }
    }

    pub fn bind(&self) -> socket::Addr {
        self.bind.clone().unwrap_or_else(|| {
            socket::Addr::Tcp(SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)))
        })
    }

    /// Validates the manifest.
    ///
    /// This is automatically done on deserialization so you do not need to call this method
    /// unless you have manually modified the struct.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(e) = self.validate_() {
            anyhow::bail!(e);
        }
        Ok(())
    }

    fn validate_(&self) -> Option<&'static str> {
        if self.database_url.as_deref() == Some("") {
            return Some("`database_url` must not be empty");
        }
        None
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: de::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(remote = "self::Manifest")]
        #[serde(deny_unknown_fields)]
        pub struct Manifest {
            #[serde(default)]
            pub database_url: Option<Box<str>>,
            #[serde(default)]
            pub bind: Option<socket::Addr>,
        }

        let ret = Manifest::deserialize(d)?;
        if let Some(e) = ret.validate_() {
            return Err(de::Error::custom(e));
        }

        Ok(ret)
    }
}

fn resolve_path(path: &str, base: &str) -> Option<Box<str>> {
    if Path::new(path).is_absolute() || base.is_empty() {
        None
    } else {
        Path::new(base)
            .join(&path)
            .into_os_string()
            .into_string()
            .ok()
            .map(Into::into)
    }
}

fn resolve_database_uri(uri: &str, base: &str) -> Option<Box<str>> {
    // <https://sqlite.org/c3ref/open.html>.
    if uri.starts_with("file:///")
        || uri.starts_with("file://localhost/")
        || (uri
            .strip_prefix("file:/")
            .map_or(false, |s| !s.starts_with('/')))
        || uri == ":memory:"
    {
        // Absolute URI filename or in-memory database.
        None
    } else if let Some(path) = uri.strip_prefix("file:").filter(|s| !s.starts_with("//")) {
        // Relative URI filename
        let i = path
            .find('?')
            .or_else(|| path.find('#'))
            .unwrap_or_else(|| path.len());
        let (path, query_and_fragment) = path.split_at(i);
        resolve_path(path, base).map(|new| {
            ["file:", &new, query_and_fragment]
                .iter()
                .copied()
                .collect::<String>()
                .into()
        })
    } else {
        // Ordinary filename
        resolve_path(uri, base)
    }
}
