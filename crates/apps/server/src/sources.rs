//! Boundary document sources read once at startup.
//!
//! A source is written as `name=location` or just `location`; locations that
//! start with `http://` or `https://` are fetched, anything else is a file.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use formats::{BoundaryDocument, BoundaryError};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("reading {path} failed: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("boundary name {name:?} is used by more than one source")]
    DuplicateName { name: String },
    #[error("boundary source {name:?} is not valid GeoJSON: {source}")]
    Parse {
        name: String,
        #[source]
        source: BoundaryError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySource {
    pub name: String,
    pub location: Location,
}

impl FromStr for BoundarySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, location) = match s.split_once('=') {
            Some((name, location)) if !name.contains('/') && !name.contains(':') => {
                (Some(name.trim().to_string()), location.trim())
            }
            _ => (None, s),
        };
        if location.is_empty() {
            return Err(format!("empty boundary location in {s:?}"));
        }

        let location = if location.starts_with("http://") || location.starts_with("https://") {
            Location::Url(location.to_string())
        } else {
            Location::File(PathBuf::from(location))
        };
        let name = match name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => default_name(&location),
        };
        Ok(Self { name, location })
    }
}

impl fmt::Display for BoundarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Location::Url(url) => write!(f, "{}={}", self.name, url),
            Location::File(path) => write!(f, "{}={}", self.name, path.display()),
        }
    }
}

/// Last path segment without its extension.
fn default_name(location: &Location) -> String {
    let segment = match location {
        Location::Url(url) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(url)
            .to_string(),
        Location::File(path) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    match segment.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => segment,
    }
}

impl BoundarySource {
    pub async fn load(&self, http: &reqwest::Client) -> Result<BoundaryDocument, SourceError> {
        let payload = match &self.location {
            Location::Url(url) => fetch(http, url).await?,
            Location::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::Read {
                        path: path.clone(),
                        source,
                    })?
            }
        };
        let doc = BoundaryDocument::from_geojson_str(self.name.clone(), &payload).map_err(
            |source| SourceError::Parse {
                name: self.name.clone(),
                source,
            },
        )?;
        info!(
            "loaded boundary {} ({} features)",
            self.name,
            doc.features.len()
        );
        Ok(doc)
    }
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<String, SourceError> {
    let fetch_err = |source| SourceError::Fetch {
        url: url.to_string(),
        source,
    };
    http.get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(fetch_err)?
        .text()
        .await
        .map_err(fetch_err)
}

/// Loads every source in order; the first failure aborts.
///
/// Names must be unique since documents are served by name.
pub async fn load_all(
    sources: &[BoundarySource],
    http: &reqwest::Client,
) -> Result<Vec<BoundaryDocument>, SourceError> {
    let mut names = BTreeSet::new();
    for source in sources {
        if !names.insert(source.name.as_str()) {
            return Err(SourceError::DuplicateName {
                name: source.name.clone(),
            });
        }
    }

    let mut docs = Vec::with_capacity(sources.len());
    for source in sources {
        docs.push(source.load(http).await?);
    }
    Ok(docs)
}
