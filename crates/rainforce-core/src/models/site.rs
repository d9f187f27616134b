use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a rainfall gauge site as issued by the statistics service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A rainfall site and its point location (longitude, latitude)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: [f64; 2],
}

impl Site {
    pub fn new(id: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self { id: SiteId::new(id), name: None, location: [lon, lat] }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn lon(&self) -> f64 {
        self.location[0]
    }

    pub fn lat(&self) -> f64 {
        self.location[1]
    }

    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.location[0], self.location[1])
    }
}
