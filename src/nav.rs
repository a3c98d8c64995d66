//! Hash-fragment routes: `#graph`, `#scenarios`, `#live` and
//! `#entities/<id>`, each optionally followed by `?period=1w|4w|12w`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "4w")]
    FourWeeks,
    #[serde(rename = "12w")]
    TwelveWeeks,
}

impl Period {
    pub const ALL: [Period; 3] = [Self::OneWeek, Self::FourWeeks, Self::TwelveWeeks];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneWeek => "1w",
            Self::FourWeeks => "4w",
            Self::TwelveWeeks => "12w",
        }
    }

    pub fn label(period: Option<Self>) -> &'static str {
        match period {
            None => "All Time",
            Some(Self::OneWeek) => "1 Week",
            Some(Self::FourWeeks) => "4 Weeks",
            Some(Self::TwelveWeeks) => "12 Weeks",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|period| period.as_str() == value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Graph,
    Scenarios,
    Live,
    Entity(String),
}

impl Route {
    pub fn entity(id: impl Into<String>) -> Self {
        Self::Entity(id.into())
    }
}

/// A route plus the reporting period carried in its query string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub period: Option<Period>,
}

impl Location {
    pub fn new(route: Route) -> Self {
        Self { route, period: None }
    }

    pub fn with_period(mut self, period: Option<Period>) -> Self {
        self.period = period;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown route `{0}`")]
    Unknown(String),
    #[error("entity route is missing an id")]
    MissingEntityId,
}

impl FromStr for Location {
    type Err = RouteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let fragment = raw.trim().trim_start_matches('#');
        let (path, query) = fragment.split_once('?').unwrap_or((fragment, ""));

        // Unknown periods are ignored rather than rejected.
        let period = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "period")
            .and_then(|(_, value)| Period::parse(value));

        let route = match path.trim_end_matches('/') {
            "" | "graph" => Route::Graph,
            "scenarios" => Route::Scenarios,
            "live" => Route::Live,
            other => match other.strip_prefix("entities/") {
                Some("") => return Err(RouteError::MissingEntityId),
                Some(id) => Route::Entity(id.to_owned()),
                None if other == "entities" => return Err(RouteError::MissingEntityId),
                None => return Err(RouteError::Unknown(other.to_owned())),
            },
        };

        Ok(Self { route, period })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.route {
            Route::Graph => f.write_str("#graph")?,
            Route::Scenarios => f.write_str("#scenarios")?,
            Route::Live => f.write_str("#live")?,
            Route::Entity(id) => write!(f, "#entities/{id}")?,
        }
        if let Some(period) = self.period {
            write!(f, "?period={}", period.as_str())?;
        }
        Ok(())
    }
}
