// models/betsapi.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// BetsAPI sends most scalars either as strings or as bare numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FlexValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlexValue::Int(v) => Some(*v as f64),
            FlexValue::Float(v) => Some(*v),
            FlexValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FlexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexValue::Int(v) => write!(f, "{}", v),
            FlexValue::Float(v) => write!(f, "{}", v),
            FlexValue::Text(s) => f.write_str(s),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(FlexValue::deserialize(deserializer)?.to_string())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlexValue>::deserialize(deserializer)?.map(|v| v.to_string()))
}

/// One statistic series: `(home, away)`. Either side may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Option<FlexValue>>", into = "Vec<Option<FlexValue>>")]
pub struct StatPair {
    pub home: Option<FlexValue>,
    pub away: Option<FlexValue>,
}

impl StatPair {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        StatPair {
            home: Some(FlexValue::Text(home.into())),
            away: Some(FlexValue::Text(away.into())),
        }
    }

    pub fn total(&self) -> f64 {
        let side = |v: &Option<FlexValue>| v.as_ref().and_then(FlexValue::as_f64).unwrap_or(0.0);
        side(&self.home) + side(&self.away)
    }

    pub fn both_present(&self) -> bool {
        let present = |v: &Option<FlexValue>| match v {
            Some(FlexValue::Text(s)) => !s.is_empty(),
            Some(_) => true,
            None => false,
        };
        present(&self.home) && present(&self.away)
    }
}

impl From<Vec<Option<FlexValue>>> for StatPair {
    fn from(values: Vec<Option<FlexValue>>) -> Self {
        let mut values = values.into_iter();
        StatPair {
            home: values.next().flatten(),
            away: values.next().flatten(),
        }
    }
}

impl From<StatPair> for Vec<Option<FlexValue>> {
    fn from(pair: StatPair) -> Self {
        vec![pair.home, pair.away]
    }
}

/// Named statistic series. A missing key means the provider did not report it.
pub type MatchStats = BTreeMap<String, StatPair>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct League {
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodScore {
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub away: Option<String>,
}

pub type MatchScores = BTreeMap<String, PeriodScore>;

/// Elapsed-time descriptor, only reported while a match is in play.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchTimer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tm: Option<FlexValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<FlexValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tt: Option<FlexValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta: Option<FlexValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<FlexValue>,
}

/// A single event as returned by the BetsAPI listing and detail endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BetsApiMatch {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub sport_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub time_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league: Option<League>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<Team>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away: Option<Team>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o_home: Option<Team>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o_away: Option<Team>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<MatchScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<MatchTimer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<MatchStats>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub bet365_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
}

impl Pager {
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetsApiListResponse {
    #[serde(default)]
    pub success: Option<FlexValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pager: Option<Pager>,
    #[serde(default)]
    pub results: Vec<BetsApiMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BetsApiListResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.success.as_ref().and_then(FlexValue::as_f64), Some(v) if v == 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Upcoming,
    Inplay,
    Ended,
}

impl MatchType {
    /// Upstream `time_status` code for this listing.
    pub fn time_status(self) -> &'static str {
        match self {
            MatchType::Upcoming => "0",
            MatchType::Inplay => "1",
            MatchType::Ended => "3",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Upcoming => "upcoming",
            MatchType::Inplay => "inplay",
            MatchType::Ended => "ended",
        }
    }

    /// In-play listings come back in one response.
    pub fn is_paginated(self) -> bool {
        !matches!(self, MatchType::Inplay)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upcoming" => Ok(MatchType::Upcoming),
            "inplay" => Ok(MatchType::Inplay),
            "ended" => Ok(MatchType::Ended),
            other => Err(AppError::invalid_data(format!(
                "Invalid match type '{}'. Must be one of: upcoming, inplay, ended",
                other
            ))),
        }
    }
}
