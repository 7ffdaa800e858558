//! The fixed trip plan. Read-only reference data; its length bounds the
//! day index.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::DayIndex;
use crate::error::{Result, TripbookError};

pub const ITINERARY_FILE: &str = "itinerary.yaml";

const BUILT_IN: &str = include_str!("itinerary.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub title: String,
    #[serde(default)]
    pub dates: Option<String>,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// 1-based day number as printed on the plan.
    pub day: u32,
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub stay: Option<String>,
    #[serde(default)]
    pub meals: Meals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meals {
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
}

impl Itinerary {
    pub fn built_in() -> Result<Self> {
        Self::parse(BUILT_IN)
    }

    /// Use `itinerary.yaml` from `dir` if present, otherwise the built-in plan.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(ITINERARY_FILE);
        if path.exists() {
            Self::parse(&fs::read_to_string(path)?)
        } else {
            Self::built_in()
        }
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let itinerary: Self = serde_yaml::from_str(yaml)?;
        if itinerary.days.is_empty() {
            return Err(TripbookError::Config(
                "itinerary must have at least one day".to_string(),
            ));
        }
        Ok(itinerary)
    }

    pub fn day_count(&self) -> u32 {
        self.days.len() as u32
    }

    pub fn day(&self, index: DayIndex) -> Option<&DayPlan> {
        self.days.get(index as usize)
    }
}
