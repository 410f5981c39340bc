pub mod catalog;
pub mod filter;
pub mod resolver;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind};

pub use self::filter::{FilterOutcome, RegionFilterEngine};
pub use self::resolver::{
    Completion, GeocodeRequest, RegionResolver, Resolution, ResolutionSource, ResolvedView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLevel {
    Province,
    City,
    District,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("a city can only be chosen inside a province")]
    CityWithoutProvince,
    #[error("a district can only be chosen inside a city")]
    DistrictWithoutCity,
}

impl From<SelectorError> for AppError {
    fn from(e: SelectorError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

/// Province → city → district selection. Each level requires the one above
/// it, so a selector is always a prefix of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSelector")]
pub struct RegionSelector {
    province: Option<String>,
    city: Option<String>,
    district: Option<String>,
}

#[derive(Deserialize)]
struct RawSelector {
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    district: Option<String>,
}

impl TryFrom<RawSelector> for RegionSelector {
    type Error = SelectorError;

    fn try_from(raw: RawSelector) -> Result<Self, Self::Error> {
        Self::new(raw.province, raw.city, raw.district)
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RegionSelector {
    pub fn new(
        province: Option<String>,
        city: Option<String>,
        district: Option<String>,
    ) -> Result<Self, SelectorError> {
        let province = normalize(province);
        let city = normalize(city);
        let district = normalize(district);

        if city.is_some() && province.is_none() {
            return Err(SelectorError::CityWithoutProvince);
        }
        if district.is_some() && city.is_none() {
            return Err(SelectorError::DistrictWithoutCity);
        }

        Ok(Self {
            province,
            city,
            district,
        })
    }

    #[must_use]
    pub fn nationwide() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_province(province: impl Into<String>) -> Self {
        Self {
            province: normalize(Some(province.into())),
            city: None,
            district: None,
        }
    }

    pub fn for_city(
        province: impl Into<String>,
        city: impl Into<String>,
    ) -> Result<Self, SelectorError> {
        Self::new(Some(province.into()), Some(city.into()), None)
    }

    pub fn for_district(
        province: impl Into<String>,
        city: impl Into<String>,
        district: impl Into<String>,
    ) -> Result<Self, SelectorError> {
        Self::new(Some(province.into()), Some(city.into()), Some(district.into()))
    }

    #[must_use]
    pub fn province(&self) -> Option<&str> {
        self.province.as_deref()
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    #[must_use]
    pub fn district(&self) -> Option<&str> {
        self.district.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.province.is_none()
    }

    /// Deepest level that is set.
    #[must_use]
    pub fn level(&self) -> Option<RegionLevel> {
        if self.district.is_some() {
            Some(RegionLevel::District)
        } else if self.city.is_some() {
            Some(RegionLevel::City)
        } else if self.province.is_some() {
            Some(RegionLevel::Province)
        } else {
            None
        }
    }

    /// `"province[ city[ district]]"`, the form the geocoder expects.
    #[must_use]
    pub fn composite_address(&self) -> Option<String> {
        let parts: Vec<&str> = [self.province(), self.city(), self.district()]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Options for the next level down, offered to the region picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOptions {
    pub level: RegionLevel,
    pub options: Vec<String>,
}

impl ChildOptions {
    #[must_use]
    pub fn empty(level: RegionLevel) -> Self {
        Self {
            level,
            options: Vec::new(),
        }
    }
}
