//! Region and category filtering of the working set.
//!
//! One pass narrows the records to the selected region and category and
//! collects the distinct names one level below the selection for the
//! picker. Provinces and cities fall back to the static catalog when no
//! record names any; districts only ever come from records and are memoised
//! per city.

use std::collections::BTreeSet;

use super::catalog;
use super::{ChildOptions, RegionLevel, RegionSelector};
use crate::model::LocationRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub filtered: Vec<LocationRecord>,
    pub child_options: ChildOptions,
}

impl FilterOutcome {
    #[must_use]
    pub fn status_text(&self, noun: &str) -> String {
        match self.filtered.len() {
            0 => "no matches".to_string(),
            n => format!("{n} {noun} found"),
        }
    }
}

#[derive(Debug, Clone)]
struct DistrictMemo {
    province: String,
    city: String,
    districts: BTreeSet<String>,
}

/// Narrows the working set to a region and category and derives the picker
/// options for the next level down in the same pass.
#[derive(Debug, Clone, Default)]
pub struct RegionFilterEngine {
    district_memo: Option<DistrictMemo>,
}

impl RegionFilterEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        working_set: &[LocationRecord],
        selector: &RegionSelector,
        category: Option<&str>,
    ) -> FilterOutcome {
        let mut filtered = Vec::new();
        let mut children = BTreeSet::new();

        for record in working_set {
            if !record.matches_category(category) {
                continue;
            }
            if selector.province().is_some_and(|p| p != record.province) {
                continue;
            }

            // Children come from records matching one level above the
            // deepest selection, so siblings stay visible after picking one.
            let child = match (selector.province(), selector.city()) {
                (None, _) => &record.province,
                (Some(_), None) => &record.city,
                (Some(_), Some(city)) if city == record.city => &record.district,
                (Some(_), Some(_)) => continue,
            };
            if !child.is_empty() {
                children.insert(child.clone());
            }

            if selector.district().is_some_and(|d| d != record.district) {
                continue;
            }
            filtered.push(record.clone());
        }

        let child_options = match (selector.province(), selector.city()) {
            (None, _) => {
                self.district_memo = None;
                ChildOptions {
                    level: RegionLevel::Province,
                    options: non_empty_or(children, catalog::province_names),
                }
            }
            (Some(province), None) => {
                self.district_memo = None;
                ChildOptions {
                    level: RegionLevel::City,
                    options: non_empty_or(children, || catalog::reference_cities(province)),
                }
            }
            (Some(province), Some(city)) => ChildOptions {
                level: RegionLevel::District,
                options: self.districts(province, city, selector.district().is_some(), children),
            },
        };

        FilterOutcome {
            filtered,
            child_options,
        }
    }

    /// District options survive choosing a district; they reset only when
    /// the city changes.
    fn districts(
        &mut self,
        province: &str,
        city: &str,
        district_chosen: bool,
        derived: BTreeSet<String>,
    ) -> Vec<String> {
        let memo = self
            .district_memo
            .take()
            .filter(|m| m.province == province && m.city == city);

        let districts = match memo {
            Some(mut memo) if district_chosen => {
                memo.districts.extend(derived);
                memo.districts
            }
            Some(memo) if derived.is_empty() => memo.districts,
            _ => derived,
        };

        let options = districts.iter().cloned().collect();
        if !districts.is_empty() {
            self.district_memo = Some(DistrictMemo {
                province: province.to_string(),
                city: city.to_string(),
                districts,
            });
        }
        options
    }
}

fn non_empty_or(derived: BTreeSet<String>, fallback: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if derived.is_empty() {
        fallback()
    } else {
        derived.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LatLng;
    use proptest::prelude::*;

    fn record(id: &str, province: &str, city: &str, district: &str, category: &str) -> LocationRecord {
        LocationRecord::new(id, Some(LatLng::new(37.5, 127.0)))
            .in_region(province, city, district)
            .with_categories(Some(category.to_string()), None, None)
    }

    fn working_set() -> Vec<LocationRecord> {
        vec![
            record("1", "서울특별시", "강남구", "역삼동", "카페"),
            record("2", "서울특별시", "강남구", "삼성동", "식당"),
            record("3", "서울특별시", "마포구", "서교동", "카페"),
            record("4", "부산광역시", "해운대구", "우동", "카페"),
            record("5", "서울특별시", "강남구", "", "카페"),
        ]
    }

    fn ids(outcome: &FilterOutcome) -> Vec<&str> {
        outcome.filtered.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_province_filter_and_city_options() {
        let mut engine = RegionFilterEngine::new();
        let outcome = engine.apply(&working_set(), &RegionSelector::for_province("서울특별시"), None);
        assert_eq!(ids(&outcome), vec!["1", "2", "3", "5"]);
        assert_eq!(outcome.child_options.level, RegionLevel::City);
        assert_eq!(outcome.child_options.options, vec!["강남구", "마포구"]);
        assert_eq!(outcome.status_text("places"), "4 places found");
    }

    #[test]
    fn test_no_partial_string_match() {
        let mut engine = RegionFilterEngine::new();
        let outcome = engine.apply(&working_set(), &RegionSelector::for_province("서울"), None);
        assert!(outcome.filtered.is_empty());
        assert_eq!(outcome.status_text("places"), "no matches");
    }

    #[test]
    fn test_empty_province_falls_back_to_reference_cities() {
        let mut engine = RegionFilterEngine::new();
        let outcome = engine.apply(&working_set(), &RegionSelector::for_province("광주광역시"), None);
        assert!(outcome.filtered.is_empty());
        assert_eq!(outcome.child_options.options, catalog::reference_cities("광주광역시"));
    }

    #[test]
    fn test_nationwide_lists_provinces() {
        let mut engine = RegionFilterEngine::new();
        let outcome = engine.apply(&working_set(), &RegionSelector::nationwide(), None);
        assert_eq!(outcome.filtered.len(), 5);
        assert_eq!(outcome.child_options.level, RegionLevel::Province);
        assert_eq!(outcome.child_options.options, vec!["부산광역시", "서울특별시"]);

        let none = engine.apply(&[], &RegionSelector::nationwide(), None);
        assert_eq!(none.child_options.options, catalog::province_names());
    }

    #[test]
    fn test_category_applies_with_region() {
        let mut engine = RegionFilterEngine::new();
        let selector = RegionSelector::for_city("서울특별시", "강남구").unwrap();
        let outcome = engine.apply(&working_set(), &selector, Some("카페"));
        assert_eq!(ids(&outcome), vec!["1", "5"]);
        assert_eq!(outcome.child_options.options, vec!["역삼동"]);
    }

    #[test]
    fn test_district_options_survive_district_choice() {
        let mut engine = RegionFilterEngine::new();
        let city = RegionSelector::for_city("서울특별시", "강남구").unwrap();
        let outcome = engine.apply(&working_set(), &city, None);
        assert_eq!(outcome.child_options.options, vec!["삼성동", "역삼동"]);

        // Server-side narrowing leaves only the chosen district's records.
        let narrowed: Vec<LocationRecord> = working_set().into_iter().filter(|r| r.district == "역삼동").collect();
        let district = RegionSelector::for_district("서울특별시", "강남구", "역삼동").unwrap();
        let outcome = engine.apply(&narrowed, &district, None);
        assert_eq!(ids(&outcome), vec!["1"]);
        assert_eq!(outcome.child_options.options, vec!["삼성동", "역삼동"]);
    }

    #[test]
    fn test_district_options_reset_on_city_change() {
        let mut engine = RegionFilterEngine::new();
        let gangnam = RegionSelector::for_city("서울특별시", "강남구").unwrap();
        engine.apply(&working_set(), &gangnam, None);

        let mapo = RegionSelector::for_district("서울특별시", "마포구", "서교동").unwrap();
        let outcome = engine.apply(&working_set(), &mapo, None);
        assert_eq!(outcome.child_options.options, vec!["서교동"]);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let set = working_set();
        let before = set.clone();
        RegionFilterEngine::new().apply(&set, &RegionSelector::for_province("서울특별시"), Some("카페"));
        assert_eq!(set, before);
    }

    fn arb_record() -> impl Strategy<Value = LocationRecord> {
        let province = prop::sample::select(vec!["서울특별시", "부산광역시", "경기도"]);
        let city = prop::sample::select(vec!["중구", "동구", "수원시"]);
        let district = prop::sample::select(vec!["", "가동", "나동"]);
        let category = prop::sample::select(vec!["카페", "식당", "공원"]);
        (any::<u16>(), province, city, district, category)
            .prop_map(|(id, p, c, d, cat)| record(&id.to_string(), p, c, d, cat))
    }

    proptest! {
        #[test]
        fn filtered_records_match_every_selected_level(
            set in proptest::collection::vec(arb_record(), 0..80),
            category in prop::option::of(prop::sample::select(vec!["카페", "식당"])),
        ) {
            let selector = RegionSelector::for_city("서울특별시", "중구").unwrap();
            let outcome = RegionFilterEngine::new().apply(&set, &selector, category);

            prop_assert!(outcome.filtered.len() <= set.len());
            for r in &outcome.filtered {
                prop_assert_eq!(r.province.as_str(), "서울특별시");
                prop_assert_eq!(r.city.as_str(), "중구");
                prop_assert!(r.matches_category(category));
            }
            prop_assert!(outcome.child_options.options.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
