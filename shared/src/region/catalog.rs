//! Static reference data: province centroids, zoom levels and city lists.

use crate::LatLng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvinceEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub centroid: LatLng,
    /// Metropolitan cities are small and get a finer level than the
    /// sprawling provinces.
    pub zoom_level: u8,
    pub cities: &'static [&'static str],
}

impl ProvinceEntry {
    fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

const SEOUL_CITIES: &[&str] = &[
    "강남구", "강동구", "강북구", "강서구", "관악구", "광진구", "구로구", "금천구",
    "노원구", "도봉구", "동대문구", "동작구", "마포구", "서대문구", "서초구", "성동구",
    "성북구", "송파구", "양천구", "영등포구", "용산구", "은평구", "종로구", "중구",
    "중랑구",
];

const BUSAN_CITIES: &[&str] = &[
    "강서구", "금정구", "기장군", "남구", "동구", "동래구", "부산진구", "북구",
    "사상구", "사하구", "서구", "수영구", "연제구", "영도구", "중구", "해운대구",
];

const DAEGU_CITIES: &[&str] = &[
    "군위군", "남구", "달서구", "달성군", "동구", "북구", "서구", "수성구", "중구",
];

const INCHEON_CITIES: &[&str] = &[
    "강화군", "계양구", "남동구", "동구", "미추홀구", "부평구", "서구", "연수구",
    "옹진군", "중구",
];

const GWANGJU_CITIES: &[&str] = &["광산구", "남구", "동구", "북구", "서구"];

const DAEJEON_CITIES: &[&str] = &["대덕구", "동구", "서구", "유성구", "중구"];

const ULSAN_CITIES: &[&str] = &["남구", "동구", "북구", "울주군", "중구"];

const SEJONG_CITIES: &[&str] = &["세종시"];

const GYEONGGI_CITIES: &[&str] = &[
    "가평군", "고양시", "과천시", "광명시", "광주시", "구리시", "군포시", "김포시",
    "남양주시", "동두천시", "부천시", "성남시", "수원시", "시흥시", "안산시", "안성시",
    "안양시", "양주시", "양평군", "여주시", "연천군", "오산시", "용인시", "의왕시",
    "의정부시", "이천시", "파주시", "평택시", "포천시", "하남시", "화성시",
];

const GANGWON_CITIES: &[&str] = &[
    "강릉시", "고성군", "동해시", "삼척시", "속초시", "양구군", "양양군", "영월군",
    "원주시", "인제군", "정선군", "철원군", "춘천시", "태백시", "평창군", "홍천군",
    "화천군", "횡성군",
];

const CHUNGBUK_CITIES: &[&str] = &[
    "괴산군", "단양군", "보은군", "영동군", "옥천군", "음성군", "제천시", "증평군",
    "진천군", "청주시", "충주시",
];

const CHUNGNAM_CITIES: &[&str] = &[
    "계룡시", "공주시", "금산군", "논산시", "당진시", "보령시", "부여군", "서산시",
    "서천군", "아산시", "예산군", "천안시", "청양군", "태안군", "홍성군",
];

const JEONBUK_CITIES: &[&str] = &[
    "고창군", "군산시", "김제시", "남원시", "무주군", "부안군", "순창군", "완주군",
    "익산시", "임실군", "장수군", "전주시", "정읍시", "진안군",
];

const JEONNAM_CITIES: &[&str] = &[
    "강진군", "고흥군", "곡성군", "광양시", "구례군", "나주시", "담양군", "목포시",
    "무안군", "보성군", "순천시", "신안군", "여수시", "영광군", "영암군", "완도군",
    "장성군", "장흥군", "진도군", "함평군", "해남군", "화순군",
];

const GYEONGBUK_CITIES: &[&str] = &[
    "경산시", "경주시", "고령군", "구미시", "김천시", "문경시", "봉화군", "상주시",
    "성주군", "안동시", "영덕군", "영양군", "영주시", "영천시", "예천군", "울릉군",
    "울진군", "의성군", "청도군", "청송군", "칠곡군", "포항시",
];

const GYEONGNAM_CITIES: &[&str] = &[
    "거제시", "거창군", "고성군", "김해시", "남해군", "밀양시", "사천시", "산청군",
    "양산시", "의령군", "진주시", "창녕군", "창원시", "통영시", "하동군", "함안군",
    "함양군", "합천군",
];

const JEJU_CITIES: &[&str] = &["서귀포시", "제주시"];

pub const PROVINCES: &[ProvinceEntry] = &[
    ProvinceEntry {
        name: "서울특별시",
        aliases: &["서울", "서울시"],
        centroid: LatLng::new(37.5665, 126.9780),
        zoom_level: 9,
        cities: SEOUL_CITIES,
    },
    ProvinceEntry {
        name: "부산광역시",
        aliases: &["부산", "부산시"],
        centroid: LatLng::new(35.1796, 129.0756),
        zoom_level: 9,
        cities: BUSAN_CITIES,
    },
    ProvinceEntry {
        name: "대구광역시",
        aliases: &["대구", "대구시"],
        centroid: LatLng::new(35.8714, 128.6014),
        zoom_level: 9,
        cities: DAEGU_CITIES,
    },
    ProvinceEntry {
        name: "인천광역시",
        aliases: &["인천", "인천시"],
        centroid: LatLng::new(37.4563, 126.7052),
        zoom_level: 9,
        cities: INCHEON_CITIES,
    },
    ProvinceEntry {
        name: "광주광역시",
        aliases: &["광주"],
        centroid: LatLng::new(35.1595, 126.8526),
        zoom_level: 9,
        cities: GWANGJU_CITIES,
    },
    ProvinceEntry {
        name: "대전광역시",
        aliases: &["대전", "대전시"],
        centroid: LatLng::new(36.3504, 127.3845),
        zoom_level: 9,
        cities: DAEJEON_CITIES,
    },
    ProvinceEntry {
        name: "울산광역시",
        aliases: &["울산", "울산시"],
        centroid: LatLng::new(35.5384, 129.3114),
        zoom_level: 9,
        cities: ULSAN_CITIES,
    },
    ProvinceEntry {
        name: "세종특별자치시",
        aliases: &["세종", "세종시"],
        centroid: LatLng::new(36.4800, 127.2890),
        zoom_level: 9,
        cities: SEJONG_CITIES,
    },
    ProvinceEntry {
        name: "경기도",
        aliases: &["경기"],
        centroid: LatLng::new(37.4138, 127.5183),
        zoom_level: 11,
        cities: GYEONGGI_CITIES,
    },
    ProvinceEntry {
        name: "강원특별자치도",
        aliases: &["강원도", "강원"],
        centroid: LatLng::new(37.8228, 128.1555),
        zoom_level: 12,
        cities: GANGWON_CITIES,
    },
    ProvinceEntry {
        name: "충청북도",
        aliases: &["충북"],
        centroid: LatLng::new(36.8000, 127.7000),
        zoom_level: 11,
        cities: CHUNGBUK_CITIES,
    },
    ProvinceEntry {
        name: "충청남도",
        aliases: &["충남"],
        centroid: LatLng::new(36.5184, 126.8000),
        zoom_level: 11,
        cities: CHUNGNAM_CITIES,
    },
    ProvinceEntry {
        name: "전북특별자치도",
        aliases: &["전라북도", "전북"],
        centroid: LatLng::new(35.7175, 127.1530),
        zoom_level: 11,
        cities: JEONBUK_CITIES,
    },
    ProvinceEntry {
        name: "전라남도",
        aliases: &["전남"],
        centroid: LatLng::new(34.8679, 126.9910),
        zoom_level: 12,
        cities: JEONNAM_CITIES,
    },
    ProvinceEntry {
        name: "경상북도",
        aliases: &["경북"],
        centroid: LatLng::new(36.4919, 128.8889),
        zoom_level: 12,
        cities: GYEONGBUK_CITIES,
    },
    ProvinceEntry {
        name: "경상남도",
        aliases: &["경남"],
        centroid: LatLng::new(35.4606, 128.2132),
        zoom_level: 11,
        cities: GYEONGNAM_CITIES,
    },
    ProvinceEntry {
        name: "제주특별자치도",
        aliases: &["제주도", "제주"],
        centroid: LatLng::new(33.4996, 126.5312),
        zoom_level: 10,
        cities: JEJU_CITIES,
    },
];

#[must_use]
pub fn lookup(name: &str) -> Option<&'static ProvinceEntry> {
    let name = name.trim();
    PROVINCES.iter().find(|p| p.matches(name))
}

/// Canonical province names, sorted.
#[must_use]
pub fn province_names() -> Vec<String> {
    let mut names: Vec<String> = PROVINCES.iter().map(|p| p.name.to_string()).collect();
    names.sort();
    names
}

/// Reference city list for a province, sorted; empty for unknown names.
#[must_use]
pub fn reference_cities(province: &str) -> Vec<String> {
    let mut cities: Vec<String> = lookup(province)
        .map(|p| p.cities.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    cities.sort();
    cities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoom::{MAX_LEVEL, MIN_LEVEL};

    #[test]
    fn test_seoul_centroid() {
        let seoul = lookup("서울특별시").unwrap();
        assert_eq!(seoul.centroid, LatLng::new(37.5665, 126.9780));
        assert_eq!(seoul.zoom_level, 9);
    }

    #[test]
    fn test_aliases_resolve_to_canonical_entry() {
        assert_eq!(lookup("전라북도").unwrap().name, "전북특별자치도");
        assert_eq!(lookup(" 강원도 ").unwrap().name, "강원특별자치도");
        assert!(lookup("아틀란티스").is_none());
    }

    #[test]
    fn test_table_is_well_formed() {
        assert_eq!(PROVINCES.len(), 17);
        for entry in PROVINCES {
            assert!(entry.centroid.validate().is_ok(), "{}", entry.name);
            assert!((MIN_LEVEL..=MAX_LEVEL).contains(&entry.zoom_level), "{}", entry.name);
            assert!(!entry.cities.is_empty(), "{}", entry.name);
        }
    }

    #[test]
    fn test_metropolitan_cities_zoom_finer_than_provinces() {
        let busan = lookup("부산광역시").unwrap();
        let gyeonggi = lookup("경기도").unwrap();
        assert!(busan.zoom_level < gyeonggi.zoom_level);
    }

    #[test]
    fn test_reference_cities_sorted() {
        let cities = reference_cities("광주광역시");
        assert_eq!(cities, vec!["광산구", "남구", "동구", "북구", "서구"]);
        assert!(reference_cities("없는도").is_empty());
    }
}
