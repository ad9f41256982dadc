use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::app::{Result, StayscanError};
use crate::domain::region::{Coordinate, GeoRegion};

pub const DEFAULT_COUNTRY: &str = "대한민국";

/// Request object accepted by `stayscan collect --request`.
///
/// Corner values may be JSON numbers or numeric strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectRequest {
    #[serde(default = "default_country")]
    pub country: String,
    pub sido: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub ne_lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub ne_lng: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub sw_lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub sw_lng: f64,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid coordinate {:?}: {}", s, e))),
    }
}

impl CollectRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StayscanError::InvalidRequest(e.to_string()))
    }

    pub fn region(&self) -> Result<GeoRegion> {
        GeoRegion::new(
            Coordinate::new(self.ne_lat, self.ne_lng),
            Coordinate::new(self.sw_lat, self.sw_lng),
        )
    }
}

/// A search over one region for one night, `checkin_offset_days` from today.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub region: GeoRegion,
    pub sido: String,
    pub country: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
}

impl ListingQuery {
    pub fn new(request: &CollectRequest, checkin_offset_days: u64) -> Result<Self> {
        Self::with_base_date(request, Local::now().date_naive(), checkin_offset_days)
    }

    pub fn with_base_date(
        request: &CollectRequest,
        today: NaiveDate,
        checkin_offset_days: u64,
    ) -> Result<Self> {
        let checkin = today
            .checked_add_days(Days::new(checkin_offset_days))
            .ok_or_else(|| StayscanError::InvalidRequest("check-in date overflow".into()))?;
        let checkout = checkin
            .checked_add_days(Days::new(1))
            .ok_or_else(|| StayscanError::InvalidRequest("check-out date overflow".into()))?;

        Ok(Self {
            region: request.region()?,
            sido: request.sido.clone(),
            country: request.country.clone(),
            checkin,
            checkout,
        })
    }

    /// Same search, different area.
    pub fn with_region(&self, region: GeoRegion) -> Self {
        Self {
            region,
            ..self.clone()
        }
    }
}

/// Builds search and detail page URLs for the listing source.
#[derive(Debug, Clone)]
pub struct SearchUrlBuilder {
    base_url: Url,
    zoom: u32,
}

impl SearchUrlBuilder {
    pub fn new(base_url: &str, zoom: u32) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            zoom,
        })
    }

    pub fn search_url(&self, query: &ListingQuery) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StayscanError::Config(format!("base URL cannot be a base: {}", self.base_url)))?
            .clear()
            .push("s")
            .push(&format!("{}-{}", query.country, query.sido))
            .push("homes");

        let ne = query.region.ne();
        let sw = query.region.sw();
        let zoom = self.zoom.to_string();
        url.query_pairs_mut()
            .append_pair("tab_id", "home_tab")
            .append_pair("refinement_paths[]", "/homes")
            .append_pair("price_filter_input_type", "0")
            .append_pair("channel", "EXPLORE")
            .append_pair("date_picker_type", "calendar")
            .append_pair("checkin", &query.checkin.format("%Y-%m-%d").to_string())
            .append_pair("checkout", &query.checkout.format("%Y-%m-%d").to_string())
            .append_pair("flexible_date_search_filter_type", "6")
            .append_pair("source", "structured_search_input_header")
            .append_pair("search_type", "user_map_move")
            .append_pair("query", &query.sido)
            .append_pair("price_filter_num_nights", "1")
            .append_pair("zoom_level", &zoom)
            .append_pair("ne_lat", &ne.lat.to_string())
            .append_pair("ne_lng", &ne.lng.to_string())
            .append_pair("sw_lat", &sw.lat.to_string())
            .append_pair("sw_lng", &sw.lng.to_string())
            .append_pair("zoom", &zoom)
            .append_pair("search_by_map", "true");

        Ok(url)
    }

    pub fn detail_url(&self, listing_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StayscanError::Config(format!("base URL cannot be a base: {}", self.base_url)))?
            .clear()
            .push("rooms")
            .push(listing_id);
        url.query_pairs_mut().append_pair("translate_ugc", "false");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CollectRequest {
        CollectRequest::from_json(
            r#"{"country": "대한민국", "sido": "대전광역시", "ne_lat": 36.492,
                "ne_lng": 127.56, "sw_lat": 36.197, "sw_lng": 127.259}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_request_accepts_string_coordinates() {
        let req = CollectRequest::from_json(
            r#"{"country": "대한민국", "sido": "대전광역시", "ne_lat": "36.492",
                "ne_lng": " 127.56", "sw_lat": "36.197", "sw_lng": "127.259"}"#,
        )
        .unwrap();
        assert_eq!(req.ne_lat, 36.492);
        assert_eq!(req.ne_lng, 127.56);
    }

    #[test]
    fn test_request_defaults_country() {
        let req = CollectRequest::from_json(
            r#"{"sido": "서울", "ne_lat": 1, "ne_lng": 1, "sw_lat": 0, "sw_lng": 0}"#,
        )
        .unwrap();
        assert_eq!(req.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn test_request_rejects_garbage() {
        let err = CollectRequest::from_json(r#"{"sido": "서울", "ne_lat": "north"}"#);
        assert!(matches!(err, Err(StayscanError::InvalidRequest(_))));
    }

    #[test]
    fn test_query_dates_follow_offset() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 18).unwrap();
        let query = ListingQuery::with_base_date(&request(), today, 1).unwrap();
        assert_eq!(query.checkin, NaiveDate::from_ymd_opt(2024, 11, 19).unwrap());
        assert_eq!(query.checkout, NaiveDate::from_ymd_opt(2024, 11, 20).unwrap());
    }

    #[test]
    fn test_with_region_keeps_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 18).unwrap();
        let query = ListingQuery::with_base_date(&request(), today, 7).unwrap();
        let quadrant = query.region.quadrants()[2];
        let sub = query.with_region(quadrant);
        assert_eq!(sub.region, quadrant);
        assert_eq!(sub.checkin, query.checkin);
        assert_eq!(sub.sido, query.sido);
    }

    #[test]
    fn test_search_url_shape() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 18).unwrap();
        let query = ListingQuery::with_base_date(&request(), today, 1).unwrap();
        let builder = SearchUrlBuilder::new("https://www.airbnb.co.kr", 12).unwrap();
        let url = builder.search_url(&query).unwrap();

        assert!(url.path().starts_with("/s/"));
        assert!(url.path().ends_with("/homes"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("checkin"), Some("2024-11-19"));
        assert_eq!(get("checkout"), Some("2024-11-20"));
        assert_eq!(get("ne_lat"), Some("36.492"));
        assert_eq!(get("sw_lng"), Some("127.259"));
        assert_eq!(get("query"), Some("대전광역시"));
        assert_eq!(get("zoom_level"), Some("12"));
        assert_eq!(get("search_by_map"), Some("true"));
    }

    #[test]
    fn test_detail_url() {
        let builder = SearchUrlBuilder::new("https://www.airbnb.co.kr", 12).unwrap();
        let url = builder.detail_url("1006263284659826158").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.airbnb.co.kr/rooms/1006263284659826158?translate_ugc=false"
        );
    }
}
