use crate::locator::requests::Request;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// The subset of the IP geolocation answer used for the server label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct GeoLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
}

impl GeoLocation {
    /// `"City, RC"`, or `None` when either part is missing or blank.
    pub(crate) fn label(&self) -> Option<String> {
        let city = self.city.as_deref().map(str::trim).unwrap_or_default();
        let region = self.region_code.as_deref().map(str::trim).unwrap_or_default();

        if city.is_empty() || region.is_empty() {
            return None;
        }

        Some(format!("{}, {}", city, region))
    }
}

pub(crate) struct GeoRequest;

impl Request for GeoRequest {
    type Response = GeoLocation;

    fn url(&self) -> Cow<str> {
        "https://ipapi.co/json/".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_response() {
        let location: GeoLocation = serde_json::from_str(
            r#"{"ip":"203.0.113.9","city":"Mumbai","region":"Maharashtra","region_code":"MH","country":"IN"}"#,
        )
        .unwrap();

        assert_eq!(location.label().as_deref(), Some("Mumbai, MH"));
    }

    #[test]
    fn test_missing_fields_have_no_label() {
        let location: GeoLocation =
            serde_json::from_str(r#"{"city":"Mumbai"}"#).unwrap();
        assert_eq!(location.label(), None);

        let location: GeoLocation =
            serde_json::from_str(r#"{"city":" ","region_code":"MH"}"#).unwrap();
        assert_eq!(location.label(), None);

        let location: GeoLocation =
            serde_json::from_str(r#"{"error":true,"reason":"RateLimited"}"#).unwrap();
        assert_eq!(location.label(), None);
    }
}
