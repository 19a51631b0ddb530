pub mod geo;
pub mod probe;

use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Method,
};
use serde::Deserialize;
use std::borrow::Cow;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const REPO: &str = env!("CARGO_PKG_REPOSITORY");

pub trait Request {
    type Response: for<'de> Deserialize<'de>;

    const METHOD: Method = Method::GET;

    /// Absolute URL of the request.
    fn url(&self) -> Cow<str>;

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(agent) =
            HeaderValue::from_str(&format!("{}/{} ({})", NAME, VERSION, REPO))
        {
            headers.insert(USER_AGENT, agent);
        }

        headers
    }
}

impl<R: Request> Request for &R {
    type Response = R::Response;

    const METHOD: Method = R::METHOD;

    fn url(&self) -> Cow<str> {
        (**self).url()
    }

    fn headers(&self) -> HeaderMap {
        (**self).headers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::requests::geo::GeoRequest;

    #[test]
    fn test_default_headers_identify_client() {
        let headers = GeoRequest.headers();
        let agent = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(agent.starts_with("fastdial/"));
        assert!(agent.contains(VERSION));
    }

    #[test]
    fn test_reference_forwards_request() {
        let request = &GeoRequest;
        assert_eq!(request.url(), GeoRequest.url());
        assert_eq!(<&GeoRequest as Request>::METHOD, Method::GET);
    }
}
