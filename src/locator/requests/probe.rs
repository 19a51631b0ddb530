use crate::locator::requests::Request;
use reqwest::Method;
use std::borrow::Cow;

/// Bodiless request whose round trip stands in for the ping.
pub(crate) struct ProbeRequest;

impl Request for ProbeRequest {
    type Response = ();

    const METHOD: Method = Method::HEAD;

    fn url(&self) -> Cow<str> {
        "https://www.google.com".into()
    }
}
