use serde::{Deserialize, Serialize};

/// Parameters accepted by the fetch endpoint, from the query string on GET
/// or the JSON body on POST. `url` stays optional at the type level so a
/// missing value maps to the service's own 400 instead of an extractor
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct FetchParams {
    pub url: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub html: String,
    #[serde(rename = "captchaDetected")]
    pub captcha_detected: bool,
    /// Wall-clock seconds from request arrival, admission wait included.
    pub time: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
