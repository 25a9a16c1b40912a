//! Utility functions and helpers.

pub mod http;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use url::Url;

static ISO_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})\.html$").expect("valid regex"));
static US_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2})-(\d{2})-(\d{4})\.html$").expect("valid regex"));

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Publication date encoded at the end of an article file name.
///
/// Accepts `...-YYYY-MM-DD.html` and `...-MM-DD-YYYY.html`.
pub fn article_date_from_name(file_name: &str) -> Option<NaiveDate> {
    let ymd = |y: &str, m: &str, d: &str| {
        NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
    };

    if let Some(caps) = ISO_SUFFIX.captures(file_name) {
        if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
            return Some(date);
        }
    }
    US_SUFFIX
        .captures(file_name)
        .and_then(|caps| ymd(&caps[3], &caps[1], &caps[2]))
}
