//! Presentation helpers shared by page handlers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::models::location::LocationMarker;

/// A bracketed group containing a number, e.g. `[0004]` or `[#12]`.
static NUM_ORDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*?\[[^\d]*(\d+)[^\d]*\].*$").expect("valid regex"));

/// Remove a manual sort prefix such as `[0004]` from a title.
///
/// Only the exact `[<digits>]` text is removed, so `[#12] Cat` is left as is.
pub fn hide_num_order(title: &str) -> String {
    match NUM_ORDER_RE.captures(title).and_then(|c| c.get(1)) {
        Some(number) => title
            .replace(&format!("[{}]", number.as_str()), "")
            .trim()
            .to_string(),
        None => title.to_string(),
    }
}

/// Public URL of a stored file under the media prefix.
pub fn original_url(media_url: &str, file: &str) -> String {
    format!(
        "{}/{}",
        media_url.trim_end_matches('/'),
        file.trim_start_matches('/')
    )
}

/// Markers as a JSON array for the map widget.
pub fn location_markers_json(markers: &[LocationMarker]) -> Result<String> {
    Ok(serde_json::to_string(markers)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_num_order_strips_prefix() {
        assert_eq!(hide_num_order("[0004] Cute cat"), "Cute cat");
    }

    #[test]
    fn test_hide_num_order_in_middle() {
        assert_eq!(hide_num_order("Sunset [12] on the lake"), "Sunset  on the lake");
    }

    #[test]
    fn test_hide_num_order_without_brackets() {
        assert_eq!(hide_num_order("Cute cat 0004"), "Cute cat 0004");
        assert_eq!(hide_num_order("[draft] Cat"), "[draft] Cat");
    }

    #[test]
    fn test_hide_num_order_decorated_number_untouched() {
        // Matches the pattern, but "[7]" is not literally present.
        assert_eq!(hide_num_order("[#7] Cat"), "[#7] Cat");
    }

    #[test]
    fn test_hide_num_order_removes_every_occurrence() {
        assert_eq!(hide_num_order("[3] Cat [3]"), "Cat");
    }

    #[test]
    fn test_original_url_joins_once() {
        assert_eq!(
            original_url("/media/", "original_images/cat.jpg"),
            "/media/original_images/cat.jpg"
        );
        assert_eq!(
            original_url("https://cdn.example.com/media", "/original_images/cat.jpg"),
            "https://cdn.example.com/media/original_images/cat.jpg"
        );
    }

    #[test]
    fn test_location_markers_json() {
        let markers = vec![LocationMarker {
            id: 7,
            location: "Main office".into(),
            latitude: 10.5,
            longitude: -66.9,
            tel: "+1234567890".into(),
            description: "1 Main St".into(),
            link: None,
        }];
        let json: serde_json::Value =
            serde_json::from_str(&location_markers_json(&markers).unwrap()).unwrap();
        assert_eq!(json[0]["location"], "Main office");
        assert_eq!(json[0]["latitude"], 10.5);
        assert!(json[0]["link"].is_null());
        assert!(json[0].get("id").is_none());
    }

    #[test]
    fn test_location_markers_json_empty() {
        assert_eq!(location_markers_json(&[]).unwrap(), "[]");
    }
}
