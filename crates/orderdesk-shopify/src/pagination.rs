//! Shopify cursor-based pagination via the `Link` response header, plus the
//! call-limit header reported alongside each page.
//!
//! ## Header format
//!
//! Single next link:
//! ```text
//! <https://shop.myshopify.com/admin/api/2023-07/orders.json?limit=50&page_info=CURSOR>; rel="next"
//! ```
//!
//! Combined previous and next:
//! ```text
//! <https://.../orders.json?limit=50&page_info=PREV>; rel="previous",
//! <https://.../orders.json?limit=50&page_info=NEXT>; rel="next"
//! ```
//!
//! The next link is followed verbatim. Shopify rejects filter parameters
//! alongside `page_info`, and the link it hands back already carries the
//! right query string.

/// Parses a `Link` header value and returns the full URL of the next page.
///
/// Returns `None` if:
/// - `link_header` is `None` (no header was present),
/// - there is no `rel="next"` segment (last page reached),
/// - the next segment has no `<...>` URL.
#[must_use]
pub fn extract_next_url(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    for segment in header.split(',') {
        let segment = segment.trim();

        if !segment.contains(r#"rel="next""#) {
            continue;
        }

        return extract_angle_bracket_url(segment).map(str::to_owned);
    }

    None
}

/// Extracts the URL between `<` and `>` in a link directive segment.
fn extract_angle_bracket_url(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    if start >= end {
        return None;
    }
    Some(&segment[start..end])
}

/// Parsed `X-Shopify-Shop-Api-Call-Limit` header (`"used/limit"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLimit {
    pub used: u32,
    pub limit: u32,
}

impl CallLimit {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (used, limit) = raw.trim().split_once('/')?;
        Some(Self {
            used: used.trim().parse().ok()?,
            limit: limit.trim().parse().ok()?,
        })
    }

    #[must_use]
    pub fn remaining(self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_when_header_is_none() {
        assert!(extract_next_url(None).is_none());
    }

    #[test]
    fn returns_none_when_header_is_empty() {
        assert!(extract_next_url(Some("")).is_none());
    }

    #[test]
    fn extracts_url_from_single_next_link() {
        let header = r#"<https://moto.myshopify.com/admin/api/2023-07/orders.json?limit=50&page_info=eyJsYXN0X2lkIjo2fQ>; rel="next""#;
        assert_eq!(
            extract_next_url(Some(header)).as_deref(),
            Some("https://moto.myshopify.com/admin/api/2023-07/orders.json?limit=50&page_info=eyJsYXN0X2lkIjo2fQ")
        );
    }

    #[test]
    fn extracts_next_from_combined_prev_next_link() {
        let header = concat!(
            r#"<https://moto.myshopify.com/orders.json?page_info=PREV>; rel="previous", "#,
            r#"<https://moto.myshopify.com/orders.json?page_info=NEXT>; rel="next""#
        );
        assert_eq!(
            extract_next_url(Some(header)).as_deref(),
            Some("https://moto.myshopify.com/orders.json?page_info=NEXT")
        );
    }

    #[test]
    fn returns_none_when_only_previous_link_present() {
        let header = r#"<https://moto.myshopify.com/orders.json?page_info=PREV>; rel="previous""#;
        assert!(extract_next_url(Some(header)).is_none());
    }

    #[test]
    fn handles_extra_whitespace_between_segments() {
        let header = concat!(
            r#"<https://example.com/orders.json?page_info=ABC>; rel="previous",   "#,
            r#"<https://example.com/orders.json?page_info=XYZ>;  rel="next""#
        );
        assert_eq!(
            extract_next_url(Some(header)).as_deref(),
            Some("https://example.com/orders.json?page_info=XYZ")
        );
    }

    #[test]
    fn extract_angle_bracket_url_no_brackets_returns_none() {
        assert!(extract_angle_bracket_url("no brackets here").is_none());
        assert!(extract_angle_bracket_url(r#"><; rel="next""#).is_none());
    }

    #[test]
    fn call_limit_parses_used_and_limit() {
        let limit = CallLimit::parse("32/40").unwrap();
        assert_eq!(limit, CallLimit { used: 32, limit: 40 });
        assert_eq!(limit.remaining(), 8);
    }

    #[test]
    fn call_limit_rejects_garbage() {
        assert!(CallLimit::parse("").is_none());
        assert!(CallLimit::parse("40").is_none());
        assert!(CallLimit::parse("a/b").is_none());
    }

    #[test]
    fn call_limit_remaining_saturates() {
        assert_eq!(CallLimit { used: 45, limit: 40 }.remaining(), 0);
    }
}
