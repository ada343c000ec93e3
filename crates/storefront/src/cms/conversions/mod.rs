//! Conversion from REST and GraphQL response shapes into domain types.
//!
//! Both modules must agree: the same record fetched through either API must
//! produce equal values for the fields both APIs expose.

pub mod graphql;
pub mod rest;

use chrono::NaiveDateTime;
use fernleaf_core::{CurrencyCode, Price};

use super::types::Image;

/// Parse a WordPress site-local timestamp (`2024-03-01T09:30:00`).
///
/// Tolerates a trailing UTC offset or fractional seconds, which some plugins add.
pub(crate) fn parse_wp_datetime(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let base = raw.get(..19).unwrap_or(raw);
    NaiveDateTime::parse_from_str(base, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Parse a price, treating malformed values as absent.
pub(crate) fn parse_price(raw: Option<&str>, currency: CurrencyCode) -> Option<Price> {
    let raw = raw?;
    match Price::parse(raw, currency) {
        Ok(price) => price,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed price");
            None
        }
    }
}

/// A regular price is only kept when it differs from the current price.
pub(crate) fn regular_if_different(regular: Option<Price>, current: Price) -> Option<Price> {
    regular.filter(|r| r.amount != current.amount)
}

/// Empty optional strings become `None`.
pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

pub(crate) fn image(url: Option<String>, alt: Option<String>) -> Option<Image> {
    non_empty(url).map(|url| Image {
        url,
        alt: alt.unwrap_or_default(),
    })
}

/// Decode the HTML entities WordPress emits in rendered titles.
///
/// Handles numeric references and the named entities WordPress texturizes
/// into; anything else is left untouched.
pub(crate) fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        if let Some((c, end)) = decoded {
            out.push(c);
            rest = &tail[end + 1..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Shirts &amp; Tops"), "Shirts & Tops");
        assert_eq!(decode_entities("Don&#8217;t"), "Don’t");
        assert_eq!(decode_entities("&#x41;BC"), "ABC");
        assert_eq!(decode_entities("A & B"), "A & B");
        assert_eq!(decode_entities("&unknown; x"), "&unknown; x");
    }

    #[test]
    fn test_parse_wp_datetime() {
        let expected = NaiveDateTime::parse_from_str("2024-03-01T09:30:00", "%Y-%m-%dT%H:%M:%S")
            .unwrap();
        assert_eq!(parse_wp_datetime(Some("2024-03-01T09:30:00")), Some(expected));
        assert_eq!(
            parse_wp_datetime(Some("2024-03-01T09:30:00+00:00")),
            Some(expected)
        );
        assert_eq!(parse_wp_datetime(Some("")), None);
        assert_eq!(parse_wp_datetime(Some("yesterday")), None);
        assert_eq!(parse_wp_datetime(None), None);
    }

    #[test]
    fn test_regular_if_different() {
        let cur = Price::parse("10", CurrencyCode::USD).unwrap().unwrap();
        let same = Price::parse("10.00", CurrencyCode::USD).unwrap();
        let higher = Price::parse("12", CurrencyCode::USD).unwrap();
        assert_eq!(regular_if_different(same, cur), None);
        assert_eq!(regular_if_different(higher, cur), higher);
    }
}
