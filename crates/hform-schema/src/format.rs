//! `format` registry.
//!
//! A fixed table from format name to predicate. Names outside the table are
//! not checked.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate};
use uuid::Uuid;

type Predicate = fn(&str) -> bool;

const FORMATS: &[(&str, Predicate)] = &[
    ("date-time", is_date_time),
    ("date", is_date),
    ("time", is_time),
    ("email", is_email),
    ("hostname", is_hostname),
    ("ipv4", is_ipv4),
    ("ipv6", is_ipv6),
    ("uuid", is_uuid),
    ("uri", is_uri),
];

/// Check `text` against the named format. `None` when the format is not
/// registered.
#[must_use]
pub fn check(format: &str, text: &str) -> Option<bool> {
    FORMATS
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, predicate)| predicate(text))
}

fn is_date_time(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
}

fn is_date(text: &str) -> bool {
    text.len() == 10 && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// RFC 3339 `full-time`: `HH:MM:SS[.frac](Z|±HH:MM)`.
fn is_time(text: &str) -> bool {
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{text}")).is_ok()
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && !local.chars().any(|c| c.is_whitespace() || c == '@')
        && domain.contains('.')
        && is_hostname(domain)
}

/// RFC 1123 host name.
fn is_hostname(text: &str) -> bool {
    let text = text.strip_suffix('.').unwrap_or(text);
    !text.is_empty()
        && text.len() <= 253
        && text.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn is_ipv4(text: &str) -> bool {
    text.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(text: &str) -> bool {
    text.parse::<Ipv6Addr>().is_ok()
}

/// Hyphenated form only: the simple, braced and URN forms have other lengths.
fn is_uuid(text: &str) -> bool {
    text.len() == 36 && Uuid::try_parse(text).is_ok()
}

/// Absolute URI (a scheme is required).
fn is_uri(text: &str) -> bool {
    url::Url::parse(text).is_ok()
}
