//! Container naming convention.
//!
//! Every managed container is named `<service>_<number>`. This is the only
//! link between a container and its service: nothing is recorded anywhere
//! else, so membership is recomputed from names on every listing.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

/// `<anything>_<digits>`, greedy on the service part.
static CONTAINER_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn container_name_regex() -> &'static Regex {
    CONTAINER_NAME_REGEX
        .get_or_init(|| Regex::new(r"^(.+)_(\d+)$").expect("static regex pattern is valid"))
}

/// Build the container name for instance `number` of `service_name`.
pub fn container_name(service_name: &str, number: u32) -> String {
    format!("{}_{}", service_name, number)
}

/// Split a container name into its service name and instance number.
///
/// The service part is matched greedily, so `"web_2_3"` belongs to service
/// `"web_2"` as instance 3. Service names that themselves end in
/// `_<digits>` are therefore ambiguous.
///
/// # Examples
///
/// ```
/// use dockscale::service::parse_container_name;
///
/// assert_eq!(parse_container_name("web_1").unwrap(), ("web".to_string(), 1));
/// assert!(parse_container_name("web").is_err());
/// ```
pub fn parse_container_name(name: &str) -> Result<(String, u32)> {
    let captures = container_name_regex()
        .captures(name)
        .ok_or_else(|| Error::Parse(name.to_string()))?;

    let number = captures[2]
        .parse::<u32>()
        .map_err(|_| Error::Parse(name.to_string()))?;

    Ok((captures[1].to_string(), number))
}

/// Remove the runtime's leading `/` from a raw container name.
///
/// Names that do not carry the prefix are returned unchanged.
pub fn strip_name_prefix(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_service_and_number() {
        assert_eq!(container_name("web", 1), "web_1");
        assert_eq!(container_name("db_main", 12), "db_main_12");
    }

    #[test]
    fn decodes_simple_names() {
        assert_eq!(
            parse_container_name("web_1").unwrap(),
            ("web".to_string(), 1)
        );
        assert_eq!(
            parse_container_name("db_main_12").unwrap(),
            ("db_main".to_string(), 12)
        );
    }

    #[test]
    fn service_part_is_greedy() {
        assert_eq!(
            parse_container_name("web_2_3").unwrap(),
            ("web_2".to_string(), 3)
        );
    }

    #[test]
    fn names_without_numeric_suffix_fail() {
        for name in ["web", "web_", "_1", "web_x", "web_1a", "elegant_turing"] {
            let err = parse_container_name(name).unwrap_err();
            assert!(matches!(err, Error::Parse(n) if n == name), "{name:?}");
        }
    }

    #[test]
    fn number_overflow_is_a_parse_error() {
        assert!(matches!(
            parse_container_name("web_99999999999"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn strips_leading_separator_once() {
        assert_eq!(strip_name_prefix("/web_1"), "web_1");
        assert_eq!(strip_name_prefix("web_1"), "web_1");
        assert_eq!(strip_name_prefix("//web_1"), "/web_1");
    }
}
