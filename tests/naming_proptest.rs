/// Property-based tests for the `<service>_<number>` naming convention.
use dockscale::service::{container_name, parse_container_name, strip_name_prefix};
use proptest::prelude::*;

/// Valid service names that do not themselves end in `_<digits>`.
fn service_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_]{0,12}[a-zA-Z]")
        .expect("Valid regex")
}

proptest! {
    #[test]
    fn round_trips(name in service_name_strategy(), number in 1u32..) {
        let encoded = container_name(&name, number);
        prop_assert_eq!(parse_container_name(&encoded).unwrap(), (name, number));
    }

    #[test]
    fn engine_prefix_is_transparent(name in service_name_strategy(), number in 1u32..) {
        let raw = format!("/{}", container_name(&name, number));
        prop_assert_eq!(
            parse_container_name(strip_name_prefix(&raw)).unwrap(),
            (name, number)
        );
    }

    #[test]
    fn names_without_digit_suffix_never_parse(name in "[a-zA-Z_]{0,12}") {
        prop_assert!(parse_container_name(&name).is_err());
    }
}
