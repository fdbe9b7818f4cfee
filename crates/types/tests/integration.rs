//! Integration tests for shared types

#[cfg(test)]
mod tests {
    use hangar_types::*;
    use proptest::prelude::*;

    #[test]
    fn test_filter_serde_shape() {
        let filter = PackageFilter::min_rating("fdm", 3);
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(json, r#"{"kind":"min_rating","value":{"axis":"fdm","value":3}}"#);
        let back: PackageFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }

    #[test]
    fn test_revision_is_transparent_in_json() {
        let rev: Revision = serde_json::from_str("7").unwrap();
        assert_eq!(rev.get(), 7);
    }

    proptest! {
        #[test]
        fn revision_record_parses_back(n in any::<u32>()) {
            let rev = Revision::new(n);
            let parsed: Revision = rev.to_record().parse().unwrap();
            prop_assert_eq!(parsed, rev);
        }
    }
}
