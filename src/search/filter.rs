//! Verbatim metadata filter matching.

use crate::record::Metadata;

/// A row matches when its metadata contains every filter pair verbatim.
/// Rows without metadata only match an empty filter.
pub(crate) fn matches_filter(metadata: Option<&Metadata>, filter: &Metadata) -> bool {
    match metadata {
        Some(md) => filter.iter().all(|(k, v)| md.get(k) == Some(v)),
        None => filter.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_all_pairs_must_match() {
        let md = meta(&[("lang", "en"), ("topic", "db")]);
        assert!(matches_filter(Some(&md), &meta(&[("lang", "en")])));
        assert!(matches_filter(Some(&md), &meta(&[("lang", "en"), ("topic", "db")])));
        assert!(!matches_filter(Some(&md), &meta(&[("lang", "de")])));
        assert!(!matches_filter(Some(&md), &meta(&[("missing", "x")])));
    }

    #[test]
    fn test_no_metadata_matches_only_empty_filter() {
        assert!(matches_filter(None, &Metadata::new()));
        assert!(!matches_filter(None, &meta(&[("lang", "en")])));
    }
}
