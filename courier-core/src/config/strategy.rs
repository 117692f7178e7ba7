//! Per-field merge strategies.
//!
//! Every [`RequestConfig`](super::RequestConfig) field is assigned exactly one
//! [`MergeStrategy`] in the field table of the `config` module. The table is
//! resolved at compile time: each strategy has a marker type in [`markers`]
//! implementing [`FieldMerge`] for the field's value type, so a field can only
//! be declared deep-merge if its type implements [`DeepMerge`].

use http::HeaderMap;

/// How one configuration field combines a base layer with an override layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeStrategy {
    /// Use the override's value when defined, else the base's.
    OverrideWins,
    /// Merge both values as mappings; the override's keys win on conflict.
    DeepMerge,
    /// Take the override's value whole, falling back to the base's. Values
    /// are never combined, even when they are themselves mappings.
    OverrideOnly,
}

/// Mapping-like values that can be merged key by key.
pub trait DeepMerge: Clone {
    /// Merge `over` onto `self`, returning a new value.
    fn deep_merge(&self, over: &Self) -> Self;
}

impl DeepMerge for HeaderMap {
    fn deep_merge(&self, over: &Self) -> Self {
        // HeaderName is always lowercase, so key comparison is case-insensitive.
        let mut merged = self.clone();
        for name in over.keys() {
            merged.remove(name);
            for value in over.get_all(name) {
                merged.append(name.clone(), value.clone());
            }
        }
        merged
    }
}

/// Marker types, one per [`MergeStrategy`] variant.
pub(crate) mod markers {
    pub(crate) struct OverrideWins;
    pub(crate) struct DeepMerge;
    pub(crate) struct OverrideOnly;
}

/// Merges one optional field of two configuration layers.
pub(crate) trait FieldMerge<T> {
    fn merge_field(base: &Option<T>, over: &Option<T>) -> Option<T>;
}

impl<T: Clone> FieldMerge<T> for markers::OverrideWins {
    #[inline]
    fn merge_field(base: &Option<T>, over: &Option<T>) -> Option<T> {
        over.as_ref().or(base.as_ref()).cloned()
    }
}

impl<T: Clone> FieldMerge<T> for markers::OverrideOnly {
    #[inline]
    fn merge_field(base: &Option<T>, over: &Option<T>) -> Option<T> {
        match over {
            Some(value) => Some(value.clone()),
            None => base.clone(),
        }
    }
}

impl<T: DeepMerge> FieldMerge<T> for markers::DeepMerge {
    fn merge_field(base: &Option<T>, over: &Option<T>) -> Option<T> {
        match (base, over) {
            (Some(base), Some(over)) => Some(base.deep_merge(over)),
            (base, over) => over.as_ref().or(base.as_ref()).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                http::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_header_deep_merge_case_insensitive() {
        let merged = headers(&[("A", "1")]).deep_merge(&headers(&[("a", "2")]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("a").unwrap(), "2");
    }

    #[test]
    fn test_header_deep_merge_keeps_base_keys() {
        let merged = headers(&[("x-base", "b"), ("x-both", "old")])
            .deep_merge(&headers(&[("x-both", "new"), ("x-over", "o")]));
        assert_eq!(merged.get("x-base").unwrap(), "b");
        assert_eq!(merged.get("x-both").unwrap(), "new");
        assert_eq!(merged.get("x-over").unwrap(), "o");
    }

    #[test]
    fn test_header_deep_merge_replaces_multi_values() {
        let merged = headers(&[("accept", "a"), ("accept", "b")])
            .deep_merge(&headers(&[("Accept", "c")]));
        let values: Vec<_> = merged.get_all("accept").iter().collect();
        assert_eq!(values, vec!["c"]);
    }

    #[test]
    fn test_override_wins() {
        assert_eq!(
            markers::OverrideWins::merge_field(&Some(1), &Some(2)),
            Some(2)
        );
        assert_eq!(markers::OverrideWins::merge_field(&Some(1), &None), Some(1));
        assert_eq!(
            <markers::OverrideWins as FieldMerge<i32>>::merge_field(&None, &None),
            None
        );
    }

    #[test]
    fn test_override_only_falls_back_to_base() {
        assert_eq!(
            markers::OverrideOnly::merge_field(&Some("base"), &None),
            Some("base")
        );
        assert_eq!(
            markers::OverrideOnly::merge_field(&Some("base"), &Some("over")),
            Some("over")
        );
    }

    #[test]
    fn test_deep_merge_with_one_side_missing() {
        let base = Some(headers(&[("x-a", "1")]));
        assert_eq!(
            markers::DeepMerge::merge_field(&base, &None),
            base.clone()
        );
        assert_eq!(
            markers::DeepMerge::merge_field(&None, &base),
            base
        );
    }
}
