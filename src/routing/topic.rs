//! Hierarchical topic matching with `+` and `#` wildcards.

/// Separates topic levels.
pub const SEPARATOR: char = '/';

/// Matches exactly one topic level.
pub const SINGLE_LEVEL_WILDCARD: &str = "+";

/// Matches the rest of the topic; only valid as the last level.
pub const MULTI_LEVEL_WILDCARD: &str = "#";

/// Returns true when `topic` is covered by `pattern`.
///
/// - identical strings always match;
/// - `prefix/#` matches every topic starting with `prefix/`, a lone `#`
///   matches everything;
/// - otherwise both sides must have the same number of levels, and each
///   pattern level is either `+` or equal to the topic level.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    if pattern == topic {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix(MULTI_LEVEL_WILDCARD) {
        if !prefix.is_empty() && !prefix.ends_with(SEPARATOR) {
            return false;
        }
        return topic.starts_with(prefix);
    }

    let mut pattern_levels = pattern.split(SEPARATOR);
    let mut topic_levels = topic.split(SEPARATOR);

    loop {
        match (pattern_levels.next(), topic_levels.next()) {
            (None, None) => return true,
            (Some(expected), Some(actual)) => {
                if expected != SINGLE_LEVEL_WILDCARD && expected != actual {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Checks that `#` only ever appears as a whole, final level.
pub fn is_valid_pattern(pattern: &str) -> bool {
    let mut levels = pattern.split(SEPARATOR).peekable();
    while let Some(level) = levels.next() {
        let is_last = levels.peek().is_none();
        if level.contains(MULTI_LEVEL_WILDCARD) && (level != MULTI_LEVEL_WILDCARD || !is_last) {
            return false;
        }
        if level.contains(SINGLE_LEVEL_WILDCARD) && level != SINGLE_LEVEL_WILDCARD {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_match() {
        assert!(topic_matches("a/b", "a/b"));
        assert!(!topic_matches("a/b", "a/c"));
    }

    #[test]
    fn test_single_level_wildcard() {
        assert!(topic_matches("a/+/c", "a/b/c"));
        assert!(!topic_matches("a/+/c", "a/b/x/c"));
        assert!(!topic_matches("a/+/c", "a/b/d"));
        assert!(topic_matches("+/+", "x/y"));
        assert!(!topic_matches("+", "x/y"));
    }

    #[test]
    fn test_multi_level_wildcard() {
        assert!(topic_matches("a/#", "a/b/c"));
        assert!(topic_matches("a/#", "a/b"));
        assert!(!topic_matches("a/#", "x/y"));
        assert!(!topic_matches("a/#", "ab/c"));
        assert!(topic_matches("#", "anything/at/all"));
    }

    #[test]
    fn test_hash_must_be_whole_level() {
        assert!(!topic_matches("a#", "ab"));
        assert!(!topic_matches("a/b#", "a/bc"));
    }

    #[test]
    fn test_device_patterns() {
        let pattern = "dev/+/raw";
        assert!(topic_matches(pattern, "dev/42/raw"));
        assert!(!topic_matches(pattern, "dev/42/43/raw"));
        assert!(!topic_matches(pattern, "other/42/raw"));
    }

    #[test]
    fn test_is_valid_pattern() {
        assert!(is_valid_pattern("a/b"));
        assert!(is_valid_pattern("a/+/c"));
        assert!(is_valid_pattern("a/#"));
        assert!(is_valid_pattern("#"));
        assert!(!is_valid_pattern("a/#/c"));
        assert!(!is_valid_pattern("a/b#"));
        assert!(!is_valid_pattern("a/b+/c"));
    }

    fn levels_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z0-9]{1,6}", 1..6)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_topic_matches_itself(levels in levels_strategy()) {
            let topic = levels.join("/");
            prop_assert!(topic_matches(&topic, &topic));
        }

        #[test]
        fn prop_plus_replaces_any_level(levels in levels_strategy(), idx in any::<prop::sample::Index>()) {
            let topic = levels.join("/");
            let mut pattern_levels = levels.clone();
            let i = idx.index(pattern_levels.len());
            pattern_levels[i] = SINGLE_LEVEL_WILDCARD.to_string();

            prop_assert!(topic_matches(&pattern_levels.join("/"), &topic));
        }

        #[test]
        fn prop_level_count_must_agree(levels in levels_strategy(), extra in "[a-z]{1,4}") {
            let pattern = vec![SINGLE_LEVEL_WILDCARD; levels.len()].join("/");
            let longer = format!("{}/{}", levels.join("/"), extra);

            prop_assert!(topic_matches(&pattern, &levels.join("/")));
            prop_assert!(!topic_matches(&pattern, &longer));
        }

        #[test]
        fn prop_hash_covers_every_extension(prefix in levels_strategy(), rest in levels_strategy()) {
            let pattern = format!("{}/#", prefix.join("/"));
            let topic = format!("{}/{}", prefix.join("/"), rest.join("/"));

            prop_assert!(topic_matches(&pattern, &topic));
        }
    }
}
