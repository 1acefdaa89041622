//! Splitting a URL fragment into its anchor, fragment query and trailing directive.

use serde::Serialize;

/// Delimiter that starts a fragment directive, e.g. `:~:text=hello`.
pub const FRAGMENT_DIRECTIVE_DELIMITER: &str = ":~:";

/// The parts of a URL fragment (without `#`). Any part may be empty.
///
/// - `before`: everything up to the first `?`.
/// - `query`: everything after that `?` and before a fragment directive.
/// - `after`: the fragment directive, including its leading `:~:`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FragmentParts {
    pub before: String,
    pub query: String,
    pub after: String,
}

/// Decompose a raw fragment string (without the leading `#`).
///
/// Without a `?` the whole string is the anchor. A `:~:` inside the fragment query cuts the
/// query short and everything from the delimiter on is kept as `after`.
pub fn decompose_fragment(raw: &str) -> FragmentParts {
    let Some((before, candidate)) = raw.split_once('?') else {
        return FragmentParts {
            before: raw.to_string(),
            ..FragmentParts::default()
        };
    };

    let (query, after) = match candidate.find(FRAGMENT_DIRECTIVE_DELIMITER) {
        Some(pos) => (&candidate[..pos], &candidate[pos..]),
        None => (candidate, ""),
    };

    FragmentParts {
        before: before.to_string(),
        query: query.to_string(),
        after: after.to_string(),
    }
}

impl FragmentParts {
    /// Rebuild a fragment, `#` included, around a new fragment query.
    ///
    /// Returns an empty string instead of a bare `#` when there is nothing to emit.
    pub fn rebuild(&self, query: &str) -> String {
        if self.before.is_empty() && query.is_empty() && self.after.is_empty() {
            return String::new();
        }

        let mut fragment = String::with_capacity(
            1 + self.before.len() + 1 + query.len() + self.after.len(),
        );
        fragment.push('#');
        fragment.push_str(&self.before);
        if !query.is_empty() {
            fragment.push('?');
            fragment.push_str(query);
        }
        fragment.push_str(&self.after);
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(before: &str, query: &str, after: &str) -> FragmentParts {
        FragmentParts {
            before: before.into(),
            query: query.into(),
            after: after.into(),
        }
    }

    // ============ decompose_fragment tests ============

    #[test]
    fn test_decompose_empty() {
        assert_eq!(decompose_fragment(""), FragmentParts::default());
    }

    #[test]
    fn test_decompose_anchor_only() {
        assert_eq!(decompose_fragment("section-2"), parts("section-2", "", ""));
    }

    #[test]
    fn test_decompose_query_only() {
        assert_eq!(
            decompose_fragment("?first_name=Bob&subscribe"),
            parts("", "first_name=Bob&subscribe", "")
        );
    }

    #[test]
    fn test_decompose_anchor_and_query() {
        assert_eq!(
            decompose_fragment("top?first_name=Bob"),
            parts("top", "first_name=Bob", "")
        );
    }

    #[test]
    fn test_decompose_text_directive_after_query() {
        assert_eq!(
            decompose_fragment("?first_name=Bob&last_name=Smith:~:text=hello"),
            parts("", "first_name=Bob&last_name=Smith", ":~:text=hello")
        );
    }

    #[test]
    fn test_decompose_directive_before_query_stays_in_anchor() {
        // The directive precedes '?', so it is part of the anchor.
        assert_eq!(
            decompose_fragment("anchor:~:text=hello&?first_name=Hello"),
            parts("anchor:~:text=hello&", "first_name=Hello", "")
        );
    }

    #[test]
    fn test_decompose_splits_on_first_question_mark() {
        assert_eq!(decompose_fragment("a?b=1?c=2"), parts("a", "b=1?c=2", ""));
    }

    // ============ rebuild tests ============

    #[test]
    fn test_rebuild_nothing_is_empty() {
        assert_eq!(FragmentParts::default().rebuild(""), "");
    }

    #[test]
    fn test_rebuild_with_all_parts() {
        let p = parts("top", "old=1", ":~:text=hi");
        assert_eq!(p.rebuild("a=1&b"), "#top?a=1&b:~:text=hi");
    }

    #[test]
    fn test_rebuild_without_pairs_drops_question_mark() {
        let p = parts("top", "old=1", "");
        assert_eq!(p.rebuild(""), "#top");
    }

    #[test]
    fn test_rebuild_keeps_directive_alone() {
        let p = parts("", "", ":~:text=hi");
        assert_eq!(p.rebuild(""), "#:~:text=hi");
    }
}
