// Tagged parse outcome for probe output

/// Outcome of matching an expected pattern in raw command output.
///
/// Probes keep this internally and only collapse it to display text
/// (possibly a sentinel) at the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    Matched(T),
    Unmatched,
}

impl<T> Parsed<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Parsed::Matched(v),
            None => Parsed::Unmatched,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Parsed::Matched(_))
    }

    pub fn matched(self) -> Option<T> {
        match self {
            Parsed::Matched(v) => Some(v),
            Parsed::Unmatched => None,
        }
    }
}

impl Parsed<String> {
    /// Collapse to display text, substituting `sentinel` when unmatched
    pub fn or_sentinel(self, sentinel: &str) -> String {
        match self {
            Parsed::Matched(v) => v,
            Parsed::Unmatched => sentinel.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_only_when_unmatched() {
        assert_eq!(
            Parsed::Matched("0% packet loss".to_string()).or_sentinel("naurrr"),
            "0% packet loss"
        );
        assert_eq!(Parsed::<String>::Unmatched.or_sentinel("naurrr"), "naurrr");
    }

    #[test]
    fn test_from_option() {
        assert!(Parsed::from_option(Some(1)).is_matched());
        assert_eq!(Parsed::<i32>::from_option(None), Parsed::Unmatched);
        assert_eq!(Parsed::Matched(2).matched(), Some(2));
    }
}
