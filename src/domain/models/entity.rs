//! Entities and the rules that derive a positional index from their names.

/// An item of a managed collection, identified by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for String {
    fn name(&self) -> &str {
        self
    }
}

impl Named for &str {
    fn name(&self) -> &str {
        self
    }
}

/// Segment after the last `-`, if the name has one.
fn last_segment(name: &str) -> Option<&str> {
    name.rsplit_once('-').map(|(_, segment)| segment)
}

/// Index from the leading digits of the last `-` segment.
///
/// `"master-1"` and `"master-1x"` both map to `1`; `"master"` and
/// `"master-x"` have no index.
pub fn suffix_index(name: &str) -> Option<usize> {
    let segment = last_segment(name)?;
    let digits = segment
        .find(|c: char| !c.is_ascii_digit())
        .map_or(segment, |end| &segment[..end]);
    digits.parse().ok()
}

/// Index from a last `-` segment made only of digits.
pub fn exact_suffix_index(name: &str) -> Option<usize> {
    let segment = last_segment(name)?;
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_index() {
        assert_eq!(suffix_index("cluster-master-0"), Some(0));
        assert_eq!(suffix_index("cluster-master-12"), Some(12));
        assert_eq!(suffix_index("foo-1x"), Some(1));
        assert_eq!(suffix_index("foo-x1"), None);
        assert_eq!(suffix_index("foo-"), None);
        assert_eq!(suffix_index("foo"), None);
    }

    #[test]
    fn test_exact_suffix_index() {
        assert_eq!(exact_suffix_index("cluster-master-2"), Some(2));
        assert_eq!(exact_suffix_index("foo-1x"), None);
        assert_eq!(exact_suffix_index("foo-"), None);
        assert_eq!(exact_suffix_index("7"), None);
    }

    #[test]
    fn test_string_is_named() {
        let owned = String::from("worker-3");
        assert_eq!(owned.name(), "worker-3");
        assert_eq!("worker-4".name(), "worker-4");
    }
}
