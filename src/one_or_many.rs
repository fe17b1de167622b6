use serde::{Deserialize, Serialize};

/// A JSON value that may be given either as a single item or as an array.
///
/// DID Documents use this shape for `controller`, service `type` and
/// `serviceEndpoint`, and `@context`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::Many(values) => values.is_empty(),
        }
    }

    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.first(),
        }
    }

    /// Collapse a vector into the most compact form: a bare item when there
    /// is exactly one, an array otherwise. Returns `None` for an empty vector.
    pub fn compact(mut values: Vec<T>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::One),
            _ => Some(Self::Many(values)),
        }
    }
}

// consuming iterator
impl<T> IntoIterator for OneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::One(value) => vec![value].into_iter(),
            Self::Many(values) => values.into_iter(),
        }
    }
}

// non-consuming iterator
impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            OneOrMany::One(value) => vec![value].into_iter(),
            OneOrMany::Many(values) => values.iter().collect::<Vec<Self::Item>>().into_iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_forms() {
        assert_eq!(OneOrMany::<String>::compact(vec![]), None);
        assert_eq!(
            OneOrMany::compact(vec!["a".to_string()]),
            Some(OneOrMany::One("a".to_string()))
        );
        let many = OneOrMany::compact(vec![1, 2]).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many.first(), Some(&1));
    }

    #[test]
    fn untagged_serde() {
        let one: OneOrMany<String> = serde_json::from_str("\"did:example:a\"").unwrap();
        assert_eq!(one, OneOrMany::One("did:example:a".to_string()));
        let many: OneOrMany<String> = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(many.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
