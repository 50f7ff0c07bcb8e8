/// The kinds to declare when creating a [`Storage`](crate::Storage)
///
/// This is what [`create`](crate::create) accepts: either a single kind name, or a sequence of
/// kind names. Duplicate names are only kept once, in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kinds(Vec<String>);

impl Kinds {
    /// The declared kind names
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether no kind was declared at all
    ///
    /// A [`Storage`](crate::Storage) created from empty `Kinds` holds no kind, and rejects every
    /// operation with [`Error::UnknownKind`](crate::Error::UnknownKind).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Kinds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut kinds: Vec<String> = Vec::new();
        for kind in iter {
            let kind = kind.into();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Kinds(kinds)
    }
}

impl From<&str> for Kinds {
    fn from(kind: &str) -> Self {
        Kinds(vec![kind.to_owned()])
    }
}

impl From<String> for Kinds {
    fn from(kind: String) -> Self {
        Kinds(vec![kind])
    }
}

impl From<&[&str]> for Kinds {
    fn from(kinds: &[&str]) -> Self {
        kinds.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for Kinds {
    fn from(kinds: [&str; N]) -> Self {
        kinds.into_iter().collect()
    }
}

impl<const N: usize> From<&[&str; N]> for Kinds {
    fn from(kinds: &[&str; N]) -> Self {
        kinds.iter().copied().collect()
    }
}

impl From<Vec<&str>> for Kinds {
    fn from(kinds: Vec<&str>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<Vec<String>> for Kinds {
    fn from(kinds: Vec<String>) -> Self {
        kinds.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Kinds {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Kinds;

    #[test]
    fn single_kind_becomes_a_sequence() {
        assert_eq!(Kinds::from("kind-a").as_slice(), ["kind-a"]);
        assert_eq!(Kinds::from(String::from("kind-a")).as_slice(), ["kind-a"]);
    }

    #[test]
    fn sequences_keep_their_order() {
        let expected = ["kind-b", "kind-a"];
        assert_eq!(Kinds::from(["kind-b", "kind-a"]).as_slice(), expected);
        assert_eq!(Kinds::from(&["kind-b", "kind-a"]).as_slice(), expected);
        assert_eq!(Kinds::from(vec!["kind-b", "kind-a"]).as_slice(), expected);
        assert_eq!(
            Kinds::from(vec![String::from("kind-b"), String::from("kind-a")]).as_slice(),
            expected
        );
        assert_eq!(Kinds::from(&expected[..]).as_slice(), expected);
    }

    #[test]
    fn duplicates_are_dropped() {
        assert_eq!(
            Kinds::from(["kind-a", "kind-b", "kind-a"]).as_slice(),
            ["kind-a", "kind-b"]
        );
    }

    #[test]
    fn no_kinds_at_all() {
        assert!(Kinds::from(Vec::<String>::new()).is_empty());
        assert!(Kinds::default().is_empty());
    }
}
