use std::collections::HashMap;

/// Maps a subject to a friendly display name, if one is known.
pub trait NameResolver {
    fn display_name(&self, subject: &str) -> Option<String>;

    /// Friendly name, or the raw subject when none is configured.
    fn resolve_or_raw(&self, subject: &str) -> String {
        self.display_name(subject)
            .unwrap_or_else(|| subject.to_string())
    }
}

impl<F> NameResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn display_name(&self, subject: &str) -> Option<String> {
        self(subject)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayNames {
    names: HashMap<String, String>,
}

impl DisplayNames {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for DisplayNames {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl NameResolver for DisplayNames {
    fn display_name(&self, subject: &str) -> Option<String> {
        self.names.get(subject).cloned()
    }
}
