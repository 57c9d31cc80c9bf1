use std::collections::BTreeMap;

/// Public filter/sort names mapped onto internal field paths.
///
/// Keys match case-insensitively; names without an entry pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct AliasMap(BTreeMap<String, String>);

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, alias: impl AsRef<str>, path: impl Into<String>) -> Self {
        self.insert(alias, path);
        self
    }

    pub fn insert(&mut self, alias: impl AsRef<str>, path: impl Into<String>) {
        self.0
            .insert(alias.as_ref().to_ascii_lowercase(), path.into());
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AliasMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
