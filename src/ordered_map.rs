//! Insertion-ordered string mapping
//!
//! Compose manifests are order sensitive (services, environment entries,
//! labels), and the generated module has to list things in the order the
//! author wrote them. `OrderedMap` keeps first-insertion order; inserting an
//! existing key replaces the value where it already sits.

/// Insertion-ordered mapping from string keys to values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V = String> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a value, overwriting in place if the key already exists
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the entries matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &V) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut map = OrderedMap::new();
        map.insert("a", "1".to_string());
        map.insert("b", "2".to_string());
        map.insert("a", "3".to_string());

        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, vec![("a", &"3".to_string()), ("b", &"2".to_string())]);
    }

    #[test]
    fn test_retain() {
        let mut map: OrderedMap = [("traefik.enable", "true"), ("app", "web")]
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        map.retain(|key, _| !key.starts_with("traefik."));

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("app"));
    }
}
