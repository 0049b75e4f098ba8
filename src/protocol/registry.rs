//! Prefix-scoped element names.
//!
//! Generated names have the form `prefix*n`. Live names sit in a flat slot
//! table; each prefix keeps the slot indices of its live names. Counters are
//! kept apart from the live sets so a name is never handed out twice, even
//! after its prefix was deleted or the scene was emptied.

use std::collections::HashMap;

use crate::errors::ProtocolError;

/// Separator between a prefix and its counter
pub const NAME_SEPARATOR: char = '*';

/// Prefix part of a name (everything before the first `*`)
pub fn prefix_of(name: &str) -> &str {
    name.split_once(NAME_SEPARATOR)
        .map_or(name, |(prefix, _)| prefix)
}

pub fn validate_prefix(prefix: &str) -> Result<(), ProtocolError> {
    if prefix.contains(NAME_SEPARATOR) {
        return Err(ProtocolError::InvalidPrefix {
            prefix: prefix.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct PrefixRegistry {
    slots: Vec<Option<String>>,
    free: Vec<usize>,
    live: HashMap<String, Vec<usize>>,
    counters: HashMap<String, u64>,
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next unused name under `prefix` and mark it live.
    pub fn generate(&mut self, prefix: &str) -> Result<String, ProtocolError> {
        validate_prefix(prefix)?;
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        let name = format!("{prefix}{NAME_SEPARATOR}{counter}");
        self.insert(prefix, name.clone());
        Ok(name)
    }

    /// Track a caller-chosen name under its prefix part.
    ///
    /// Re-registering a live name is a no-op. A numeric suffix pushes the
    /// prefix counter forward so later generated names cannot collide.
    pub fn register(&mut self, name: &str) {
        let prefix = prefix_of(name);
        if let Some(n) = name
            .split_once(NAME_SEPARATOR)
            .and_then(|(_, suffix)| suffix.parse::<u64>().ok())
        {
            let counter = self.counters.entry(prefix.to_string()).or_insert(0);
            *counter = (*counter).max(n);
        }
        if self.is_live(name) {
            return;
        }
        self.insert(prefix, name.to_string());
    }

    fn insert(&mut self, prefix: &str, name: String) {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(name);
                slot
            }
            None => {
                self.slots.push(Some(name));
                self.slots.len() - 1
            }
        };
        self.live.entry(prefix.to_string()).or_default().push(slot);
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.live.get(prefix_of(name)).is_some_and(|slots| {
            slots
                .iter()
                .any(|&slot| self.slots[slot].as_deref() == Some(name))
        })
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.live.contains_key(prefix)
    }

    /// Live names under `prefix`, in registration order
    pub fn names(&self, prefix: &str) -> Vec<&str> {
        self.live
            .get(prefix)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|&slot| self.slots[slot].as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop a prefix and return its live names. Counters are kept.
    pub fn remove_prefix(&mut self, prefix: &str) -> Option<Vec<String>> {
        let slots = self.live.remove(prefix)?;
        let names = slots
            .into_iter()
            .filter_map(|slot| {
                self.free.push(slot);
                self.slots[slot].take()
            })
            .collect();
        Some(names)
    }

    /// Forget every live name. Counters are kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live.clear();
    }

    /// Number of live names
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_count_up_per_prefix() {
        let mut r = PrefixRegistry::new();
        assert_eq!(r.generate("dot").unwrap(), "dot*1");
        assert_eq!(r.generate("dot").unwrap(), "dot*2");
        assert_eq!(r.generate("line").unwrap(), "line*1");
        assert_eq!(r.names("dot"), ["dot*1", "dot*2"]);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn counters_survive_delete_and_clear() {
        let mut r = PrefixRegistry::new();
        r.generate("a").unwrap();
        r.generate("a").unwrap();
        assert_eq!(
            r.remove_prefix("a"),
            Some(vec!["a*1".to_string(), "a*2".to_string()])
        );
        assert!(!r.contains_prefix("a"));
        assert!(r.names("a").is_empty());
        assert_eq!(r.generate("a").unwrap(), "a*3");

        r.clear();
        assert!(r.is_empty());
        assert_eq!(r.generate("a").unwrap(), "a*4");
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut r = PrefixRegistry::new();
        r.generate("a").unwrap();
        r.generate("b").unwrap();
        r.remove_prefix("a");
        r.generate("c").unwrap();
        assert_eq!(r.slots.len(), 2);
        assert_eq!(r.names("c"), ["c*1"]);
        assert_eq!(r.names("b"), ["b*1"]);
    }

    #[test]
    fn star_in_prefix_is_rejected() {
        let mut r = PrefixRegistry::new();
        let err = r.generate("a*b").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPrefix { .. }));
        assert!(r.is_empty());
    }

    #[test]
    fn registered_names_join_their_prefix() {
        let mut r = PrefixRegistry::new();
        r.register("K*7");
        r.register("K*7");
        r.register("plain");
        assert_eq!(r.names("K"), ["K*7"]);
        assert_eq!(r.names("plain"), ["plain"]);
        assert!(r.is_live("K*7"));
        assert_eq!(r.generate("K").unwrap(), "K*8");
    }

    #[test]
    fn prefix_of_splits_at_first_star() {
        assert_eq!(prefix_of("KB*12"), "KB");
        assert_eq!(prefix_of("plain"), "plain");
        assert_eq!(prefix_of("*3"), "");
    }
}
