//! Ordered command-line options for the rendering binary.

use std::fmt;

use super::types::RenderError;

/// Value attached to a single option key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Emit the flag with no argument.
    Flag,
    /// Leave the flag out of the command entirely.
    Omit,
    /// Emit the flag followed by this argument.
    Value(String),
    /// Emit the flag once per pair, each time followed by both elements.
    Pairs(Vec<(String, String)>),
}

impl OptionValue {
    pub fn value(value: impl fmt::Display) -> Self {
        Self::Value(value.to_string())
    }

    pub fn pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Omit
        } else {
            Self::Value(value.to_string())
        }
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Omit
        } else {
            Self::Value(value)
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        if value { Self::Flag } else { Self::Omit }
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Flag, Into::into)
    }
}

macro_rules! numeric_option_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    Self::Value(value.to_string())
                }
            }
        )*
    };
}

numeric_option_value!(i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// Canonical option name: leading dashes stripped, lowercased.
pub fn canonical_key(key: &str) -> String {
    key.trim_start_matches('-').to_ascii_lowercase()
}

/// Ordered association list of options keyed by canonical flag name.
///
/// Inserting a key that is already present (in any dashed or cased
/// spelling) replaces its value in place, so the first insertion decides
/// the position and the last one decides the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: Vec<(String, OptionValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<OptionValue>) -> Option<OptionValue> {
        let key = canonical_key(key);
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Append a pair to a repeatable option, replacing any non-pair value.
    pub fn push_pair(&mut self, key: &str, name: impl Into<String>, value: impl Into<String>) {
        let pair = (name.into(), value.into());
        let canonical = canonical_key(key);
        match self.entries.iter_mut().find(|(existing, _)| *existing == canonical) {
            Some((_, OptionValue::Pairs(pairs))) => pairs.push(pair),
            Some((_, slot)) => *slot = OptionValue::Pairs(vec![pair]),
            None => self.entries.push((canonical, OptionValue::Pairs(vec![pair]))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        let key = canonical_key(key);
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        let key = canonical_key(key);
        let index = self.entries.iter().position(|(existing, _)| *existing == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fold `other` into `self`; entries from `other` win on collision.
    pub fn merge(&mut self, other: Options) {
        for (key, value) in other.entries {
            self.insert(&key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Flatten into command-line tokens.
    pub fn to_args(&self) -> Result<Vec<String>, RenderError> {
        let mut args = Vec::new();
        for (key, value) in &self.entries {
            let flag = format!("--{key}");
            match value {
                OptionValue::Flag => args.push(flag),
                OptionValue::Omit => {}
                OptionValue::Value(value) => {
                    args.push(flag);
                    args.push(value.clone());
                }
                OptionValue::Pairs(pairs) => {
                    for (name, value) in pairs {
                        if name.is_empty() || value.is_empty() {
                            return Err(RenderError::invalid_option(
                                key.as_str(),
                                "pair elements must not be empty",
                            ));
                        }
                        args.push(flag.clone());
                        args.push(name.clone());
                        args.push(value.clone());
                    }
                }
            }
        }
        Ok(args)
    }
}

impl<K, V> FromIterator<(K, V)> for Options
where
    K: AsRef<str>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (key, value) in iter {
            options.insert(key.as_ref(), value);
        }
        options
    }
}
