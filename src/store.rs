use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::err::Error;

/// A string keyed store of JSON text. Both storage scopes implement this.
pub trait Store: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
    fn snapshot(&self) -> BTreeMap<String, String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl Store for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }
}

/// Decodes the value under `key`. Absent and malformed values both yield `None`.
pub fn get<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    let raw = store.get_raw(key)?;
    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Malformed value under `{}`, treating as absent: {}", key, err);
            None
        }
    }
}

/// Undecoded elements of the collection under `key`. Absent and null are
/// empty; anything that is not a JSON array is an error.
pub fn raw_list(store: &dyn Store, key: &str) -> Result<Vec<Value>, Error> {
    let raw = match store.get_raw(key) {
        Some(raw) => raw,
        None => return Ok(Vec::new()),
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(Value::Null) => Ok(Vec::new()),
        _ => Err(Error::InternalError {
            kind: "MalformedCollection",
            message: format!("`{}` does not hold a list", key),
        }),
    }
}

/// Decodes a collection element by element. Elements that do not decode are
/// skipped; a value that is not a list reads as empty.
pub fn get_list<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Vec<T> {
    let items = match raw_list(store, key) {
        Ok(items) => items,
        Err(err) => {
            log::warn!("Treating `{}` as empty: {:?}", key, err);
            return Vec::new();
        }
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("Skipping malformed element {} of `{}`: {}", index, key, err);
                None
            }
        })
        .collect()
}

/// Pushes `item` onto the collection under `key`. Stored elements are written
/// back untouched, including ones [`get_list`] skips.
pub fn append<T: Serialize>(store: &mut dyn Store, key: &str, item: &T) -> Result<(), Error> {
    let mut items = raw_list(&*store, key)?;
    items.push(serde_json::to_value(item)?);
    set(store, key, &items)
}

pub fn set<T: Serialize + ?Sized>(store: &mut dyn Store, key: &str, value: &T) -> Result<(), Error> {
    let raw = serde_json::to_string(value)?;
    store.set_raw(key, raw);
    Ok(())
}

/// The two isolation scopes of one browser.
pub struct Storage {
    pub durable: Box<dyn Store>,
    pub session: Box<dyn Store>,
}

impl Storage {
    pub fn new<D, S>(durable: D, session: S) -> Self
    where
        D: Store + 'static,
        S: Store + 'static,
    {
        Self {
            durable: Box::new(durable),
            session: Box::new(session),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), MemoryStore::new())
    }
}
