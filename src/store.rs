// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;

use crate::error::Fallible;

/// A durable string-to-string store. Writes to different keys are
/// independent: there is no atomicity across keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Fallible<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Fallible<()>;

    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Fallible<()>;
}

/// A store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Fallible<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Fallible<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() -> Fallible<()> {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a")?, None);
        store.set("a", "1")?;
        store.set("a", "2")?;
        assert_eq!(store.get("a")?, Some("2".to_string()));
        store.remove("a")?;
        store.remove("a")?;
        assert_eq!(store.get("a")?, None);
        Ok(())
    }
}
