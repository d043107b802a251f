//! A registry handle that can be swapped wholesale while readers use it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::error::TableResult;
use crate::registry::Registry;

/// Shares one [`Registry`] between many readers and supports atomic reload.
///
/// Readers take a snapshot with [`load`](Self::load) and keep using it even
/// if the registry is replaced mid-request. A reload builds a complete new
/// registry and swaps it in with [`replace`](Self::replace); readers never
/// see a half-built tree.
#[derive(Debug)]
pub struct SharedRegistry {
    current: ArcSwap<Registry>,
}

impl SharedRegistry {
    /// Share `registry`.
    pub fn new(registry: Registry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// A snapshot of the current registry.
    #[inline]
    pub fn load(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    /// Swap in `registry`, returning the one it replaced.
    pub fn replace(&self, registry: Registry) -> Arc<Registry> {
        info!(tables = registry.len(), "replacing registry");
        self.current.swap(Arc::new(registry))
    }

    /// Draw an item from the current registry.
    pub fn get_item(&self, path: &str) -> TableResult<String> {
        self.load().get_item(path)
    }

    /// List tables in the current registry.
    pub fn list_tables(&self, prefix: &str, show_hidden: bool) -> Vec<String> {
        self.load().list_tables(prefix, show_hidden)
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TextTable;

    fn registry_with(item: &str) -> Registry {
        let mut reg = Registry::new();
        let mut t = TextTable::new();
        t.add_item(item);
        reg.add_table("greeting", t, false);
        reg
    }

    #[test]
    fn snapshot_survives_replace() {
        let shared = SharedRegistry::new(registry_with("hello"));
        let before = shared.load();

        let old = shared.replace(registry_with("goodbye"));

        assert_eq!(before.get_item("greeting").unwrap(), "hello");
        assert_eq!(old.get_item("greeting").unwrap(), "hello");
        assert_eq!(shared.get_item("greeting").unwrap(), "goodbye");
    }

    #[test]
    fn nested_lookups_survive_reload() {
        let mut reg = registry_with("hello");
        let mut outer = TextTable::new();
        outer.add_item(r#"{{lookup "greeting"}} {{lookup "greeting"}}"#);
        reg.add_table("twice", outer, false);
        let shared = SharedRegistry::new(reg);

        assert_eq!(shared.get_item("twice").unwrap(), "hello hello");
        shared.replace(registry_with("bye"));
        assert!(shared.get_item("twice").unwrap_err().is_not_found());
        assert_eq!(shared.get_item("greeting").unwrap(), "bye");
    }

    #[test]
    fn concurrent_readers() {
        let shared = Arc::new(SharedRegistry::from(registry_with("hi")));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(shared.get_item("greeting").unwrap(), "hi");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.list_tables("", false), vec!["greeting"]);
    }
}
