/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
mod helpers;

#[cfg(test)]
mod test {
    use crate::helpers;
    use imagefeed::v1::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError, clear_on_first_launch};
    use std::fs;

    #[test]
    fn file_store_survives_reopen() {
        helpers::init_logger();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        let store = FileTokenStore::open(&path).unwrap();
        assert_eq!(store.get(), None);
        store.set("persisted").unwrap();
        assert_eq!(store.get().as_deref(), Some("persisted"));
        drop(store);

        let reopened = FileTokenStore::open(&path).unwrap();
        assert_eq!(reopened.get().as_deref(), Some("persisted"));
        reopened.set("replaced").unwrap();
        assert_eq!(FileTokenStore::open(&path).unwrap().get().as_deref(), Some("replaced"));
    }

    #[test]
    fn file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let store = FileTokenStore::open(&path).unwrap();
        store.set("abc").unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert_eq!(store.get(), None);
        assert!(!path.exists());
        // Clearing an empty store is fine
        store.clear().unwrap();
        assert_eq!(FileTokenStore::open(&path).unwrap().get(), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            FileTokenStore::open(&path),
            Err(TokenStoreError::Serialization(_))
        ));
    }

    #[test]
    fn first_launch_clears_leftover_token_once() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        let marker = dir.path().join(".installed");

        let store = FileTokenStore::open(&token_path).unwrap();
        store.set("left over").unwrap();

        assert!(clear_on_first_launch(&store, &marker).unwrap());
        assert_eq!(store.get(), None);
        assert!(marker.exists());

        store.set("fresh").unwrap();
        assert!(!clear_on_first_launch(&store, &marker).unwrap());
        assert_eq!(store.get().as_deref(), Some("fresh"));
    }

    #[test]
    fn memory_store_starts_with_given_token() {
        let store = MemoryTokenStore::with_token("abc");
        assert_eq!(store.get().as_deref(), Some("abc"));
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }
}
