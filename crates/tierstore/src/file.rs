//! Filesystem-backed store
//!
//! Layout under the root directory:
//! - one file per key, named after the hex-encoded key plus `.entry`
//! - hex names longer than [`SEGMENT_LEN`] are split into nested directories
//!
//! Files are written to a temporary sibling and renamed into place.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use regex::Regex;
use tracing::{debug, warn};

use crate::codec::{decode_entry, encode_entry};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::store::Store;

/// Longest path component produced from a key
pub const SEGMENT_LEN: usize = 200;

const ENTRY_EXT: &str = "entry";
const TMP_EXT: &str = "tmp";
// file stem for the empty key, which has no hex digits
const EMPTY_KEY_STEM: &str = "_";

/// Store keeping each entry in its own file
pub struct FileStore {
    root: PathBuf,
    options: Options,
    // serializes read-modify-write sequences within this process
    io: RwLock<()>,
}

impl FileStore {
    /// Open or create a store rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            options,
            io: RwLock::new(()),
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let encoded = hex::encode(key.as_bytes());
        let mut path = self.root.clone();

        let mut rest = encoded.as_str();
        while rest.len() > SEGMENT_LEN {
            let (segment, tail) = rest.split_at(SEGMENT_LEN);
            path.push(segment);
            rest = tail;
        }
        let stem = if rest.is_empty() { EMPTY_KEY_STEM } else { rest };
        path.push(format!("{}.{}", stem, ENTRY_EXT));
        path
    }

    fn path_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut encoded = String::new();
        for component in relative.iter() {
            encoded.push_str(component.to_str()?);
        }
        let encoded = encoded.strip_suffix(&format!(".{}", ENTRY_EXT))?;
        if encoded == EMPTY_KEY_STEM {
            return Some(String::new());
        }
        String::from_utf8(hex::decode(encoded).ok()?).ok()
    }

    fn load(&self, path: &Path) -> Result<Option<Entry>> {
        match fs::read(path) {
            Ok(bytes) => decode_entry(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load_live(&self, path: &Path) -> Result<Option<Entry>> {
        match self.load(path)? {
            Some(entry) if entry.is_expired() => {
                self.remove(path)?;
                Ok(None)
            }
            found => Ok(found),
        }
    }

    // Re-load under the write lock: another writer may have replaced the
    // file since it was seen expired.
    fn expire(&self, path: &Path) -> Result<Option<Entry>> {
        let _guard = self.io.write();
        self.load_live(path)
    }

    fn store(&self, path: &Path, entry: &Entry) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension(TMP_EXT);
        fs::write(&tmp, encode_entry(entry))?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => {
                self.prune_dirs(path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // Remove directories left empty by a delete, stopping at the root.
    fn prune_dirs(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == self.root || fs::remove_dir(current).is_err() {
                break;
            }
            dir = current.parent();
        }
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_entry_files(&self.root, &mut files)?;
        Ok(files)
    }

    fn adjust(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        let _guard = self.io.write();
        let path = self.key_path(key);

        let current = match self.load_live(&path)? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let n = current
            .as_integer()
            .ok_or_else(|| Error::NotNumeric(key.to_string()))?
            .wrapping_add(delta);

        self.store(&path, &current.replace_value(n.to_string()))?;
        Ok(Some(n))
    }
}

fn collect_entry_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for item in fs::read_dir(dir)? {
        let path = item?.path();
        if path.is_dir() {
            collect_entry_files(&path, files)?;
        } else if is_entry_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_entry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(&format!(".{}", ENTRY_EXT)))
}

impl Store for FileStore {
    fn kind(&self) -> &str {
        "file_store"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn read_entry(&self, key: &str, _options: &Options) -> Result<Option<Entry>> {
        let path = self.key_path(key);
        let found = {
            let _guard = self.io.read();
            self.load(&path)?
        };

        match found {
            Some(entry) if entry.is_expired() => self.expire(&path),
            found => Ok(found),
        }
    }

    fn write_entry(&self, key: &str, entry: &Entry, _options: &Options) -> Result<bool> {
        let _guard = self.io.write();
        self.store(&self.key_path(key), entry)?;
        Ok(true)
    }

    fn delete_entry(&self, key: &str, _options: &Options) -> Result<bool> {
        let _guard = self.io.write();
        self.remove(&self.key_path(key))
    }

    fn increment(&self, key: &str, amount: i64, _options: &Options) -> Result<Option<i64>> {
        self.adjust(key, amount)
    }

    fn decrement(&self, key: &str, amount: i64, _options: &Options) -> Result<Option<i64>> {
        self.adjust(key, amount.wrapping_neg())
    }

    fn delete_matched(&self, pattern: &Regex, _options: &Options) -> Result<usize> {
        let _guard = self.io.write();
        let mut removed = 0;

        for path in self.entry_files()? {
            match self.path_key(&path) {
                Some(key) if pattern.is_match(&key) => {
                    if self.remove(&path)? {
                        removed += 1;
                    }
                }
                Some(_) => {}
                None => warn!(path = %path.display(), "skipping file with undecodable key"),
            }
        }
        Ok(removed)
    }

    fn clear(&self, _options: &Options) -> Result<()> {
        let _guard = self.io.write();

        for item in fs::read_dir(&self.root)? {
            let path = item?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        debug!(root = %self.root.display(), "file store cleared");
        Ok(())
    }

    fn cleanup(&self, _options: &Options) -> Result<usize> {
        let _guard = self.io.write();
        let mut pruned = 0;

        for path in self.entry_files()? {
            let expired = match self.load(&path) {
                Ok(Some(entry)) => entry.is_expired(),
                Ok(None) => false,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    false
                }
            };
            if expired && self.remove(&path)? {
                pruned += 1;
            }
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn opts() -> Options {
        Options::new()
    }

    #[test]
    fn test_open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("cache");

        let store = FileStore::open(&root, opts()).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_read_write_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();

        assert!(store.read_entry("foo", &opts()).unwrap().is_none());
        store.write_entry("foo", &Entry::new("bar"), &opts()).unwrap();

        let entry = store.read_entry("foo", &opts()).unwrap().unwrap();
        assert_eq!(entry.value().as_ref(), b"bar");

        assert!(store.delete_entry("foo", &opts()).unwrap());
        assert!(!store.delete_entry("foo", &opts()).unwrap());
        assert!(store.read_entry("foo", &opts()).unwrap().is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(dir.path(), opts()).unwrap();
            store.write_entry("foo", &Entry::new("bar"), &opts()).unwrap();
        }

        let store = FileStore::open(dir.path(), opts()).unwrap();
        let entry = store.read_entry("foo", &opts()).unwrap().unwrap();
        assert_eq!(entry.value().as_ref(), b"bar");
    }

    #[test]
    fn test_crazy_key_characters() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();
        let key = "#/:*(<+=> )&$%@?;'\"\\`~-\u{fc}mlaut";

        store.write_entry(key, &Entry::new("1"), &opts()).unwrap();
        assert!(store.read_entry(key, &opts()).unwrap().is_some());
        assert_eq!(store.increment(key, 2, &opts()).unwrap(), Some(3));
        assert!(store.delete_entry(key, &opts()).unwrap());
    }

    #[test]
    fn test_really_long_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();
        let key = "x".repeat(900);

        store.write_entry(&key, &Entry::new("bar"), &opts()).unwrap();
        assert!(store.read_entry(&key, &opts()).unwrap().is_some());
        assert!(store.read_entry(&format!("{}x", key), &opts()).unwrap().is_none());

        let removed = store.delete_matched(&Regex::new("^x+$").unwrap(), &opts()).unwrap();
        assert_eq!(removed, 1);
        // nested directories are pruned with the entry
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();
        let past = SystemTime::now() - Duration::from_secs(1);

        store.write_entry("foo", &Entry::with_expires_at("bar", past), &opts()).unwrap();
        assert!(store.read_entry("foo", &opts()).unwrap().is_none());
        assert!(store.entry_files().unwrap().is_empty());
    }

    #[test]
    fn test_expire_keeps_rewritten_entry() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();
        let past = SystemTime::now() - Duration::from_secs(1);
        let path = store.key_path("foo");

        store.write_entry("foo", &Entry::with_expires_at("old", past), &opts()).unwrap();
        // a concurrent writer replaces the entry after a reader saw it expired
        store.write_entry("foo", &Entry::new("new"), &opts()).unwrap();

        let kept = store.expire(&path).unwrap().unwrap();
        assert_eq!(kept.value().as_ref(), b"new");
        assert_eq!(
            store.read_entry("foo", &opts()).unwrap().unwrap().value().as_ref(),
            b"new"
        );

        store.write_entry("foo", &Entry::with_expires_at("old", past), &opts()).unwrap();
        assert!(store.expire(&path).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_key() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();
        let past = SystemTime::now() - Duration::from_secs(1);

        store.write_entry("", &Entry::new("bar"), &opts()).unwrap();
        assert!(store.read_entry("", &opts()).unwrap().is_some());
        assert_eq!(store.entry_files().unwrap().len(), 1);

        let removed = store.delete_matched(&Regex::new(".*").unwrap(), &opts()).unwrap();
        assert_eq!(removed, 1);
        assert!(store.read_entry("", &opts()).unwrap().is_none());

        store.write_entry("", &Entry::with_expires_at("bar", past), &opts()).unwrap();
        assert_eq!(store.cleanup(&opts()).unwrap(), 1);
        assert!(store.entry_files().unwrap().is_empty());
    }

    #[test]
    fn test_increment_and_decrement() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();

        assert_eq!(store.increment("foo", 1, &opts()).unwrap(), None);
        store.write_entry("foo", &Entry::new("3"), &opts()).unwrap();
        assert_eq!(store.decrement("foo", 1, &opts()).unwrap(), Some(2));
        assert_eq!(store.increment("foo", 5, &opts()).unwrap(), Some(7));

        store.write_entry("bar", &Entry::new("baz"), &opts()).unwrap();
        assert!(matches!(
            store.increment("bar", 1, &opts()),
            Err(Error::NotNumeric(_))
        ));
    }

    #[test]
    fn test_delete_matched() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();
        for key in ["foo", "fu", "foo/bar", "fu/baz"] {
            store.write_entry(key, &Entry::new("x"), &opts()).unwrap();
        }

        let removed = store.delete_matched(&Regex::new("oo").unwrap(), &opts()).unwrap();
        assert_eq!(removed, 2);
        assert!(store.read_entry("fu", &opts()).unwrap().is_some());
        assert!(store.read_entry("fu/baz", &opts()).unwrap().is_some());
        assert!(store.read_entry("foo/bar", &opts()).unwrap().is_none());
    }

    #[test]
    fn test_cleanup_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();
        let past = SystemTime::now() - Duration::from_secs(1);

        store.write_entry("old", &Entry::with_expires_at("x", past), &opts()).unwrap();
        store.write_entry("new", &Entry::new("y"), &opts()).unwrap();

        assert_eq!(store.cleanup(&opts()).unwrap(), 1);
        assert_eq!(store.entry_files().unwrap().len(), 1);

        store.clear(&opts()).unwrap();
        assert!(store.entry_files().unwrap().is_empty());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), opts()).unwrap();

        fs::write(store.key_path("foo"), b"garbage").unwrap();
        assert!(matches!(
            store.read_entry("foo", &opts()),
            Err(Error::Parse(_))
        ));
    }
}
