use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tally_core::RuleSet;

use crate::store::StoreError;

/// Raw persisted shape: category name → keywords, in file order.
pub type RawRules = IndexMap<String, Vec<String>>;

/// Where a [`crate::RuleStore`] keeps its rules between sessions.
pub trait RuleBackend {
    /// `Ok(None)` means nothing has been persisted yet.
    fn read(&self) -> Result<Option<RawRules>, StoreError>;

    /// Replaces the persisted rules as a whole. On error the previous
    /// persisted state must still be intact.
    fn write(&self, rules: &RuleSet) -> Result<(), StoreError>;
}

/// JSON object on disk, e.g. `{"Uncategorized": [], "Food": ["Lidl"]}`.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

}

impl RuleBackend for JsonFileBackend {
    fn read(&self) -> Result<Option<RawRules>, StoreError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn write(&self, rules: &RuleSet) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(rules).map_err(StoreError::Encode)?;
        atomic_write(&self.path, &json).map_err(|source| StoreError::Persist {
            path: self.path.clone(),
            source,
        })
    }
}

/// Writes to a sibling temp file, syncs, then renames over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let tmp = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
    let result = (|| -> io::Result<()> {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(data)?;
        f.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
        return result;
    }

    // Flush the directory entry so the rename itself survives a crash.
    if let Ok(dir_file) = fs::File::open(&dir) {
        let _ = dir_file.sync_all();
    }
    Ok(())
}

/// Keeps rules in memory only. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: RefCell<Option<RuleSet>>,
    fail_writes: Cell<bool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn stored(&self) -> Option<RuleSet> {
        self.stored.borrow().clone()
    }
}

impl RuleBackend for MemoryBackend {
    fn read(&self) -> Result<Option<RawRules>, StoreError> {
        Ok(self.stored.borrow().as_ref().map(|rules| {
            rules
                .iter()
                .map(|(name, keywords)| (name.to_string(), keywords.to_vec()))
                .collect()
        }))
    }

    fn write(&self, rules: &RuleSet) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Persist {
                path: PathBuf::from("<memory>"),
                source: io::Error::other("write failure injected"),
            });
        }
        *self.stored.borrow_mut() = Some(rules.clone());
        Ok(())
    }
}

impl<B: RuleBackend + ?Sized> RuleBackend for &B {
    fn read(&self) -> Result<Option<RawRules>, StoreError> {
        (**self).read()
    }

    fn write(&self, rules: &RuleSet) -> Result<(), StoreError> {
        (**self).write(rules)
    }
}
