//! File-backed string preferences.
//!
//! Stored as a flat TOML table of string values:
//!
//! ```toml
//! ISF = "50"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use eyre::WrapErr;
use exloop_traits::{BoxError, PreferenceStore};

use crate::atomic::write_atomic;
use crate::error::Result;

#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferenceStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("reading preferences {}", path.display()))?;
            toml::from_str::<BTreeMap<String, String>>(&text)
                .wrap_err_with(|| format!("parsing preferences {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> std::result::Result<(), BoxError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| std::io::Error::other("preferences lock poisoned"))?;
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        let text = toml::to_string(&next)?;
        write_atomic(&self.path, text.as_bytes())?;
        *values = next;
        Ok(())
    }
}
