use crate::config::atomic_rename;
use crate::model::{Action, PersistedRecord, PetState, Rules, STORAGE_KEY};
use crate::sim::{catch_up, CatchupSummary};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("could not access `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("`{key}` does not hold a valid record: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String-keyed, string-valued local storage.
pub(crate) trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory.
pub(crate) struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp, value).map_err(io_err)?;
        atomic_rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }
}

pub(crate) fn load_record(
    store: &impl KeyValueStore,
) -> Result<Option<PersistedRecord>, StoreError> {
    let Some(raw) = store.get(STORAGE_KEY)? else {
        return Ok(None);
    };
    let record = serde_json::from_str::<PersistedRecord>(&raw).map_err(|source| {
        StoreError::Parse {
            key: STORAGE_KEY.to_string(),
            source,
        }
    })?;
    Ok(Some(record))
}

pub(crate) fn save_record(
    store: &mut impl KeyValueStore,
    state: &PetState,
    now_ms: i64,
) -> Result<(), StoreError> {
    let record = PersistedRecord {
        state: state.clone(),
        timestamp: now_ms,
    };
    let data = serde_json::to_string(&record).map_err(|source| StoreError::Parse {
        key: STORAGE_KEY.to_string(),
        source,
    })?;
    store.set(STORAGE_KEY, &data)
}

/// Restores the saved pet with offline decay applied, or makes a fresh one.
/// Never fails: a record that cannot be read is logged and replaced.
///
/// A pet saved in the middle of eating or playing comes back Idle. Its
/// completion timer died with the previous session, so the stat stays
/// where it was.
pub(crate) fn load_or_init(
    store: &impl KeyValueStore,
    now_ms: i64,
    rules: &Rules,
    fresh_name: &str,
) -> (PetState, Option<CatchupSummary>) {
    match load_record(store) {
        Ok(Some(record)) => {
            let mut state = record.state;
            if matches!(state.action, Action::Eat | Action::Play) {
                log::info!("{} was interrupted, back to idle", state.action.label());
                state.action = Action::Idle;
            }
            let summary = catch_up(&mut state, record.timestamp, now_ms, rules);
            (state, Some(summary))
        }
        Ok(None) => {
            log::info!("no saved pet found, hatching {fresh_name}");
            (PetState::new(fresh_name), None)
        }
        Err(e) => {
            log::warn!("failed to load saved state, starting fresh: {e}");
            (PetState::new(fresh_name), None)
        }
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryStore;
