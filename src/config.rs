use crate::model::DEFAULT_NAME;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Settings {
    /// Only used when hatching a new pet.
    pub(crate) pet_name: String,
    pub(crate) sound_enabled: bool,
    pub(crate) fps_cap: u32,
    /// Directory with `<asset>.txt` sprite overrides.
    pub(crate) assets_dir: Option<PathBuf>,
    /// Fixed seed for image variants; random when absent.
    pub(crate) seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pet_name: DEFAULT_NAME.to_string(),
            sound_enabled: true,
            fps_cap: 20,
            assets_dir: None,
            seed: None,
        }
    }
}

pub(crate) struct Paths {
    pub(crate) data_dir: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "beannie-tchi", "Beannie-tchi")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data directory {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("beannie-tchi.log"),
        data_dir: dir,
    })
}

/// Reads settings, writing the defaults out on first run so they can be edited.
pub(crate) fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => log::warn!("ignoring malformed {}: {e}", path.display()),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let defaults = Settings::default();
            if let Err(e) = save_settings_atomic(path, &defaults) {
                log::warn!("could not write default settings: {e:#}");
            }
            return defaults;
        }
        Err(e) => log::warn!("could not read {}: {e}", path.display()),
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    // rename replaces the target on unix; windows needs it gone first
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
}

/// Logs go to a file: the terminal belongs to the pet while the app runs.
/// `RUST_LOG` overrides the default `info` filter.
pub(crate) fn init_logging(log_path: &Path) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("could not open log file {}", log_path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}
