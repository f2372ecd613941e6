use anyhow::{Context, Result, bail};
use bapsang_core::catalog::MenuCatalog;
use bapsang_core::energy::{BmrCoefficients, EnergySettings};
use directories::ProjectDirs;
use std::path::PathBuf;

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    /// Menu catalog file; the built-in catalog is used when unset.
    pub menu_file: Option<PathBuf>,
    /// Explicit log filter; callers pick their own default when unset.
    pub log_level: Option<String>,
    pub energy: EnergySettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let proj_dirs =
            ProjectDirs::from("", "", "bapsang").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Build a config from `lookup`, which returns the value of an environment variable.
    fn from_lookup(data_dir: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = var("BAPSANG_DB_PATH")
            .map_or_else(|| data_dir.join("bapsang.db"), PathBuf::from);
        let menu_file = var("BAPSANG_MENU_FILE").map(PathBuf::from);
        let log_level = var("BAPSANG_LOG");

        let mut energy = EnergySettings::default();
        if let Some(raw) = var("BMR_CONSTANTS_MALE") {
            energy.male = raw
                .parse::<BmrCoefficients>()
                .context("BMR_CONSTANTS_MALE is invalid")?;
        }
        if let Some(raw) = var("BMR_CONSTANTS_FEMALE") {
            energy.female = raw
                .parse::<BmrCoefficients>()
                .context("BMR_CONSTANTS_FEMALE is invalid")?;
        }
        if let Some(raw) = var("ACTIVITY_LEVEL") {
            let level: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("ACTIVITY_LEVEL must be a number, got '{raw}'"))?;
            if !level.is_finite() || level <= 0.0 {
                bail!("ACTIVITY_LEVEL must be greater than 0, got {level}");
            }
            energy.activity_multiplier = level;
        }

        Ok(Config {
            db_path,
            data_dir,
            menu_file,
            log_level,
            energy,
        })
    }

    pub fn load_catalog(&self) -> Result<MenuCatalog> {
        match &self.menu_file {
            Some(path) => {
                let catalog = MenuCatalog::load(path)?;
                tracing::info!(path = %path.display(), menus = catalog.menus().len(), "Loaded menu catalog");
                Ok(catalog)
            }
            None => MenuCatalog::builtin(),
        }
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)` where `newly_created` is true when a
    /// fresh key was just generated (first run).
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        tracing::info!(path = %path.display(), "Generated new admin API key");
        Ok((key, true))
    }
}
