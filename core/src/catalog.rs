use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::models::MealSlot;

const BUILTIN_MENUS: &str = include_str!("../data/menus.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    /// Calories for the whole serving, including the staple side when `with_rice` is set.
    pub calories: u32,
    #[serde(default)]
    pub breakfast: bool,
    #[serde(default)]
    pub lunch: bool,
    #[serde(default)]
    pub dinner: bool,
    #[serde(default)]
    pub with_rice: bool,
}

impl MenuItem {
    #[must_use]
    pub fn calorie_gap(&self, target: i64) -> i64 {
        (i64::from(self.calories) - target).abs()
    }

    #[must_use]
    pub fn eligible_for(&self, slot: MealSlot) -> bool {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    menus: Vec<MenuItem>,
}

/// Read-only menu list shared by every recommendation request.
#[derive(Debug, Clone, Serialize)]
pub struct MenuCatalog {
    menus: Vec<MenuItem>,
}

impl MenuCatalog {
    pub fn new(menus: Vec<MenuItem>) -> Result<Self> {
        if menus.is_empty() {
            bail!("Menu catalog is empty");
        }
        let mut seen = HashSet::new();
        for menu in &menus {
            if menu.name.trim().is_empty() {
                bail!("Menu name must not be empty");
            }
            if menu.calories == 0 {
                bail!("Menu '{}' must have calories greater than 0", menu.name);
            }
            if !seen.insert(menu.name.as_str()) {
                bail!("Duplicate menu name '{}'", menu.name);
            }
        }
        Ok(Self { menus })
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_MENUS).context("Built-in menu catalog is invalid")
    }

    /// Parse `{"menus": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json).context("Failed to parse menu JSON")?;
        Self::new(file.menus)
    }

    /// Parse CSV with header `name,calories,breakfast,lunch,dinner,with_rice`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let menus = rdr
            .deserialize()
            .enumerate()
            .map(|(i, row)| row.with_context(|| format!("Invalid menu row {}", i + 2)))
            .collect::<Result<Vec<MenuItem>>>()?;
        Self::new(menus)
    }

    /// Load from a `.csv` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open menu file: {}", path.display()))?;
            Self::from_csv_reader(file)
        } else {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read menu file: {}", path.display()))?;
            Self::from_json_str(&json)
        }
    }

    #[must_use]
    pub fn menus(&self) -> &[MenuItem] {
        &self.menus
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&MenuItem> {
        self.menus.iter().find(|m| m.name == name)
    }
}
