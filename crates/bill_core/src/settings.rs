use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const SETTINGS_FILE: &str = "classifier.toml";
pub const CHAMBERS_FILE: &str = "chambers.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Windows {
    pub recent_activity_days: i64,
    pub stale_after_days: i64,
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            recent_activity_days: 14,
            stale_after_days: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendingRules {
    pub velocity_days: i64,
    pub velocity_min_actions: usize,
    pub sponsorship_days: i64,
    pub sponsor_ratio: f64,
    pub vote_days: i64,
    pub close_vote_margin: u32,
}

impl Default for TrendingRules {
    fn default() -> Self {
        Self {
            velocity_days: 14,
            velocity_min_actions: 2,
            sponsorship_days: 5,
            sponsor_ratio: 0.6,
            vote_days: 5,
            close_vote_margin: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub windows: Windows,
    pub trending: TrendingRules,
}

impl Settings {
    pub fn from_toml(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("windows.recent_activity_days", self.windows.recent_activity_days),
            ("windows.stale_after_days", self.windows.stale_after_days),
            ("trending.velocity_days", self.trending.velocity_days),
            ("trending.sponsorship_days", self.trending.sponsorship_days),
            ("trending.vote_days", self.trending.vote_days),
        ];
        for (name, days) in windows {
            if days <= 0 {
                bail!("{name} must be positive, got {days}");
            }
        }
        let ratio = self.trending.sponsor_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            bail!("trending.sponsor_ratio must be in (0, 1], got {ratio}");
        }
        if self.trending.velocity_min_actions < 1 {
            bail!("trending.velocity_min_actions must be at least 1");
        }
        Ok(())
    }

    /// Loads `classifier.toml` from `path`. Entries in an optional
    /// `chambers.yaml` override or extend the built-in chamber table.
    pub fn load_from_dir(path: &Path) -> Result<(Self, ChamberTable)> {
        let settings_path = path.join(SETTINGS_FILE);
        let settings_str = fs::read_to_string(&settings_path)
            .with_context(|| format!("reading {}", settings_path.display()))?;
        let settings = Self::from_toml(&settings_str)?;

        let chambers_path = path.join(CHAMBERS_FILE);
        let mut chambers = ChamberTable::default();
        if chambers_path.exists() {
            let chambers_str = fs::read_to_string(&chambers_path)
                .with_context(|| format!("reading {}", chambers_path.display()))?;
            chambers.extend(ChamberTable::from_yaml(&chambers_str)?);
        }

        Ok((settings, chambers))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChamberSizes {
    Unicameral { seats: u32 },
    Bicameral { upper: u32, lower: u32 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ChamberEntry {
    Bicameral { upper: u32, lower: u32 },
    Unicameral { seats: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChamberTable {
    entries: HashMap<String, ChamberSizes>,
}

impl ChamberTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, jurisdiction: &str, sizes: ChamberSizes) {
        self.entries.insert(jurisdiction.to_lowercase(), sizes);
    }

    pub fn with(mut self, jurisdiction: &str, sizes: ChamberSizes) -> Self {
        self.insert(jurisdiction, sizes);
        self
    }

    /// Copies every entry of `other` over this table.
    pub fn extend(&mut self, other: ChamberTable) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, jurisdiction: &str) -> Option<ChamberSizes> {
        self.entries.get(&jurisdiction.trim().to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, ChamberEntry> = serde_yaml::from_str(raw)?;
        let mut table = Self::empty();
        for (name, entry) in parsed {
            let sizes = match entry {
                ChamberEntry::Unicameral { seats } => {
                    if seats == 0 {
                        return Err(anyhow!("{name}: unicameral seat count must be positive"));
                    }
                    ChamberSizes::Unicameral { seats }
                }
                ChamberEntry::Bicameral { upper, lower } => {
                    if upper == 0 || lower == 0 {
                        return Err(anyhow!("{name}: chamber seat counts must be positive"));
                    }
                    ChamberSizes::Bicameral { upper, lower }
                }
            };
            table.insert(&name, sizes);
        }
        Ok(table)
    }
}

// (jurisdiction, upper, lower); a zero lower count marks a unicameral body.
const DEFAULT_CHAMBERS: &[(&str, u32, u32)] = &[
    ("Alabama", 35, 105),
    ("Alaska", 20, 40),
    ("Arizona", 30, 60),
    ("Arkansas", 35, 100),
    ("California", 40, 80),
    ("Colorado", 35, 65),
    ("Connecticut", 36, 151),
    ("Delaware", 21, 41),
    ("District of Columbia", 13, 0),
    ("Florida", 40, 120),
    ("Georgia", 56, 180),
    ("Hawaii", 25, 51),
    ("Idaho", 35, 70),
    ("Illinois", 59, 118),
    ("Indiana", 50, 100),
    ("Iowa", 50, 100),
    ("Kansas", 40, 125),
    ("Kentucky", 38, 100),
    ("Louisiana", 39, 105),
    ("Maine", 35, 151),
    ("Maryland", 47, 141),
    ("Massachusetts", 40, 160),
    ("Michigan", 38, 110),
    ("Minnesota", 67, 134),
    ("Mississippi", 52, 122),
    ("Missouri", 34, 163),
    ("Montana", 50, 100),
    ("Nebraska", 49, 0),
    ("Nevada", 21, 42),
    ("New Hampshire", 24, 400),
    ("New Jersey", 40, 80),
    ("New Mexico", 42, 70),
    ("New York", 63, 150),
    ("North Carolina", 50, 120),
    ("North Dakota", 47, 94),
    ("Ohio", 33, 99),
    ("Oklahoma", 48, 101),
    ("Oregon", 30, 60),
    ("Pennsylvania", 50, 203),
    ("Puerto Rico", 27, 51),
    ("Rhode Island", 38, 75),
    ("South Carolina", 46, 124),
    ("South Dakota", 35, 70),
    ("Tennessee", 33, 99),
    ("Texas", 31, 150),
    ("Utah", 29, 75),
    ("Vermont", 30, 150),
    ("Virginia", 40, 100),
    ("Washington", 49, 98),
    ("West Virginia", 34, 100),
    ("Wisconsin", 33, 99),
    ("Wyoming", 31, 62),
];

impl Default for ChamberTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for &(name, upper, lower) in DEFAULT_CHAMBERS {
            let sizes = if lower == 0 {
                ChamberSizes::Unicameral { seats: upper }
            } else {
                ChamberSizes::Bicameral { upper, lower }
            };
            table.insert(name, sizes);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [trending]
            sponsor_ratio = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(settings.trending.sponsor_ratio, 0.5);
        assert_eq!(settings.trending.close_vote_margin, 3);
        assert_eq!(settings.windows, Windows::default());
    }

    #[test]
    fn rejects_bad_thresholds() {
        assert!(Settings::from_toml("[windows]\nrecent_activity_days = 0").is_err());
        assert!(Settings::from_toml("[trending]\nsponsor_ratio = 1.5").is_err());
        assert!(Settings::from_toml("[trending]\nvelocity_min_actions = 0").is_err());
        assert!(Settings::from_toml("[trending]\nvelocity_min_actions = 1").is_ok());
    }

    #[test]
    fn default_table_lookup_is_case_insensitive() {
        let table = ChamberTable::default();
        assert_eq!(
            table.get("nebraska"),
            Some(ChamberSizes::Unicameral { seats: 49 })
        );
        assert_eq!(
            table.get(" California "),
            Some(ChamberSizes::Bicameral { upper: 40, lower: 80 })
        );
        assert_eq!(table.get("Atlantis"), None);
        assert_eq!(table.len(), 52);
    }

    #[test]
    fn yaml_table_parses_both_shapes() {
        let table = ChamberTable::from_yaml(
            "Springfield:\n  seats: 80\nShelbyville:\n  upper: 10\n  lower: 20\n",
        )
        .unwrap();
        assert_eq!(
            table.get("springfield"),
            Some(ChamberSizes::Unicameral { seats: 80 })
        );
        assert_eq!(
            table.get("Shelbyville"),
            Some(ChamberSizes::Bicameral { upper: 10, lower: 20 })
        );
        assert!(ChamberTable::from_yaml("Nowhere:\n  seats: 0\n").is_err());
    }

    #[test]
    fn loads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[windows]\nstale_after_days = 90\n",
        )
        .unwrap();
        let (settings, chambers) = Settings::load_from_dir(dir.path()).unwrap();
        assert_eq!(settings.windows.stale_after_days, 90);
        assert_eq!(chambers, ChamberTable::default());

        fs::write(
            dir.path().join(CHAMBERS_FILE),
            "Springfield:\n  seats: 80\nCalifornia:\n  upper: 41\n  lower: 81\n",
        )
        .unwrap();
        let (_, chambers) = Settings::load_from_dir(dir.path()).unwrap();
        assert_eq!(chambers.len(), 53);
        assert_eq!(
            chambers.get("springfield"),
            Some(ChamberSizes::Unicameral { seats: 80 })
        );
        assert_eq!(
            chambers.get("california"),
            Some(ChamberSizes::Bicameral { upper: 41, lower: 81 })
        );
        assert_eq!(
            chambers.get("florida"),
            Some(ChamberSizes::Bicameral { upper: 40, lower: 120 })
        );
    }

    #[test]
    fn missing_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load_from_dir(dir.path()).is_err());
    }
}
