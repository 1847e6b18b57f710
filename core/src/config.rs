use serde::{Deserialize, Serialize};

/// Boundaries of the three satisfaction tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Averages strictly below this are `low`.
    pub low_below: f64,
    /// Averages at or above this are `high`.
    pub high_from: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoComplaintConfig {
    /// Description used when a dissatisfied survey carries no comment.
    pub placeholder_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergenSeed {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExperienceFile {
    regular_visit_threshold: u32,
    tiers: TierThresholds,
    auto_complaint: AutoComplaintConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct AllergenCatalogFile {
    allergens: Vec<AllergenSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpConfig {
    pub regular_visit_threshold: u32,
    pub tiers: TierThresholds,
    pub auto_complaint: AutoComplaintConfig,
    pub allergen_seed: Vec<AllergenSeed>,
}

impl ExpConfig {
    /// Load from the data/ directory.
    /// In tests, use ExpConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/experience.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: ExperienceFile = serde_json::from_str(&content)?;

        let allergen_path = format!("{data_dir}/allergens/allergens.json");
        let allergen_content = std::fs::read_to_string(&allergen_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {allergen_path}: {e}"))?;
        let allergen_file: AllergenCatalogFile = serde_json::from_str(&allergen_content)?;

        if file.tiers.low_below > file.tiers.high_from {
            anyhow::bail!(
                "tier thresholds overlap: low_below={} > high_from={}",
                file.tiers.low_below,
                file.tiers.high_from
            );
        }

        Ok(Self {
            regular_visit_threshold: file.regular_visit_threshold,
            tiers: file.tiers,
            auto_complaint: file.auto_complaint,
            allergen_seed: allergen_file.allergens,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    /// The seed catalog is left empty so tests control every allergen row.
    pub fn default_test() -> Self {
        Self {
            regular_visit_threshold: 5,
            tiers: TierThresholds {
                low_below: 3.0,
                high_from: 4.0,
            },
            auto_complaint: AutoComplaintConfig {
                placeholder_description: "customer dissatisfied, no comment provided".into(),
            },
            allergen_seed: Vec::new(),
        }
    }
}
