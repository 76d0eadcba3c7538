use std::fs;
use std::path::Path;

use anyhow::Context;
use poisson_core::{Geometry, SolverConfig};
use serde::{Deserialize, Serialize};

/// Everything one run needs: where the sources are and how to relax.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub geometry: Geometry,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl RunConfig {
    pub fn load(path: &Path) -> anyhow::Result<RunConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }
}
