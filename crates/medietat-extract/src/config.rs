//! Declarative source configuration. Sources whose pages yield to plain CSS
//! selectors are described in `sources.yaml` instead of code.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::SourceMeta;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSelectors {
    pub container: Option<String>,
    pub item: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    pub base_url: String,
    pub facility_name: String,
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default)]
    pub needs_rendering: bool,
    #[serde(default)]
    pub wait_selector: Option<String>,
    /// Links on the page are already absolute and must not be joined against
    /// the base URL.
    #[serde(default)]
    pub link_is_absolute: bool,
    #[serde(default)]
    pub selectors: SourceSelectors,
}

fn default_city() -> String {
    "Gdańsk".to_string()
}

impl SourceConfig {
    pub fn meta(&self) -> SourceMeta {
        SourceMeta {
            source_id: self.source_id.clone(),
            base_url: self.base_url.clone(),
            facility_name: self.facility_name.clone(),
            city: self.city.clone(),
            needs_rendering: self.needs_rendering,
            wait_selector: self.wait_selector.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    sources: Vec<SourceConfig>,
}

pub fn load_source_configs(path: impl AsRef<Path>) -> Result<Vec<SourceConfig>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: SourcesFile =
        serde_yaml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(file.sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn yaml_source_file_parses_with_defaults() {
        let yaml = r#"
sources:
  - source_id: przychodnia_przykladowa
    base_url: "https://example-przychodnia.pl/kariera"
    facility_name: "Przychodnia Przykładowa"
    selectors:
      item: ".job-item"
      title: ".job-item h3"
      link: ".job-item a"
  - source_id: szpital_miejski
    base_url: "https://szpital-miejski.example/oferty"
    facility_name: "Szpital Miejski"
    city: "Gdynia"
    needs_rendering: true
    wait_selector: ".offers"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let configs = load_source_configs(file.path()).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].city, "Gdańsk");
        assert!(!configs[0].needs_rendering);
        assert_eq!(configs[0].selectors.item.as_deref(), Some(".job-item"));
        assert!(configs[1].needs_rendering);
        assert_eq!(configs[1].wait_selector.as_deref(), Some(".offers"));
    }
}
