//! Maps source ids to extractors. Declarative configs take precedence, so a
//! bespoke site can be overridden from sources.yaml without a code change.

use crate::generic::ConfigExtractor;
use crate::sites::{
    CopernicusExtractor, OipipGdanskExtractor, SzpitalePomorskieExtractor, UckExtractor,
};
use crate::{ExtractError, Extractor, SourceConfig};

const BUILTIN_SOURCE_IDS: &[&str] = &["oipip_gdansk", "szpitalepomorskie", "copernicus", "uck"];

pub fn builtin_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(OipipGdanskExtractor::new()),
        Box::new(SzpitalePomorskieExtractor::new()),
        Box::new(CopernicusExtractor::new()),
        Box::new(UckExtractor::new()),
    ]
}

pub fn extractor_for_source(
    source_id: &str,
    configs: &[SourceConfig],
) -> Result<Box<dyn Extractor>, ExtractError> {
    if let Some(config) = configs.iter().find(|c| c.source_id == source_id) {
        return Ok(Box::new(ConfigExtractor::new(config.clone())));
    }
    match source_id {
        "oipip_gdansk" => Ok(Box::new(OipipGdanskExtractor::new())),
        "szpitalepomorskie" => Ok(Box::new(SzpitalePomorskieExtractor::new())),
        "copernicus" => Ok(Box::new(CopernicusExtractor::new())),
        "uck" => Ok(Box::new(UckExtractor::new())),
        other => Err(ExtractError::UnknownSource(other.to_string())),
    }
}

/// All refreshable source ids: configured sources first, then the bespoke
/// sites not shadowed by a config.
pub fn source_ids(configs: &[SourceConfig]) -> Vec<String> {
    let mut ids: Vec<String> = configs.iter().map(|c| c.source_id.clone()).collect();
    for builtin in BUILTIN_SOURCE_IDS {
        if !ids.iter().any(|id| id == builtin) {
            ids.push((*builtin).to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSelectors;

    fn sample_config(source_id: &str) -> SourceConfig {
        SourceConfig {
            source_id: source_id.to_string(),
            base_url: "https://example.org/praca".to_string(),
            facility_name: "Przychodnia Przykładowa".to_string(),
            city: "Gdańsk".to_string(),
            needs_rendering: false,
            wait_selector: None,
            link_is_absolute: false,
            selectors: SourceSelectors::default(),
        }
    }

    #[test]
    fn configs_shadow_builtin_sites() {
        let configs = vec![sample_config("uck")];
        let extractor = extractor_for_source("uck", &configs).unwrap();
        assert_eq!(extractor.source().facility_name, "Przychodnia Przykładowa");
    }

    #[test]
    fn unknown_source_is_an_error() {
        let err = extractor_for_source("nigdzie", &[]).err().unwrap();
        assert!(matches!(err, ExtractError::UnknownSource(id) if id == "nigdzie"));
    }

    #[test]
    fn source_ids_merge_configs_and_builtins_without_duplicates() {
        let configs = vec![sample_config("przychodnia"), sample_config("uck")];
        let ids = source_ids(&configs);
        assert_eq!(
            ids,
            vec!["przychodnia", "uck", "oipip_gdansk", "szpitalepomorskie", "copernicus"]
        );
    }
}
