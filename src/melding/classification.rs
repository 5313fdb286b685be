// Classification catalog, text classifier and reclassification rules

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::model::{AssetType, Classification, Form, Melding};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("Melding {melding_id} has no classification")]
    Unclassified { melding_id: u64 },
    #[error("Invalid catalog: {reason}")]
    Invalid { reason: String },
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Classifications, asset types and forms the lifecycle consults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub asset_types: Vec<AssetType>,
    #[serde(default)]
    pub forms: Vec<Form>,
}

impl Catalog {
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(raw)?;
        catalog.check_references()?;
        Ok(catalog)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let catalog = Self::from_toml_str(&raw)?;
        info!(
            path = %path.as_ref().display(),
            classifications = catalog.classifications.len(),
            asset_types = catalog.asset_types.len(),
            forms = catalog.forms.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    fn check_references(&self) -> Result<(), CatalogError> {
        fn unique(entity: &str, ids: impl Iterator<Item = u64>) -> Result<(), CatalogError> {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    return Err(CatalogError::Invalid {
                        reason: format!("duplicate {entity} id {id}"),
                    });
                }
            }
            Ok(())
        }

        unique("classification", self.classifications.iter().map(|c| c.id))?;
        unique("asset type", self.asset_types.iter().map(|a| a.id))?;
        unique("form", self.forms.iter().map(|f| f.id))?;
        unique("form classification", self.forms.iter().map(|f| f.classification_id))?;

        for classification in &self.classifications {
            if let Some(asset_type_id) = classification.asset_type_id {
                self.asset_type(asset_type_id).map_err(|_| CatalogError::Invalid {
                    reason: format!(
                        "classification {} refers to unknown asset type {asset_type_id}",
                        classification.id
                    ),
                })?;
            }
        }
        for form in &self.forms {
            self.classification(form.classification_id).map_err(|_| CatalogError::Invalid {
                reason: format!(
                    "form {} refers to unknown classification {}",
                    form.id, form.classification_id
                ),
            })?;
        }
        Ok(())
    }

    pub fn classification(&self, id: u64) -> Result<&Classification, CatalogError> {
        self.classifications
            .iter()
            .find(|c| c.id == id)
            .ok_or(CatalogError::NotFound {
                entity: "classification",
                id,
            })
    }

    pub fn asset_type(&self, id: u64) -> Result<&AssetType, CatalogError> {
        self.asset_types
            .iter()
            .find(|a| a.id == id)
            .ok_or(CatalogError::NotFound { entity: "asset type", id })
    }

    pub fn form_for_classification(&self, classification_id: u64) -> Option<&Form> {
        self.forms.iter().find(|f| f.classification_id == classification_id)
    }

    /// Form that applies to the melding right now, if any.
    pub fn form_for_melding(&self, melding: &Melding) -> Option<&Form> {
        melding
            .classification_id
            .and_then(|id| self.form_for_classification(id))
    }

    pub fn asset_type_for_melding(&self, melding: &Melding) -> Result<&AssetType, CatalogError> {
        let classification_id = melding
            .classification_id
            .ok_or(CatalogError::Unclassified { melding_id: melding.id })?;
        let classification = self.classification(classification_id)?;
        let asset_type_id = classification.asset_type_id.ok_or(CatalogError::NotFound {
            entity: "asset type for classification",
            id: classification_id,
        })?;
        self.asset_type(asset_type_id)
    }
}

/// Maps melding text onto a classification by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl Classifier {
    pub fn classify<'c>(&self, catalog: &'c Catalog, text: &str) -> Option<&'c Classification> {
        let needle = text.trim();
        let found = catalog
            .classifications
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(needle));
        debug!(text = %needle, classification = ?found.map(|c| c.id), "Classified melding text");
        found
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclassificationEffects {
    pub answers_purged: usize,
    pub assets_removed: usize,
}

/// Keeps a melding consistent when its classification changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reclassifier;

impl Reclassifier {
    pub fn reclassify(
        &self,
        melding: &mut Melding,
        current: Option<&Classification>,
        new: Option<&Classification>,
    ) -> ReclassificationEffects {
        let mut effects = ReclassificationEffects::default();

        if current.map(|c| c.id) != new.map(|c| c.id) {
            effects.answers_purged = melding.answers.len();
            melding.answers.clear();
        }

        let current_asset_type = current.and_then(|c| c.asset_type_id);
        let new_asset_type = new.and_then(|c| c.asset_type_id);
        if current_asset_type != new_asset_type {
            effects.assets_removed = melding.assets.len();
            melding.assets.clear();
        }

        melding.classification_id = new.map(|c| c.id);

        info!(
            melding_id = %melding.id,
            from = ?current.map(|c| c.id),
            to = ?new.map(|c| c.id),
            answers_purged = effects.answers_purged,
            assets_removed = effects.assets_removed,
            "Melding reclassified"
        );
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melding::{Answer, AnswerValue, Asset, GeoJson};

    const CATALOG: &str = r#"
[[asset_types]]
id = 1
name = "container"
max_assets = 2

[[classifications]]
id = 1
name = "afval"
asset_type_id = 1

[[classifications]]
id = 2
name = "straatverlichting"

[[forms]]
id = 1
classification_id = 2
title = "Straatverlichting"

[[forms.questions]]
id = 10
text = "Brandt de lamp helemaal niet?"
required = true
"#;

    #[test]
    fn test_catalog_parses_and_resolves() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.classifications.len(), 2);
        assert_eq!(catalog.form_for_classification(2).unwrap().questions.len(), 1);
        assert!(catalog.form_for_classification(1).is_none());
        assert!(matches!(
            catalog.classification(99),
            Err(CatalogError::NotFound { entity: "classification", id: 99 })
        ));
    }

    #[test]
    fn test_catalog_rejects_dangling_asset_type() {
        let raw = "[[classifications]]\nid = 1\nname = \"afval\"\nasset_type_id = 7\n";
        assert!(matches!(Catalog::from_toml_str(raw), Err(CatalogError::Invalid { .. })));
    }

    #[test]
    fn test_classifier_matches_name_case_insensitively() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(Classifier.classify(&catalog, " Afval ").map(|c| c.id), Some(1));
        assert!(Classifier.classify(&catalog, "De lamp is kapot").is_none());
    }

    #[test]
    fn test_reclassification_purges_answers_and_assets() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let afval = catalog.classification(1).unwrap();
        let verlichting = catalog.classification(2).unwrap();

        let mut melding = Melding::test_instance();
        melding.classification_id = Some(1);
        melding.geo_location = Some(GeoJson::point(52.368, 4.897));
        melding.answers.push(Answer {
            question_id: 10,
            value: AnswerValue::Text("ja".to_string()),
        });
        melding.assets.push(Asset {
            external_id: "container-1".to_string(),
            asset_type_id: 1,
        });

        let effects = Reclassifier.reclassify(&mut melding, Some(afval), Some(verlichting));

        assert_eq!(effects.answers_purged, 1);
        assert_eq!(effects.assets_removed, 1);
        assert!(melding.geo_location.is_some());
        assert_eq!(melding.classification_id, Some(2));
    }

    #[test]
    fn test_same_classification_keeps_answers_assets_and_location() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let afval = catalog.classification(1).unwrap();

        let mut melding = Melding::test_instance();
        melding.classification_id = Some(1);
        melding.geo_location = Some(GeoJson::point(52.368, 4.897));
        melding.answers.push(Answer {
            question_id: 10,
            value: AnswerValue::Text("ja".to_string()),
        });
        melding.assets.push(Asset {
            external_id: "container-1".to_string(),
            asset_type_id: 1,
        });
        let before = melding.clone();

        let effects = Reclassifier.reclassify(&mut melding, Some(afval), Some(afval));

        assert_eq!(effects, ReclassificationEffects::default());
        assert_eq!(melding, before);
    }
}
