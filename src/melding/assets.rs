// Caps the number of assets attached to a melding at its asset type's max_assets

use thiserror::Error;
use tracing::info;

use super::model::{Asset, AssetType, Melding};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Melding already has the maximum of {max_assets} assets")]
    MaxAssetsExceeded { max_assets: usize },
    #[error("Asset {external_id} is not attached to this melding")]
    NotFound { external_id: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssetLimiter;

/// Assets are identified by external id alone.
fn position(melding: &Melding, external_id: &str) -> Option<usize> {
    melding
        .assets
        .iter()
        .position(|asset| asset.external_id == external_id)
}

impl AssetLimiter {
    pub fn add_asset(
        &self,
        melding: &mut Melding,
        asset_type: &AssetType,
        external_id: &str,
    ) -> Result<(), AssetError> {
        if position(melding, external_id).is_some() {
            return Ok(());
        }

        if melding.assets.len() >= asset_type.max_assets {
            return Err(AssetError::MaxAssetsExceeded {
                max_assets: asset_type.max_assets,
            });
        }

        melding.assets.push(Asset {
            external_id: external_id.to_string(),
            asset_type_id: asset_type.id,
        });

        info!(
            melding_id = %melding.id,
            external_id = %external_id,
            count = melding.assets.len(),
            max_assets = asset_type.max_assets,
            "Asset added to melding"
        );
        Ok(())
    }

    pub fn remove_asset(&self, melding: &mut Melding, external_id: &str) -> Result<(), AssetError> {
        let index = position(melding, external_id).ok_or_else(|| AssetError::NotFound {
            external_id: external_id.to_string(),
        })?;

        melding.assets.remove(index);
        info!(
            melding_id = %melding.id,
            external_id = %external_id,
            count = melding.assets.len(),
            "Asset removed from melding"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> AssetType {
        AssetType {
            id: 1,
            name: "container".to_string(),
            max_assets: 2,
        }
    }

    #[test]
    fn test_cap_is_enforced_and_freed_by_removal() {
        let limiter = AssetLimiter;
        let asset_type = container();
        let mut melding = Melding::test_instance();

        limiter.add_asset(&mut melding, &asset_type, "container-1").unwrap();
        limiter.add_asset(&mut melding, &asset_type, "container-2").unwrap();
        assert_eq!(melding.assets.len(), 2);

        assert_eq!(
            limiter.add_asset(&mut melding, &asset_type, "container-3"),
            Err(AssetError::MaxAssetsExceeded { max_assets: 2 })
        );
        assert_eq!(melding.assets.len(), 2);

        limiter.remove_asset(&mut melding, "container-1").unwrap();
        limiter.add_asset(&mut melding, &asset_type, "container-3").unwrap();

        let ids: Vec<_> = melding.assets.iter().map(|a| a.external_id.as_str()).collect();
        assert_eq!(ids, vec!["container-2", "container-3"]);
    }

    #[test]
    fn test_removing_unknown_asset_fails() {
        let mut melding = Melding::test_instance();
        assert_eq!(
            AssetLimiter.remove_asset(&mut melding, "container-9"),
            Err(AssetError::NotFound {
                external_id: "container-9".to_string()
            })
        );
    }

    #[test]
    fn test_re_adding_attached_asset_is_a_no_op() {
        let asset_type = container();
        let mut melding = Melding::test_instance();

        AssetLimiter.add_asset(&mut melding, &asset_type, "container-1").unwrap();
        AssetLimiter.add_asset(&mut melding, &asset_type, "container-2").unwrap();
        AssetLimiter.add_asset(&mut melding, &asset_type, "container-1").unwrap();
        assert_eq!(melding.assets.len(), 2);
    }

    #[test]
    fn test_add_and_remove_agree_on_identity() {
        let mut melding = Melding::test_instance();
        let other_type = AssetType {
            id: 2,
            name: "lantaarnpaal".to_string(),
            max_assets: 2,
        };

        AssetLimiter.add_asset(&mut melding, &container(), "asset-1").unwrap();
        AssetLimiter.add_asset(&mut melding, &other_type, "asset-1").unwrap();
        assert_eq!(melding.assets.len(), 1);

        AssetLimiter.remove_asset(&mut melding, "asset-1").unwrap();
        assert!(melding.assets.is_empty());
        assert!(AssetLimiter.remove_asset(&mut melding, "asset-1").is_err());
    }

    #[test]
    fn test_zero_cap_rejects_everything() {
        let asset_type = AssetType {
            max_assets: 0,
            ..container()
        };
        let mut melding = Melding::test_instance();
        assert!(AssetLimiter.add_asset(&mut melding, &asset_type, "container-1").is_err());
    }
}
