// Melding domain: the entity, its capability token, location, assets and classification

pub mod assets;
pub mod classification;
pub mod location;
pub mod model;
pub mod token;

use thiserror::Error;

pub use assets::{AssetError, AssetLimiter};
pub use classification::{Catalog, CatalogError, Classifier, ReclassificationEffects, Reclassifier};
pub use location::{GeoJson, Geometry};
pub use model::{
    Answer, AnswerValue, Asset, AssetType, Attachment, Classification, ContactInfo, Form, Melding,
    MeldingId, Question,
};
pub use token::{PublicIdGenerator, SubmissionToken, TokenError, TokenGenerator};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Melding text must not be empty")]
    EmptyText,
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),
}
