use crate::domain::property::{PropertyDescriptor, PropertyKey};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

const GROUP_PREFIX: &str = "group.";
const LIGHT_PROPERTIES: [&str; 5] = ["on", "brightness", "color-temperature", "color", "mode"];

/// A device as described by the device-description layer: identity plus the properties of its
/// light service.
#[derive(PartialEq, Debug, Deserialize)]
pub struct DeviceDescription {
    pub did: String,
    pub name: String,
    pub model: String,
    pub properties: Vec<PropertyDescriptor>,
}

impl DeviceDescription {
    /// Parses a description and checks that it describes a light: at least one light property and
    /// no two properties sharing a `siid.piid` key.
    pub fn from_json(json: &str) -> Result<Self, DescriptionError> {
        let description = serde_json::from_str::<DeviceDescription>(json)?;
        description.validate()?;
        Ok(description)
    }

    pub fn is_group(&self) -> bool {
        self.did.starts_with(GROUP_PREFIX)
    }

    fn validate(&self) -> Result<(), DescriptionError> {
        let mut keys = HashSet::new();
        if let Some(key) = self.properties.iter().map(PropertyDescriptor::key).find(|key| !keys.insert(*key)) {
            return Err(DescriptionError::DuplicateProperty { did: self.did.clone(), key });
        }

        if !self.properties.iter().any(|property| LIGHT_PROPERTIES.contains(&property.name())) {
            return Err(DescriptionError::NotALight { did: self.did.clone() });
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("device '{did}' declares property {key} more than once")]
    DuplicateProperty { did: String, key: PropertyKey },
    #[error("device '{did}' has no light properties")]
    NotALight { did: String },
}
