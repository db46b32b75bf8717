use crate::domain::property::{PropertyDescriptor, PropertyValue};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

/// Sends property writes to a device, e.g. through the MIoT cloud or a LAN gateway.
#[async_trait]
pub trait DeviceClient: Debug + Send + Sync {
    async fn set_property(&self, did: &str, property: &PropertyDescriptor, value: PropertyValue) -> Result<(), DeviceError>;
}

#[derive(Error, PartialEq, Debug, Clone)]
pub enum DeviceError {
    #[error("device '{did}' rejected the write with code {code}")]
    Rejected { did: String, code: i32 },
    #[error("device '{0}' is unreachable")]
    Unreachable(String),
}
