use crate::device::client::{DeviceClient, DeviceError};
use crate::domain::property::{PropertyDescriptor, PropertyKey, PropertyValue};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;

/// A device client that only records the writes it receives. Writes to properties registered with
/// [`SimulatedDeviceClient::fail_property`] are answered with that error instead.
#[derive(Debug, Default)]
pub struct SimulatedDeviceClient {
    writes: Mutex<Vec<RecordedWrite>>,
    failures: HashMap<String, DeviceError>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RecordedWrite {
    pub did: String,
    pub key: PropertyKey,
    pub name: String,
    pub value: PropertyValue,
}

impl SimulatedDeviceClient {
    pub fn new() -> Self {
        SimulatedDeviceClient::default()
    }

    pub fn fail_property(mut self, name: impl Into<String>, error: DeviceError) -> Self {
        self.failures.insert(name.into(), error);
        self
    }

    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().await.clone()
    }

    pub async fn written_values(&self) -> Vec<(String, PropertyValue)> {
        self.writes.lock().await.iter().map(|write| (write.name.clone(), write.value.clone())).collect()
    }
}

#[async_trait]
impl DeviceClient for SimulatedDeviceClient {
    async fn set_property(&self, did: &str, property: &PropertyDescriptor, value: PropertyValue) -> Result<(), DeviceError> {
        self.writes.lock().await.push(RecordedWrite {
            did: did.to_string(),
            key: property.key(),
            name: property.name().to_string(),
            value: value.clone(),
        });

        if let Some(error) = self.failures.get(property.name()) {
            return Err(error.clone());
        }

        info!(did, property = property.name(), "📝 Simulated write of {} to {}", value, property.key());
        Ok(())
    }
}
