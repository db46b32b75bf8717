use crate::device::client::DeviceClient;
use crate::device::description::DeviceDescription;
use crate::domain::color::Rgb;
use crate::domain::property::{PropertyDescriptor, PropertyKey, PropertyValue};
use crate::light::capability::{CapabilityModel, ColorMode};
use crate::light::coordinator::{PropertyWriter, WriteError, WriteIntent, WriteMode, apply_turn_off, apply_write};
use crate::light::resolver::{MalformedDescriptor, ResolvedLight, resolve};
use crate::light::translator::{describe_mode, power_state, to_normalized_brightness, to_rgb_triple};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const GROUP_ICON: &str = "mdi:lightbulb-group";

/// A light backed by the properties of one device.
#[derive(Debug)]
pub struct LightEntity<C: DeviceClient + ?Sized> {
    entity_id: String,
    name: String,
    icon: Option<&'static str>,
    write_mode: WriteMode,
    properties: Vec<Arc<PropertyDescriptor>>,
    resolved: ResolvedLight,
    store: PropertyStore<C>,
}

impl<C: DeviceClient + ?Sized> LightEntity<C> {
    #[instrument(skip_all, fields(did = %description.did))]
    pub fn new(description: &DeviceDescription, client: Arc<C>, write_mode: WriteMode) -> Self {
        let properties = description.properties.iter().cloned().map(Arc::new).collect::<Vec<_>>();
        let resolved = resolve(&properties);
        let entity_id = format!("light.{}_{}", description.model.replace(['.', '-'], "_"), description.did.replace('.', "_"));

        info!(
            entity_id = %entity_id,
            color_modes = ?resolved.model.supported_color_modes(),
            "💡 New light '{}'",
            description.name
        );

        LightEntity {
            entity_id,
            name: description.name.clone(),
            icon: description.is_group().then_some(GROUP_ICON),
            write_mode,
            properties,
            resolved,
            store: PropertyStore {
                did: description.did.clone(),
                client,
                values: HashMap::new(),
            },
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.icon
    }

    pub fn capabilities(&self) -> &CapabilityModel {
        &self.resolved.model
    }

    pub fn malformed_properties(&self) -> &[MalformedDescriptor] {
        &self.resolved.malformed
    }

    pub fn supported_color_modes(&self) -> &BTreeSet<ColorMode> {
        self.resolved.model.supported_color_modes()
    }

    pub fn color_mode(&self) -> Option<ColorMode> {
        self.resolved.model.color_mode()
    }

    pub fn effect_list(&self) -> Vec<&str> {
        self.resolved.model.effect_list()
    }

    /// The last known raw value of a property, `None` until the property has been synced.
    pub fn property_value(&self, property: &PropertyDescriptor) -> Option<&PropertyValue> {
        self.store.values.get(&property.key())
    }

    pub fn is_on(&self) -> Option<bool> {
        self.bound_value(self.resolved.bindings.power()).and_then(power_state)
    }

    pub fn brightness(&self) -> Option<u8> {
        let raw = self.bound_value(self.resolved.bindings.brightness())?.as_i64()?;
        let scale = self.resolved.model.brightness_scale()?;
        Some(to_normalized_brightness(raw, scale))
    }

    pub fn color_temp_kelvin(&self) -> Option<i64> {
        self.bound_value(self.resolved.bindings.color_temperature())?.as_i64()
    }

    pub fn rgb_color(&self) -> Option<Rgb> {
        let raw = self.bound_value(self.resolved.bindings.color())?.as_i64()?;
        Some(to_rgb_triple(raw))
    }

    pub fn effect(&self) -> Option<&str> {
        let raw = self.bound_value(self.resolved.bindings.mode())?.as_i64()?;
        describe_mode(raw, self.resolved.model.mode_table()?)
    }

    /// Records a value reported by the device. Returns `false` when the property does not belong to
    /// this light.
    pub fn on_property_changed(&mut self, key: PropertyKey, value: PropertyValue) -> bool {
        let Some(property) = self.properties.iter().find(|p| p.key() == key) else {
            warn!(entity_id = %self.entity_id, "⚠️ Received value for unknown property {}", key);
            return false;
        };

        let value = property.format_value(value);
        debug!(
            entity_id = %self.entity_id,
            property = property.name(),
            unit = property.unit(),
            "🔵 Property changed to {}",
            value
        );
        self.store.values.insert(key, value);
        true
    }

    /// Turns the light on and applies the attributes of `intent`.
    #[instrument(skip_all, fields(entity_id = %self.entity_id))]
    pub async fn turn_on(&mut self, intent: &WriteIntent) -> bool {
        info!("🟢 Turn on light '{}'", self.name);
        apply_write(&mut self.store, &self.resolved.bindings, &mut self.resolved.model, intent, self.write_mode).await
    }

    #[instrument(skip_all, fields(entity_id = %self.entity_id))]
    pub async fn turn_off(&mut self) -> bool {
        info!("🔴 Turn off light '{}'", self.name);
        apply_turn_off(&mut self.store, &self.resolved.bindings).await
    }

    fn bound_value(&self, property: Option<&Arc<PropertyDescriptor>>) -> Option<&PropertyValue> {
        property.and_then(|p| self.property_value(p))
    }
}

/// Last known property values of a device, kept in sync with successful writes.
#[derive(Debug)]
struct PropertyStore<C: DeviceClient + ?Sized> {
    did: String,
    client: Arc<C>,
    values: HashMap<PropertyKey, PropertyValue>,
}

#[async_trait]
impl<C: DeviceClient + ?Sized> PropertyWriter for PropertyStore<C> {
    async fn write(&mut self, property: &PropertyDescriptor, value: PropertyValue) -> Result<(), WriteError> {
        if !property.access().writable() {
            return Err(WriteError::NotWritable(property.name().to_string()));
        }

        let value = property.format_value(value);
        self.client.set_property(&self.did, property, value.clone()).await?;
        self.values.insert(property.key(), value);
        Ok(())
    }
}
