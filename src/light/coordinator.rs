use crate::device::client::DeviceError;
use crate::domain::color::Rgb;
use crate::domain::property::{PropertyDescriptor, PropertyValue};
use crate::light::capability::{CapabilityModel, ColorMode};
use crate::light::resolver::PropertyBindings;
use crate::light::translator::{from_rgb_triple, power_value, to_device_brightness, value_for_description};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// One request to change the attributes of a light. Brightness is on the `0..=255` scale.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct WriteIntent {
    pub brightness: Option<u8>,
    pub color_temp_kelvin: Option<i64>,
    pub rgb_color: Option<Rgb>,
    pub effect: Option<String>,
}

impl WriteIntent {
    pub fn brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn color_temp_kelvin(mut self, kelvin: i64) -> Self {
        self.color_temp_kelvin = Some(kelvin);
        self
    }

    pub fn rgb_color(mut self, rgb: Rgb) -> Self {
        self.rgb_color = Some(rgb);
        self
    }

    pub fn effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = Some(effect.into());
        self
    }
}

/// How the outcome of a write intent is reported.
#[derive(PartialEq, Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// The result is that of the last write issued and an unknown effect is written as `null`.
    #[default]
    Compatible,
    /// Every write has to succeed and an unknown effect fails without being written.
    Strict,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum WriteStep {
    Power,
    Brightness,
    ColorTemperature,
    Color,
    Effect,
}

impl Display for WriteStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WriteStep::Power => "power",
            WriteStep::Brightness => "brightness",
            WriteStep::ColorTemperature => "color temperature",
            WriteStep::Color => "color",
            WriteStep::Effect => "effect",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, PartialEq, Debug)]
pub enum WriteError {
    #[error("the light has no {0} property")]
    MissingProperty(WriteStep),
    #[error("property '{0}' is not writable")]
    NotWritable(String),
    #[error("unknown effect '{0}'")]
    UnresolvedEffect(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Writes a single property of a device.
#[async_trait]
pub trait PropertyWriter: Send {
    async fn write(&mut self, property: &PropertyDescriptor, value: PropertyValue) -> Result<(), WriteError>;
}

/// Applies a write intent one property at a time: power, brightness, color temperature, color and
/// effect. Each write is awaited before the next one is issued.
#[instrument(skip_all, fields(mode = ?mode))]
pub async fn apply_write<W>(writer: &mut W, bindings: &PropertyBindings, model: &mut CapabilityModel, intent: &WriteIntent, mode: WriteMode) -> bool
where
    W: PropertyWriter + ?Sized,
{
    let power = bindings.power().map(|p| (p.as_ref(), power_value(p.format(), true)));
    let mut result = write_step(writer, WriteStep::Power, power).await;

    if let Some(brightness) = intent.brightness {
        let target = bindings
            .brightness()
            .zip(model.brightness_scale())
            .map(|(p, scale)| (p.as_ref(), PropertyValue::Integer(to_device_brightness(brightness, scale))));
        let ok = write_step(writer, WriteStep::Brightness, target).await;
        result = combine(mode, result, ok);
    }

    if let Some(kelvin) = intent.color_temp_kelvin {
        let target = bindings.color_temperature().map(|p| (p.as_ref(), PropertyValue::Integer(kelvin)));
        let issued = target.is_some();
        let ok = write_step(writer, WriteStep::ColorTemperature, target).await;
        if switches_color_mode(mode, issued, ok) {
            model.set_color_mode(ColorMode::ColorTemp);
        }
        result = combine(mode, result, ok);
    }

    if let Some(rgb) = intent.rgb_color {
        let target = bindings.color().map(|p| (p.as_ref(), PropertyValue::Integer(from_rgb_triple(rgb))));
        let issued = target.is_some();
        let ok = write_step(writer, WriteStep::Color, target).await;
        if switches_color_mode(mode, issued, ok) {
            model.set_color_mode(ColorMode::Rgb);
        }
        result = combine(mode, result, ok);
    }

    if let Some(effect) = &intent.effect {
        let value = model.mode_table().and_then(|table| value_for_description(effect, table));
        let ok = match (value, mode) {
            (Some(value), _) => write_step(writer, WriteStep::Effect, bindings.mode().map(|p| (p.as_ref(), PropertyValue::Integer(value)))).await,
            (None, WriteMode::Compatible) => {
                warn!(effect = effect.as_str(), "⚠️ Unknown effect, writing null");
                write_step(writer, WriteStep::Effect, bindings.mode().map(|p| (p.as_ref(), PropertyValue::Null))).await
            }
            (None, WriteMode::Strict) => {
                warn!("⚠️ Unable to write the {} step: {}", WriteStep::Effect, WriteError::UnresolvedEffect(effect.clone()));
                false
            }
        };
        result = combine(mode, result, ok);
    }

    result
}

/// Turns a light off by writing only its power property.
#[instrument(skip_all)]
pub async fn apply_turn_off<W>(writer: &mut W, bindings: &PropertyBindings) -> bool
where
    W: PropertyWriter + ?Sized,
{
    let power = bindings.power().map(|p| (p.as_ref(), power_value(p.format(), false)));
    write_step(writer, WriteStep::Power, power).await
}

/// Compatible mode switches the active color mode as soon as the write is issued, strict mode only
/// once it succeeded. Without a bound property the mode never changes.
fn switches_color_mode(mode: WriteMode, issued: bool, succeeded: bool) -> bool {
    match mode {
        WriteMode::Compatible => issued,
        WriteMode::Strict => succeeded,
    }
}

fn combine(mode: WriteMode, previous: bool, current: bool) -> bool {
    match mode {
        WriteMode::Compatible => current,
        WriteMode::Strict => previous && current,
    }
}

async fn write_step<W>(writer: &mut W, step: WriteStep, target: Option<(&PropertyDescriptor, PropertyValue)>) -> bool
where
    W: PropertyWriter + ?Sized,
{
    let result = match target {
        Some((property, value)) => {
            debug!(property = property.name(), "✏️ Writing {} value {}", step, value);
            writer.write(property, value).await
        }
        None => Err(WriteError::MissingProperty(step)),
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            warn!("⚠️ Unable to write the {} step: {}", step, err);
            false
        }
    }
}
