use crate::domain::property::{PropertyDescriptor, PropertyKey};
use crate::light::capability::{CapabilityModel, ColorMode, ModeTable};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument};

/// Largest value range a mode property may span, one effect is created per value.
const MAX_MODE_RANGE: i128 = 1024;

/// The properties a light reads from and writes to, picked out of the device property list.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct PropertyBindings {
    power: Option<Arc<PropertyDescriptor>>,
    brightness: Option<Arc<PropertyDescriptor>>,
    color_temperature: Option<Arc<PropertyDescriptor>>,
    color: Option<Arc<PropertyDescriptor>>,
    mode: Option<Arc<PropertyDescriptor>>,
}

impl PropertyBindings {
    pub fn power(&self) -> Option<&Arc<PropertyDescriptor>> {
        self.power.as_ref()
    }

    pub fn brightness(&self) -> Option<&Arc<PropertyDescriptor>> {
        self.brightness.as_ref()
    }

    pub fn color_temperature(&self) -> Option<&Arc<PropertyDescriptor>> {
        self.color_temperature.as_ref()
    }

    pub fn color(&self) -> Option<&Arc<PropertyDescriptor>> {
        self.color.as_ref()
    }

    pub fn mode(&self) -> Option<&Arc<PropertyDescriptor>> {
        self.mode.as_ref()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct ResolvedLight {
    pub model: CapabilityModel,
    pub bindings: PropertyBindings,
    pub malformed: Vec<MalformedDescriptor>,
}

#[derive(Error, PartialEq, Debug, Clone)]
pub enum MalformedDescriptor {
    #[error("invalid brightness format for property {key}")]
    InvalidBrightness { key: PropertyKey },
    #[error("invalid color-temperature value range for property {key}")]
    InvalidColorTemperatureRange { key: PropertyKey },
    #[error("invalid mode format for property {key}")]
    InvalidMode { key: PropertyKey },
}

/// Derives the capabilities of a light from its properties, in declaration order.
///
/// Properties that lack the value range or value list their name requires are logged, reported
/// in [`ResolvedLight::malformed`] and otherwise ignored.
#[instrument(skip_all)]
pub fn resolve(properties: &[Arc<PropertyDescriptor>]) -> ResolvedLight {
    let resolved = properties.iter().fold(CapabilityBuilder::default(), CapabilityBuilder::add).build();

    debug!(
        supported_color_modes = ?resolved.model.supported_color_modes(),
        color_mode = ?resolved.model.color_mode(),
        effect = resolved.model.supports_effect(),
        "💡 Resolved {} propert(ies), {} malformed",
        properties.len(),
        resolved.malformed.len()
    );

    resolved
}

#[derive(Default)]
struct CapabilityBuilder {
    model: CapabilityModel,
    bindings: PropertyBindings,
    malformed: Vec<MalformedDescriptor>,
}

impl CapabilityBuilder {
    fn add(mut self, property: &Arc<PropertyDescriptor>) -> Self {
        let result = match property.name() {
            "on" => {
                self.bindings.power = Some(property.clone());
                Ok(())
            }
            "brightness" => self.add_brightness(property),
            "color-temperature" => self.add_color_temperature(property),
            "color" => {
                self.model.supported_color_modes.insert(ColorMode::Rgb);
                self.model.color_mode = Some(ColorMode::Rgb);
                self.bindings.color = Some(property.clone());
                Ok(())
            }
            "mode" => self.add_mode(property),
            _ => Ok(()),
        };

        if let Err(malformed) = result {
            error!(property = property.name(), "⚠️ Skipping property, {}", malformed);
            self.malformed.push(malformed);
        }

        self
    }

    fn add_brightness(&mut self, property: &Arc<PropertyDescriptor>) -> Result<(), MalformedDescriptor> {
        if let Some(range) = property.value_range() {
            self.model.brightness_scale = Some(range.bounds());
            self.bindings.brightness = Some(property.clone());
            return Ok(());
        }

        match property.value_list() {
            // Brightness levels without a range are offered as effects
            Some(items) if !items.is_empty() && self.model.mode_table.is_none() => {
                self.set_mode_table(property, ModeTable::from_entries(items.iter().map(|item| (item.value(), item.description()))));
                Ok(())
            }
            _ => Err(MalformedDescriptor::InvalidBrightness { key: property.key() }),
        }
    }

    fn add_color_temperature(&mut self, property: &Arc<PropertyDescriptor>) -> Result<(), MalformedDescriptor> {
        let range = property
            .value_range()
            .ok_or(MalformedDescriptor::InvalidColorTemperatureRange { key: property.key() })?;

        self.model.color_temp_range_kelvin = Some(range.bounds());
        self.model.supported_color_modes.insert(ColorMode::ColorTemp);
        self.model.color_mode = Some(ColorMode::ColorTemp);
        self.bindings.color_temperature = Some(property.clone());
        Ok(())
    }

    fn add_mode(&mut self, property: &Arc<PropertyDescriptor>) -> Result<(), MalformedDescriptor> {
        let table = match (property.value_list(), property.value_range()) {
            (Some(items), _) if !items.is_empty() => ModeTable::from_entries(items.iter().map(|item| (item.value(), item.description()))),
            // The upper bound is exclusive here, unlike everywhere else a value range is used
            (_, Some(range)) if range.max() as i128 - range.min() as i128 > MAX_MODE_RANGE => {
                return Err(MalformedDescriptor::InvalidMode { key: property.key() });
            }
            (_, Some(range)) => ModeTable::from_entries((range.min()..range.max()).map(|value| (value, value.to_string()))),
            _ => ModeTable::from_entries(Vec::<(i64, String)>::new()),
        };

        if table.is_empty() {
            return Err(MalformedDescriptor::InvalidMode { key: property.key() });
        }

        if self.model.mode_table.is_some() {
            debug!(property = property.name(), "Mode table already set by an earlier property, keeping it");
            self.model.effect = true;
            return Ok(());
        }

        self.set_mode_table(property, table);
        Ok(())
    }

    fn set_mode_table(&mut self, property: &Arc<PropertyDescriptor>, table: ModeTable) {
        self.model.mode_table = Some(table);
        self.model.effect = true;
        self.bindings.mode = Some(property.clone());
    }

    fn build(mut self) -> ResolvedLight {
        if self.model.supported_color_modes.is_empty() {
            let fallback = if self.bindings.brightness.is_some() {
                Some(ColorMode::Brightness)
            } else if self.bindings.power.is_some() {
                Some(ColorMode::OnOff)
            } else {
                None
            };

            if let Some(mode) = fallback {
                self.model.supported_color_modes.insert(mode);
                self.model.color_mode = Some(mode);
            }
        }

        ResolvedLight {
            model: self.model,
            bindings: self.bindings,
            malformed: self.malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::property::{PropertyFormat, ValueListItem};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    #[derive(Clone, Default)]
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn resolve_counting_errors(properties: &[Arc<PropertyDescriptor>]) -> (ResolvedLight, usize) {
        let counter = ErrorCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());

        let resolved = tracing::subscriber::with_default(subscriber, || resolve(properties));

        (resolved, counter.0.load(Ordering::SeqCst))
    }

    fn on(format: PropertyFormat) -> Arc<PropertyDescriptor> {
        Arc::new(PropertyDescriptor::builder("on", format).iid(2, 1).build())
    }

    fn brightness_range(min: i64, max: i64) -> Arc<PropertyDescriptor> {
        Arc::new(PropertyDescriptor::builder("brightness", PropertyFormat::Integer).iid(2, 2).value_range(min, max).build())
    }

    fn listed(name: &str, piid: u32, items: &[(i64, &str)]) -> Arc<PropertyDescriptor> {
        Arc::new(
            PropertyDescriptor::builder(name, PropertyFormat::Integer)
                .iid(2, piid)
                .value_list(items.iter().map(|(value, description)| ValueListItem::new(*value, *description)).collect())
                .build(),
        )
    }

    fn color_temperature(range: Option<(i64, i64)>) -> Arc<PropertyDescriptor> {
        let builder = PropertyDescriptor::builder("color-temperature", PropertyFormat::Integer).iid(2, 3);
        Arc::new(match range {
            Some((min, max)) => builder.value_range(min, max).build(),
            None => builder.build(),
        })
    }

    fn color() -> Arc<PropertyDescriptor> {
        Arc::new(PropertyDescriptor::builder("color", PropertyFormat::Integer).iid(2, 4).value_range(0, 0xFFFFFF).build())
    }

    fn modes(modes: &[ColorMode]) -> BTreeSet<ColorMode> {
        modes.iter().copied().collect()
    }

    #[test]
    fn on_and_brightness_resolve_to_brightness_mode() {
        let resolved = resolve(&[on(PropertyFormat::Bool), brightness_range(1, 100)]);

        assert_eq!(resolved.model.supported_color_modes(), &modes(&[ColorMode::Brightness]));
        assert_eq!(resolved.model.color_mode(), Some(ColorMode::Brightness));
        assert_eq!(resolved.model.brightness_scale(), Some((1, 100)));
        assert!(!resolved.model.supports_effect());
        assert!(resolved.malformed.is_empty());
    }

    #[test]
    fn on_only_resolves_to_on_off_mode() {
        let resolved = resolve(&[on(PropertyFormat::Integer)]);

        assert_eq!(resolved.model.supported_color_modes(), &modes(&[ColorMode::OnOff]));
        assert_eq!(resolved.model.color_mode(), Some(ColorMode::OnOff));
        assert!(resolved.bindings.power().is_some());
    }

    #[test]
    fn no_light_properties_resolve_to_nothing() {
        let other = Arc::new(PropertyDescriptor::builder("flow", PropertyFormat::Integer).build());

        let resolved = resolve(&[other]);

        assert!(resolved.model.supported_color_modes().is_empty());
        assert_eq!(resolved.model.color_mode(), None);
        assert!(resolved.malformed.is_empty());
    }

    #[test]
    fn the_last_color_property_sets_the_active_mode() {
        let resolved = resolve(&[on(PropertyFormat::Bool), brightness_range(1, 100), color_temperature(Some((2700, 6500))), color()]);

        assert_eq!(resolved.model.supported_color_modes(), &modes(&[ColorMode::ColorTemp, ColorMode::Rgb]));
        assert_eq!(resolved.model.color_mode(), Some(ColorMode::Rgb));
        assert_eq!(resolved.model.color_temp_range_kelvin(), Some((2700, 6500)));
        assert_eq!(resolved.model.min_color_temp_kelvin(), Some(2700));
        assert_eq!(resolved.model.max_color_temp_kelvin(), Some(6500));
        assert_eq!(resolved.model.brightness_scale(), Some((1, 100)));

        let resolved = resolve(&[color(), color_temperature(Some((2700, 6500)))]);

        assert_eq!(resolved.model.color_mode(), Some(ColorMode::ColorTemp));
    }

    #[test]
    fn color_temperature_without_a_range_is_skipped_once() {
        let (resolved, errors) = resolve_counting_errors(&[on(PropertyFormat::Bool), color_temperature(None)]);

        assert!(!resolved.model.supports(ColorMode::ColorTemp));
        assert_eq!(resolved.model.supported_color_modes(), &modes(&[ColorMode::OnOff]));
        assert_eq!(
            resolved.malformed,
            vec![MalformedDescriptor::InvalidColorTemperatureRange { key: PropertyKey::new(2, 3) }]
        );
        assert_eq!(errors, 1);
        assert!(resolved.bindings.color_temperature().is_none());
    }

    #[test]
    fn every_malformed_property_is_logged_exactly_once() {
        let brightness = Arc::new(PropertyDescriptor::builder("brightness", PropertyFormat::Integer).iid(2, 2).build());
        let mode = listed("mode", 5, &[]);

        let (resolved, errors) = resolve_counting_errors(&[on(PropertyFormat::Bool), brightness, color_temperature(None), mode]);

        assert_eq!(resolved.malformed.len(), 3);
        assert_eq!(errors, 3);
    }

    #[test]
    fn mode_value_list_becomes_the_effect_table() {
        let resolved = resolve(&[on(PropertyFormat::Bool), listed("mode", 5, &[(0, "Day"), (1, "Night")])]);
        let table = resolved.model.mode_table().unwrap();

        assert!(resolved.model.supports_effect());
        assert_eq!(table.describe(1), Some("Night"));
        assert_eq!(table.value_for("Day"), Some(0));
        assert_eq!(table.value_for("Unknown"), None);
        assert_eq!(resolved.model.effect_list(), vec!["Day", "Night"]);
    }

    #[test]
    fn mode_value_range_excludes_the_maximum() {
        let mode = Arc::new(PropertyDescriptor::builder("mode", PropertyFormat::Integer).value_range(1, 4).build());

        let resolved = resolve(&[mode]);

        assert_eq!(resolved.model.effect_list(), vec!["1", "2", "3"]);
        assert_eq!(resolved.model.mode_table().unwrap().value_for("4"), None);
    }

    #[test]
    fn mode_value_range_wider_than_the_limit_is_malformed() {
        let widest = Arc::new(PropertyDescriptor::builder("mode", PropertyFormat::Integer).iid(2, 5).value_range(0, 1024).build());
        let too_wide = Arc::new(PropertyDescriptor::builder("mode", PropertyFormat::Integer).iid(2, 6).value_range(0, 4294967295).build());
        let extreme = Arc::new(PropertyDescriptor::builder("mode", PropertyFormat::Integer).iid(2, 7).value_range(i64::MIN, i64::MAX).build());

        let resolved = resolve(&[too_wide, extreme]);

        assert!(!resolved.model.supports_effect());
        assert_eq!(
            resolved.malformed,
            vec![
                MalformedDescriptor::InvalidMode { key: PropertyKey::new(2, 6) },
                MalformedDescriptor::InvalidMode { key: PropertyKey::new(2, 7) },
            ]
        );

        let resolved = resolve(&[widest]);

        assert_eq!(resolved.model.effect_list().len(), 1024);
        assert!(resolved.malformed.is_empty());
    }

    #[test]
    fn mode_without_entries_is_malformed() {
        let empty_list = listed("mode", 5, &[]);
        let empty_range = Arc::new(PropertyDescriptor::builder("mode", PropertyFormat::Integer).iid(2, 6).value_range(3, 3).build());

        let resolved = resolve(&[empty_list, empty_range]);

        assert!(!resolved.model.supports_effect());
        assert_eq!(
            resolved.malformed,
            vec![
                MalformedDescriptor::InvalidMode { key: PropertyKey::new(2, 5) },
                MalformedDescriptor::InvalidMode { key: PropertyKey::new(2, 6) },
            ]
        );
    }

    #[test]
    fn brightness_value_list_becomes_the_effect_table() {
        let resolved = resolve(&[on(PropertyFormat::Bool), listed("brightness", 2, &[(1, "Low"), (2, "High")])]);

        assert!(resolved.model.supports_effect());
        assert_eq!(resolved.model.brightness_scale(), None);
        assert_eq!(resolved.model.effect_list(), vec!["Low", "High"]);
        assert_eq!(resolved.model.color_mode(), Some(ColorMode::OnOff));
        assert_eq!(resolved.bindings.mode().map(|p| p.name()), Some("brightness"));
    }

    #[test]
    fn brightness_before_mode_keeps_the_brightness_table() {
        let resolved = resolve(&[listed("brightness", 2, &[(1, "Low")]), listed("mode", 5, &[(0, "Day")])]);

        assert_eq!(resolved.model.effect_list(), vec!["Low"]);
        assert_eq!(resolved.bindings.mode().map(|p| p.key()), Some(PropertyKey::new(2, 2)));
        assert!(resolved.model.supports_effect());
        assert!(resolved.malformed.is_empty());
    }

    #[test]
    fn mode_before_brightness_keeps_the_mode_table() {
        let resolved = resolve(&[listed("mode", 5, &[(0, "Day")]), listed("brightness", 2, &[(1, "Low")])]);

        assert_eq!(resolved.model.effect_list(), vec!["Day"]);
        assert_eq!(resolved.bindings.mode().map(|p| p.key()), Some(PropertyKey::new(2, 5)));
        assert_eq!(resolved.malformed, vec![MalformedDescriptor::InvalidBrightness { key: PropertyKey::new(2, 2) }]);
    }

    #[test]
    fn brightness_without_range_or_list_is_malformed() {
        let brightness = Arc::new(PropertyDescriptor::builder("brightness", PropertyFormat::Integer).iid(2, 2).build());

        let resolved = resolve(&[on(PropertyFormat::Bool), brightness]);

        assert_eq!(resolved.model.supported_color_modes(), &modes(&[ColorMode::OnOff]));
        assert_eq!(resolved.malformed, vec![MalformedDescriptor::InvalidBrightness { key: PropertyKey::new(2, 2) }]);
    }

    #[test]
    fn brightness_only_without_power_still_falls_back_to_brightness() {
        let resolved = resolve(&[brightness_range(0, 255)]);

        assert_eq!(resolved.model.supported_color_modes(), &modes(&[ColorMode::Brightness]));
        assert!(resolved.bindings.power().is_none());
    }
}
