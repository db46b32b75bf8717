use miot_light::app_config::AppConfig;
use miot_light::device::simulated::SimulatedDeviceClient;
use miot_light::device::{DeviceClient, load_devices_from};
use miot_light::light::LightEntity;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    tracing_subscriber::fmt().with_max_level(config.core().log_level()).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!(write_mode = ?config.light().write_mode(), "✅  Loaded configuration");

    let devices = load_devices_from(config.devices().directory(), config.devices().extension()).await?;
    info!("✅  Loaded {} device description(s)", devices.len());

    // Dry run, nothing leaves this process
    let client: Arc<dyn DeviceClient> = Arc::new(SimulatedDeviceClient::new());
    let lights = devices
        .iter()
        .map(|device| LightEntity::new(device, client.clone(), config.light().write_mode()))
        .collect::<Vec<_>>();

    for light in &lights {
        if !light.malformed_properties().is_empty() {
            warn!(entity_id = light.entity_id(), "⚠️ {} malformed propert(ies) skipped", light.malformed_properties().len());
        }

        let capabilities = light.capabilities();
        info!(
            entity_id = light.entity_id(),
            color_modes = ?capabilities.supported_color_modes(),
            color_mode = ?capabilities.color_mode(),
            brightness_scale = ?capabilities.brightness_scale(),
            min_color_temp_kelvin = ?capabilities.min_color_temp_kelvin(),
            max_color_temp_kelvin = ?capabilities.max_color_temp_kelvin(),
            effects = ?light.effect_list(),
            "💡 '{}'",
            light.name()
        );
    }

    info!("🔥 {} resolved {} light(s)", env!("CARGO_PKG_NAME"), lights.len());

    Ok(())
}
