pub mod client;
pub mod description;
mod loader;
pub mod simulated;

pub use client::{DeviceClient, DeviceError};
pub use description::{DescriptionError, DeviceDescription};
pub use loader::{LoaderError, load_devices_from};
