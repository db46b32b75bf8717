pub mod capability;
pub mod coordinator;
pub mod entity;
pub mod resolver;
pub mod translator;

pub use capability::{CapabilityModel, ColorMode, ModeTable};
pub use coordinator::{WriteError, WriteIntent, WriteMode};
pub use entity::LightEntity;
pub use resolver::{MalformedDescriptor, ResolvedLight, resolve};
