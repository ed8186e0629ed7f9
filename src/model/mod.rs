//! Data model: entities, services, device metadata.

mod registry;
mod types;

pub use registry::EntityRegistry;
pub use types::{
    DeviceInfo, EntityInfo, EntityKind, LogLevel, ServiceArg, ServiceArgType, ServiceInfo,
};
