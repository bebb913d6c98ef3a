pub mod node;
pub mod registry;
pub mod traits;

pub use node::{NodeId, ResourceDef};
pub use registry::{Registry, RegistryError, ResourceNode};
pub use traits::{LoadedResource, Resource, Selector};
