mod builder;
mod descriptor;

pub use builder::ModuleDescriptorBuilder;
pub use descriptor::{LOCAL_FLAG, ModuleDescriptor};
