use crate::module::ModuleDescriptor;
use crate::{ErrorLocation, ModelError};

use std::panic::Location;

/// Builder for creating validated ModuleDescriptor instances.
#[derive(Debug, Default)]
pub struct ModuleDescriptorBuilder {
    name: Option<String>,
    args: Vec<String>,
}

impl ModuleDescriptorBuilder {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the ModuleDescriptor with validation.
    #[track_caller]
    pub fn build(self) -> Result<ModuleDescriptor, ModelError> {
        let name = self.name.ok_or_else(|| ModelError::Validation {
            message: String::from("Module name is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let descriptor = ModuleDescriptor {
            name,
            args: self.args,
        };
        descriptor.validate()?;

        Ok(descriptor)
    }
}
