//! Domain models for the BCI2000 remote-control client.
//!
//! Pure data structures: the two state enumerations, the declarations a
//! session makes before module startup, module descriptors and information
//! about a running operator process. Nothing in here touches the network.

pub mod declaration;
pub mod error;
pub mod module;
pub mod operator_process;
pub mod state;

pub use common::ErrorLocation;
pub use declaration::{EventDecl, ParameterDecl, StateDecl, validate_identifier};
pub use error::model_error::ModelError;
pub use module::{ModuleDescriptor, ModuleDescriptorBuilder};
pub use operator_process::{OperatorProcess, OperatorProcessBuilder};
pub use state::{RemoteState, SystemState};

#[cfg(test)]
mod tests;
