//! Station registry - the pipeline's configuration layer

mod registry;

pub use registry::{RegistryError, StationRegistry};
