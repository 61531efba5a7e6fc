pub mod config;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod runtime;
pub mod traits;
pub mod types;
pub mod upload;

pub use config::DiscoveryConfig;
pub use error::FieldTypeError;
pub use loader::{LoadReport, TypeLoader};
pub use manifest::{TypeBundle, TypeManifest};
pub use registry::{FieldTypeRegistry, TypeInfo, TypeSource};
pub use runtime::{TypeBuilder, WasmFieldType};
pub use traits::{FieldType, RenderOptions, TypeCategory, render_raw};
pub use upload::{UploadOutcome, install_uploaded_type, remove_custom_type};
