pub mod clean;
pub mod metadata;
pub mod threshold;

pub use clean::{clean, CleanParams};
pub use metadata::MaskMetadata;
pub use threshold::ThresholdMethod;
