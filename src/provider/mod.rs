pub mod api;
pub mod models;
pub mod tool;
pub mod traits;

pub use api::ApiProvider;
pub use models::{RawChannel, RawFormat, RawThumbnail, RawVideo};
pub use tool::ToolProvider;
pub use traits::MetadataProvider;
