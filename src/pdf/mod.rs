pub mod document;
pub mod embed;
pub mod metrics;

pub use document::{DocumentBuilder, FontStyle, PageBuilder};
pub use embed::{EmbeddedImage, EmbeddedPage};
