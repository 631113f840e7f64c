//! Single-page static site assembler.
//!
//! Substitutes HTML fragments into the placeholder regions of a base document,
//! strips the in-browser section loader, and publishes static assets next to
//! the composed page.

pub mod assembler;
pub mod builder;
pub mod publisher;

pub use assembler::{assemble, Assembled, Assembler, FragmentDir, FragmentSource};
pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder};
pub use publisher::{AssetMapping, AssetPublisher, PublishReport};
