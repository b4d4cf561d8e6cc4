//! Test support utilities for photo-describe.
//!
//! Provides mocks for every core port and a builder for folders of real
//! (and deliberately broken) image files.
//!
//! # Example
//!
//! ```
//! use photo_describe_test_support::{FixtureFolder, MockDescriptionService, Reply};
//!
//! let folder = FixtureFolder::new().with_png("cat.png").with_corrupt("broken.jpg");
//! let service = MockDescriptionService::new()
//!     .script("cat.png", vec![Reply::transient("timeout"), Reply::ok("A cat.")]);
//! assert_eq!(folder.names().len(), 2);
//! # drop(service);
//! ```

mod builders;
mod mocks;

pub use builders::FixtureFolder;
pub use mocks::{
    MemoryCheckpointStore, MemoryOutputSink, MockDescriptionService, MockProgressSink, Reply,
};
