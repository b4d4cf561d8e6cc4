//! Description service port for the vision model.

use std::path::Path;
use std::time::Duration;

use crate::error::ServiceError;

/// Port for a model that turns an image and a prompt into text.
pub trait DescriptionService: Send + Sync {
    /// Describes the image at `image`.
    ///
    /// Implementations must give up after `timeout` and report that as
    /// [`ServiceError::Transient`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] when the service refuses the
    /// request, [`ServiceError::Transient`] for anything else.
    fn describe(&self, image: &Path, prompt: &str, timeout: Duration)
        -> Result<String, ServiceError>;
}
