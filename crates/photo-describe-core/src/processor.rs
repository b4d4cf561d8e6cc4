//! Per-image processing with bounded retry.

use std::sync::Arc;
use std::thread;

use tracing::{debug, error, warn};

use crate::domain::{ErrorClass, Outcome, RunConfig, WorkItem};
use crate::ports::DescriptionService;

/// Describes single images through a [`DescriptionService`].
///
/// The processor only talks to the service. It never touches the checkpoint,
/// the output sink or the progress state, so any number of workers can run
/// it in parallel.
#[derive(Clone)]
pub struct ItemProcessor {
    service: Arc<dyn DescriptionService>,
}

impl ItemProcessor {
    #[must_use]
    pub fn new(service: Arc<dyn DescriptionService>) -> Self {
        Self { service }
    }

    /// Processes one item.
    ///
    /// A corrupt image fails immediately without calling the service. A
    /// service rejection fails immediately. Transient errors are retried up
    /// to `config.attempts()` times in total with `config.retry_delay`
    /// between attempts.
    pub fn process(&self, item: &WorkItem, config: &RunConfig) -> Outcome {
        if let Err(e) = validate_image(item) {
            error!("IOError processing image {}: {e}", item.path().display());
            return Outcome::failure(ErrorClass::Validation.failure_kind(), e.to_string());
        }

        let attempts = config.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("Describing {} (attempt {attempt}/{attempts})", item.name());

            let err = match self
                .service
                .describe(item.path(), &config.prompt, config.timeout)
            {
                Ok(description) => return Outcome::success(description),
                Err(e) => e,
            };

            let class = err.class();
            if !class.is_retryable() {
                error!(
                    "Service rejected image {}: {err}",
                    item.path().display()
                );
                return Outcome::failure(class.failure_kind(), err.to_string());
            }

            if attempt >= attempts {
                error!(
                    "Unexpected error for image {} after {attempt} attempts: {err}",
                    item.path().display()
                );
                return Outcome::failure(class.failure_kind(), err.to_string());
            }

            warn!(
                "Unexpected error for image {} (attempt {attempt}/{attempts}), retrying in {:?}: {err}",
                item.path().display(),
                config.retry_delay
            );
            thread::sleep(config.retry_delay);
        }
    }
}

/// Opens and fully decodes the image so truncated files are caught.
fn validate_image(item: &WorkItem) -> image::ImageResult<()> {
    image::ImageReader::open(item.path())?
        .with_guessed_format()?
        .decode()
        .map(drop)
}
