pub mod error;
pub mod logging;

pub use error::{ErrorStage, SentimentError};
pub use logging::{setup_logging, LoggingConfig};
