// Web server modules for label forge

pub mod completion;
pub mod error;
pub mod logger;
pub mod materialize;
pub mod pipeline;
pub mod prompt;
pub mod request_parsing;
pub mod response_helpers;
pub mod retention;
pub mod routes;
pub mod staging;
pub mod state;

// Re-export commonly used types
pub use completion::{CompletionClient, CompletionError, OpenAiClient};
pub use error::{PipelineError, PipelineResult};
pub use materialize::{AcceptAll, NonEmptyValidator, ScriptValidator};
pub use pipeline::{JobOutcome, Pipeline, RunReport};
pub use staging::WorkDirs;
pub use state::{AppState, SharedState};
