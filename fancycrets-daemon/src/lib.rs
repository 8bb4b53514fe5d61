//! Controller runtime: settings, Kubernetes API client, polling watcher and
//! the serial event processor.

mod error;
pub mod http_api;
pub mod paths;
pub mod runtime;
pub mod settings;
pub mod watcher;

pub use error::DaemonError;
pub use http_api::HttpSecretApi;
pub use runtime::{init_tracing, run_until, start_blocking, ProcessorStats};
pub use settings::Settings;
pub use watcher::{diff_secrets, SecretLister};
