pub mod api;
pub mod backend;

pub use api::client::Client;
pub use api::error::{Error, Result};
pub use api::experiment::{Experiment, LifecycleStage};
pub use api::id::ExperimentId;
pub use api::options::{CreateOptions, DeleteOptions, GetOptions, ListOptions, ViewType};
pub use api::tag::{Tag, Tags};
pub use backend::rest::Server;
