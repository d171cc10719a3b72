mod config;
mod config_file;
mod placement;
mod queue;
mod request;
mod settings;
mod timeline;
mod timing;
mod worker;

pub use config::*;
pub use config_file::*;
pub use placement::*;
pub use queue::*;
pub use request::*;
pub use settings::*;
pub use timeline::*;
pub use timing::*;
pub use worker::*;
