pub mod command;

pub use command::{Command, CowMode, RequestInfo, Response};
