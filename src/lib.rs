pub mod interface;
pub mod service;
pub mod shared;

pub use interface::{http, provider};
pub use service::{analysis, conversation, ingest};
pub use shared::{config, entities, error, logging, ports, utils};
