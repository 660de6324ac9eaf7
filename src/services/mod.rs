pub mod element_resolver;
pub mod post_discovery;
pub mod run_log;

pub use element_resolver::{ElementResolver, Strategy};
pub use post_discovery::PostDiscovery;
pub use run_log::RunLog;
