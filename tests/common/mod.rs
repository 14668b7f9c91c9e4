#![allow(dead_code, unused_imports)]

pub use transit_bridge_test_utils::builders;
#[cfg(unix)]
pub use transit_bridge_test_utils::fake_transit;
pub use transit_bridge_test_utils::{init_tracing, with_timeout};
