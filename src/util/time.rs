//! Server uptime tracking

use std::sync::OnceLock;
use std::time::Instant;

static SERVER_START: OnceLock<Instant> = OnceLock::new();

/// Record the server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Seconds since `init_server_time`, 0 before it ran
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}
