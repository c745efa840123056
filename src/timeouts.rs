pub mod ms {
    pub const POLL_INTERVAL: u64 = 100;
    pub const SERVER_CONNECT_RETRY_DELAY: u64 = 500;
    pub const SERVER_STARTUP_SETTLE: u64 = 200;
}
