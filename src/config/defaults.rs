/// Default configuration constants used across the system.

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind host.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default timeout for the remote app-config fetch (10 seconds).
pub const DEFAULT_APP_CONFIG_TIMEOUT_MS: u64 = 10_000;

/// Maximum number of whitespace-separated words in battle instructions.
pub const DEFAULT_MAX_INSTRUCTION_WORDS: usize = 20;

/// How long the agent has to become ready after the session starts.
pub const DEFAULT_AGENT_READY_TIMEOUT_MS: u64 = 20_000;

/// Header carrying the sandbox identifier, both on inbound requests and on
/// the remote config fetch.
pub const SANDBOX_ID_HEADER: &str = "x-sandbox-id";
