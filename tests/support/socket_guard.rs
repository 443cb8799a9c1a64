//! Skip helper for tests that need a loopback socket (wiremock).
//!
//! Sandboxed CI runners sometimes forbid binding; those tests then skip with a
//! note on stderr unless `TUNEFETCH_REQUIRE_SOCKET_TESTS` asks for a hard fail.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "TUNEFETCH_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

fn loopback_unavailable() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let message = "[socket-bound-test] cannot bind 127.0.0.1";
    assert!(!sockets_required(), "{message}; {REQUIRE_ENV} is set");
    eprintln!("{message}; skipping. Set {REQUIRE_ENV}=1 to fail instead.");
    true
}

/// Starts a mock server, or returns `None` when the test should be skipped.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if loopback_unavailable() {
        None
    } else {
        Some(MockServer::start().await)
    }
}
