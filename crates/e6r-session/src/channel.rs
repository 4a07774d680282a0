//! Channel construction.
//!
//! The configuration surface is a fixed menu; every option has a recognized
//! effect on the channel (or on the stub layer that attaches to it — the
//! message size caps are enforced there and are carried here so one struct
//! describes the whole menu). Channels connect lazily: no I/O happens until
//! the first RPC goes out.

use std::path::PathBuf;
use std::time::Duration;

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

use crate::error::SessionError;

/// Path to a PEM CA bundle used instead of the system trust store.
pub const ENV_TLS_CA: &str = "E6DATA_TLS_CA";

const DEFAULT_MAX_INBOUND_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_MAX_OUTBOUND_BYTES: usize = 300 * 1024 * 1024;

// ---------------------------------------------------------------------------
// TlsMaterial
// ---------------------------------------------------------------------------

/// Transport security for the engine channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMaterial {
    /// Plaintext HTTP/2.
    #[default]
    None,
    /// TLS against the system trust store.
    SystemCa,
    /// TLS against a caller-supplied PEM bundle.
    PemBytes(Vec<u8>),
    /// TLS against a PEM bundle read from disk at channel build time.
    PemPath(PathBuf),
}

impl TlsMaterial {
    /// `E6DATA_TLS_CA` (a path) takes precedence over plaintext; absence
    /// means no TLS unless the caller configured material in code.
    pub fn from_env() -> TlsMaterial {
        match std::env::var(ENV_TLS_CA) {
            Ok(path) if !path.trim().is_empty() => TlsMaterial::PemPath(PathBuf::from(path)),
            _ => TlsMaterial::None,
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelOptions
// ---------------------------------------------------------------------------

/// The full channel option menu.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// How long a keepalive ping may go unanswered before the transport is
    /// considered dead.
    pub keepalive_idle_ms: u64,
    /// Interval between keepalive pings on an established connection.
    pub keepalive_interval_ms: u64,
    /// Whether keepalive pings are sent while no call is active.
    pub keepalive_without_calls: bool,
    /// Decode-side message cap, enforced by the stub layer (default 100 MiB).
    pub max_inbound_message_bytes: usize,
    /// Encode-side message cap, enforced by the stub layer (default 300 MiB).
    pub max_outbound_message_bytes: usize,
    /// Upper bound applied to every prepare deadline.
    pub prepare_timeout_max: Duration,
    /// HTTP/2 ping policy: data-less pings allowed per connection
    /// (0 = unlimited).
    pub max_pings_without_data: u32,
    /// HTTP/2 ping policy: floor on the spacing of any two pings.
    pub min_time_between_pings_ms: u64,
    /// HTTP/2 ping policy: floor on ping spacing while the connection is idle.
    pub min_ping_interval_without_data_ms: u64,
    pub tls: TlsMaterial,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        ChannelOptions {
            keepalive_idle_ms: 30_000,
            keepalive_interval_ms: 60_000,
            keepalive_without_calls: true,
            max_inbound_message_bytes: DEFAULT_MAX_INBOUND_BYTES,
            max_outbound_message_bytes: DEFAULT_MAX_OUTBOUND_BYTES,
            prepare_timeout_max: Duration::from_secs(600),
            max_pings_without_data: 0,
            min_time_between_pings_ms: 15_000,
            min_ping_interval_without_data_ms: 15_000,
            tls: TlsMaterial::None,
        }
    }
}

/// Keepalive settings after the HTTP/2 ping policy has been folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedKeepalive {
    pub interval: Duration,
    pub timeout: Duration,
    pub while_idle: bool,
}

impl ChannelOptions {
    /// Defaults plus TLS material from the environment.
    pub fn from_env() -> ChannelOptions {
        ChannelOptions {
            tls: TlsMaterial::from_env(),
            ..ChannelOptions::default()
        }
    }

    /// Fold the ping policy into the keepalive knobs:
    /// - the ping interval never undercuts either pacing floor;
    /// - a finite data-less ping budget disables idle pinging outright
    ///   (the transport cannot count pings, so the budget is honored
    ///   conservatively).
    pub fn resolved_keepalive(&self) -> ResolvedKeepalive {
        let floor = self
            .min_time_between_pings_ms
            .max(self.min_ping_interval_without_data_ms);
        ResolvedKeepalive {
            interval: Duration::from_millis(self.keepalive_interval_ms.max(floor)),
            timeout: Duration::from_millis(self.keepalive_idle_ms),
            while_idle: self.keepalive_without_calls && self.max_pings_without_data == 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint / channel builders
// ---------------------------------------------------------------------------

/// Compile `host:port` plus options into a tonic [`Endpoint`].
pub fn build_endpoint(endpoint: &str, options: &ChannelOptions) -> Result<Endpoint, SessionError> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| SessionError::Config(format!("endpoint {endpoint:?} is not host:port")))?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(SessionError::Config(format!(
            "endpoint {endpoint:?} is not host:port"
        )));
    }

    let scheme = match options.tls {
        TlsMaterial::None => "http",
        _ => "https",
    };
    let keepalive = options.resolved_keepalive();

    let mut ep = Endpoint::from_shared(format!("{scheme}://{endpoint}"))
        .map_err(|e| SessionError::Config(format!("endpoint {endpoint:?}: {e}")))?
        .http2_keep_alive_interval(keepalive.interval)
        .keep_alive_timeout(keepalive.timeout)
        .keep_alive_while_idle(keepalive.while_idle)
        .timeout(options.prepare_timeout_max)
        .tcp_nodelay(true);

    let tls_config = match &options.tls {
        TlsMaterial::None => None,
        TlsMaterial::SystemCa => Some(ClientTlsConfig::new().with_native_roots()),
        TlsMaterial::PemBytes(pem) => {
            Some(ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem)))
        }
        TlsMaterial::PemPath(path) => {
            let pem = std::fs::read(path).map_err(|e| {
                SessionError::Config(format!("read tls ca {}: {e}", path.display()))
            })?;
            Some(ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem)))
        }
    };
    if let Some(tls) = tls_config {
        ep = ep
            .tls_config(tls)
            .map_err(|e| SessionError::Config(format!("tls config: {e}")))?;
    }

    Ok(ep)
}

/// Build the channel itself. Lazy: the returned channel holds no socket
/// until the first call is issued on it.
pub fn build_channel(endpoint: &str, options: &ChannelOptions) -> Result<Channel, SessionError> {
    Ok(build_endpoint(endpoint, options)?.connect_lazy())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_interval_respects_ping_pacing_floor() {
        let opts = ChannelOptions {
            keepalive_interval_ms: 1_000,
            min_time_between_pings_ms: 15_000,
            min_ping_interval_without_data_ms: 20_000,
            ..ChannelOptions::default()
        };
        let ka = opts.resolved_keepalive();
        assert_eq!(ka.interval, Duration::from_millis(20_000));
    }

    #[test]
    fn finite_ping_budget_disables_idle_pings() {
        let opts = ChannelOptions {
            keepalive_without_calls: true,
            max_pings_without_data: 2,
            ..ChannelOptions::default()
        };
        assert!(!opts.resolved_keepalive().while_idle);

        let opts = ChannelOptions {
            keepalive_without_calls: true,
            max_pings_without_data: 0,
            ..ChannelOptions::default()
        };
        assert!(opts.resolved_keepalive().while_idle);
    }

    #[test]
    fn endpoint_requires_host_and_port() {
        let opts = ChannelOptions::default();
        assert!(build_endpoint("engine.example.com:443", &opts).is_ok());
        assert!(matches!(
            build_endpoint("engine.example.com", &opts),
            Err(SessionError::Config(_))
        ));
        assert!(matches!(
            build_endpoint(":443", &opts),
            Err(SessionError::Config(_))
        ));
        assert!(matches!(
            build_endpoint("host:notaport", &opts),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn missing_pem_path_is_a_config_error() {
        let opts = ChannelOptions {
            tls: TlsMaterial::PemPath(PathBuf::from("/nonexistent/ca.pem")),
            ..ChannelOptions::default()
        };
        assert!(matches!(
            build_endpoint("engine.example.com:443", &opts),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn message_caps_default_to_documented_values() {
        let opts = ChannelOptions::default();
        assert_eq!(opts.max_inbound_message_bytes, 100 * 1024 * 1024);
        assert_eq!(opts.max_outbound_message_bytes, 300 * 1024 * 1024);
    }
}
