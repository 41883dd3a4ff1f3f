use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use zrtt::{ClientSettings, ConnectFailurePolicy, TrailingBytePolicy, Validator, VerificationMode};

/// TLS 1.3 client: full handshake, then session resumption with 0-RTT early data.
#[derive(Parser, Debug)]
#[command(name = "zrtt")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host name used for SNI and certificate identity.
    #[arg(long, env = "ZRTT_HOST")]
    host: Option<String>,
    /// IP address actually connected to.
    #[arg(long, env = "ZRTT_IP")]
    ip: Option<String>,
    #[arg(short, long, env = "ZRTT_PORT")]
    port: Option<u16>,
    /// JSON settings file; flags override its values.
    #[arg(short, long, env = "ZRTT_CONFIG")]
    config: Option<PathBuf>,
    /// Accept any server certificate. Test servers only.
    #[arg(long, conflicts_with = "pin")]
    accept_any_cert: bool,
    /// Extra PEM trust anchors (repeatable).
    #[arg(long = "ca-file")]
    ca_files: Vec<PathBuf>,
    /// Trust the platform certificate store as well.
    #[arg(long)]
    native_roots: bool,
    /// Accept only certificates with this SHA-256 fingerprint (hex, repeatable).
    #[arg(long)]
    pin: Vec<String>,
    /// Bound for connect, poll, send and receive, in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Open sockets in non-blocking mode.
    #[arg(long)]
    non_blocking: bool,
    /// Drop the last received byte of each response.
    #[arg(long)]
    strip_trailing_byte: bool,
    /// Stop on a failed TCP connect instead of attempting the handshake.
    #[arg(long)]
    fail_fast_connect: bool,
    /// Payload sent after the first handshake.
    #[arg(long)]
    hello: Option<String>,
    /// Payload sent as early data on the second connection.
    #[arg(long)]
    early_data: Option<String>,
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<ClientSettings> {
        let mut settings = match &self.config {
            Some(path) => ClientSettings::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientSettings::default(),
        };

        if let Some(host) = &self.host {
            settings.endpoint.hostname.clone_from(host);
        }
        if let Some(ip) = &self.ip {
            settings.endpoint.ip.clone_from(ip);
        }
        if let Some(port) = self.port {
            settings.endpoint.port = port;
        }

        if self.accept_any_cert {
            settings.verification.mode = VerificationMode::AcceptAny;
        } else if !self.pin.is_empty() {
            settings.verification.mode = VerificationMode::PinnedIdentity;
            settings.verification.pins.clone_from(&self.pin);
        }
        settings.verification.ca_files.extend(self.ca_files.iter().cloned());
        settings.verification.native_roots |= self.native_roots;

        if self.timeout_ms.is_some() {
            settings.io.io_timeout_ms = self.timeout_ms;
        }
        settings.io.non_blocking |= self.non_blocking;
        if self.strip_trailing_byte {
            settings.io.trailing_byte = TrailingBytePolicy::Strip;
        }
        if self.fail_fast_connect {
            settings.connect_failure = ConnectFailurePolicy::Abort;
        }
        if let Some(hello) = &self.hello {
            settings.payloads.hello = unescape(hello);
        }
        if let Some(early) = &self.early_data {
            settings.payloads.early_data = unescape(early);
        }

        settings.validate().context("invalid settings")?;
        Ok(settings)
    }
}

/// Payloads given on the command line may spell newlines as `\n`.
fn unescape(raw: &str) -> String {
    raw.replace("\\r", "\r").replace("\\n", "\n")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = zrtt::init_logging(cli.verbose) {
        eprintln!("error: {e:#}");
        return ExitCode::from(2);
    }

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    tracing::info!(endpoint = %settings.endpoint, "starting");
    let mut stdout = std::io::stdout().lock();
    ExitCode::from(zrtt::run(settings, &mut stdout))
}
