//! In-process TLS 1.3 server for integration tests.
//!
//! The server issues stateful session tickets, optionally accepts early data,
//! and answers each request (terminated by an empty line) with
//! `echo: <request>`.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, Issuer, KeyPair, KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::{ServerSessionMemoryCache, StoresServerSessions};
use rustls::{HandshakeKind, ServerConfig, ServerConnection};

pub const MAX_EARLY_DATA: u32 = 16 * 1024;
const SERVER_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test log subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A throwaway CA and a `localhost` leaf signed by it.
pub struct TestPki {
    pub ca_pem: String,
    pub leaf: CertificateDer<'static>,
    leaf_key: Vec<u8>,
}

impl TestPki {
    pub fn generate() -> Self {
        let ca_key = KeyPair::generate().expect("CA key");
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "zrtt test CA");
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let ca_cert = ca_params.self_signed(&ca_key).expect("self-signed CA");
        let issuer = Issuer::new(ca_params, ca_key);

        let leaf_key = KeyPair::generate().expect("leaf key");
        let mut leaf_params =
            CertificateParams::new(vec!["localhost".to_string()]).expect("leaf params");
        leaf_params
            .distinguished_name
            .push(DnType::CommonName, "localhost");
        let leaf_cert = leaf_params
            .signed_by(&leaf_key, &issuer)
            .expect("leaf signed by CA");

        Self {
            ca_pem: ca_cert.pem(),
            leaf: leaf_cert.der().clone(),
            leaf_key: leaf_key.serialize_der(),
        }
    }

    pub fn write_ca(&self, dir: &Path) -> PathBuf {
        let path = dir.join("ca.pem");
        std::fs::write(&path, &self.ca_pem).expect("write CA file");
        path
    }

    /// Server configuration sharing `storage` so sessions survive across
    /// configurations. `max_early_data` of 0 disables 0-RTT.
    pub fn server_config(
        &self,
        storage: Arc<dyn StoresServerSessions>,
        max_early_data: u32,
    ) -> Arc<ServerConfig> {
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.leaf_key.clone()));
        let mut config =
            ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
                .with_protocol_versions(&[&rustls::version::TLS13])
                .expect("TLS 1.3")
                .with_no_client_auth()
                .with_single_cert(vec![self.leaf.clone()], key)
                .expect("server certificate");
        config.session_storage = storage;
        config.max_early_data_size = max_early_data;
        Arc::new(config)
    }
}

pub fn session_storage() -> Arc<dyn StoresServerSessions> {
    ServerSessionMemoryCache::new(64)
}

/// What the server saw on one connection.
#[derive(Debug, Default, Clone)]
pub struct Observation {
    pub early_data: Vec<u8>,
    pub request: Vec<u8>,
    pub resumed: bool,
}

impl Observation {
    /// Early data followed by ordinary application data.
    pub fn full_request(&self) -> Vec<u8> {
        let mut all = self.early_data.clone();
        all.extend_from_slice(&self.request);
        all
    }
}

pub enum Behaviour {
    /// Serve each configuration once, in order.
    Echo(Vec<Arc<ServerConfig>>),
    /// Accept TCP and close without a handshake.
    CloseImmediately,
    /// Complete the handshake, then close without answering.
    HandshakeThenClose(Arc<ServerConfig>),
}

pub struct TestServer {
    pub port: u16,
    thread: JoinHandle<Vec<io::Result<Observation>>>,
}

impl TestServer {
    pub fn spawn(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let port = listener.local_addr().expect("local addr").port();
        let thread = thread::spawn(move || match behaviour {
            Behaviour::Echo(configs) => configs
                .into_iter()
                .map(|config| {
                    let (stream, _) = listener.accept()?;
                    serve(stream, config, true)
                })
                .collect(),
            Behaviour::CloseImmediately => {
                let accepted = listener.accept().map(|(stream, _)| drop(stream));
                vec![accepted.map(|()| Observation::default())]
            }
            Behaviour::HandshakeThenClose(config) => {
                let served = listener
                    .accept()
                    .and_then(|(stream, _)| serve(stream, config, false));
                vec![served]
            }
        });
        Self { port, thread }
    }

    pub fn join(self) -> Vec<Observation> {
        self.thread
            .join()
            .expect("server thread")
            .into_iter()
            .map(|served| served.expect("server connection"))
            .collect()
    }
}

fn flush(conn: &mut ServerConnection, stream: &mut TcpStream) -> io::Result<()> {
    while conn.wants_write() {
        conn.write_tls(stream)?;
    }
    Ok(())
}

/// Read and process one batch of records. Returns false at end of stream.
fn pump(conn: &mut ServerConnection, stream: &mut TcpStream) -> io::Result<bool> {
    if conn.read_tls(stream)? == 0 {
        return Ok(false);
    }
    conn.process_new_packets()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(true)
}

/// Keep processing records until the client goes away.
fn wait_for_close(conn: &mut ServerConnection, stream: &mut TcpStream) {
    while let Ok(true) = pump(conn, stream) {
        if flush(conn, stream).is_err() {
            break;
        }
    }
}

fn serve(mut stream: TcpStream, config: Arc<ServerConfig>, answer: bool) -> io::Result<Observation> {
    stream.set_read_timeout(Some(SERVER_IO_TIMEOUT))?;
    stream.set_write_timeout(Some(SERVER_IO_TIMEOUT))?;
    let mut conn = ServerConnection::new(config).map_err(io::Error::other)?;
    let mut seen = Observation::default();

    if !answer {
        while conn.is_handshaking() {
            flush(&mut conn, &mut stream)?;
            if !pump(&mut conn, &mut stream)? {
                return Ok(seen);
            }
        }
        flush(&mut conn, &mut stream)?;
        conn.send_close_notify();
        flush(&mut conn, &mut stream)?;
        wait_for_close(&mut conn, &mut stream);
        return Ok(seen);
    }

    let mut buf = [0u8; 4096];
    while !seen.full_request().ends_with(b"\n\n") {
        flush(&mut conn, &mut stream)?;
        if !pump(&mut conn, &mut stream)? {
            return Ok(seen);
        }
        if let Some(mut early) = conn.early_data() {
            early.read_to_end(&mut seen.early_data)?;
        }
        loop {
            match conn.reader().read(&mut buf) {
                Ok(0) => break,
                Ok(n) => seen.request.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
    }

    let mut reply = b"echo: ".to_vec();
    reply.extend_from_slice(&seen.full_request());
    conn.writer().write_all(&reply)?;
    flush(&mut conn, &mut stream)?;

    // The client's Finished may still be in flight when 0-RTT data was
    // answered straight away.
    wait_for_close(&mut conn, &mut stream);
    seen.resumed = conn.handshake_kind() == Some(HandshakeKind::Resumed);
    Ok(seen)
}
