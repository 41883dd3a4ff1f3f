mod support;

use support::{Behaviour, TestPki, TestServer, MAX_EARLY_DATA};
use zrtt_client::config::{ClientSettings, ServerEndpoint, TrailingBytePolicy, VerificationMode};
use zrtt_client::connect::tcp::{open, SocketOptions};
use zrtt_client::connect::{connect, connect_with_early_data, send};
use zrtt_client::response::{read_once, ReadOptions};
use zrtt_client::tls::{
    configure, EarlyDataOutcome, HandshakeKind, TlsEngine, TlsParameters, VerificationStrategy,
};
use zrtt_client::{Orchestrator, Outcome, Step};

fn settings_for(port: u16, pki: &TestPki, dir: &std::path::Path) -> ClientSettings {
    let mut settings =
        ClientSettings::default().with_endpoint(ServerEndpoint::new("localhost", "127.0.0.1", port));
    settings.verification.ca_files = vec![pki.write_ca(dir)];
    settings.io.io_timeout_ms = Some(10_000);
    settings
}

#[test]
fn both_phases_reach_shutdown_with_accepted_early_data() {
    support::init_tracing();
    let pki = TestPki::generate();
    let storage = support::session_storage();
    let config = pki.server_config(storage, MAX_EARLY_DATA);
    let server = TestServer::spawn(Behaviour::Echo(vec![config.clone(), config]));
    let dir = tempfile::tempdir().expect("tempdir");

    let mut orchestrator = Orchestrator::new(settings_for(server.port, &pki, dir.path()));
    let outcome = orchestrator.run();
    assert_eq!(outcome.exit_code(), 0);

    let report = match outcome {
        Outcome::Shutdown(report) => report,
        Outcome::Aborted { step, error } => panic!("aborted at {step}: {error}"),
    };
    assert_eq!(report.trail, Step::SEQUENCE.to_vec());
    assert_eq!(report.full.response.text(), "echo: hello\n\n");
    assert_eq!(report.early.response.text(), "echo: 0-RTT\n\n");
    assert!(!report.early.response.truncated);

    let first = report.full.handshake.as_ref().expect("phase 1 handshake");
    assert_eq!(first.kind, Some(HandshakeKind::Full));
    assert_eq!(first.early_data, EarlyDataOutcome::NotAttempted);

    let second = report.early.handshake.as_ref().expect("phase 2 handshake");
    assert_eq!(second.kind, Some(HandshakeKind::Resumed));
    assert_eq!(second.early_data, EarlyDataOutcome::Accepted);

    assert!(report.tickets_stored >= 1);
    assert_eq!(report.stats.connections_opened, 2);
    assert_eq!(report.stats.handshakes_completed, 2);
    assert_eq!(report.stats.resumed_handshakes, 1);
    assert_eq!(report.stats.early_data_accepted, 1);

    let seen = server.join();
    assert_eq!(seen.len(), 2);
    assert!(!seen[0].resumed);
    assert!(seen[0].early_data.is_empty());
    assert!(seen[1].resumed);
    assert_eq!(seen[1].early_data, b"0-RTT\n\n");
}

#[test]
fn rejected_early_data_is_resent_after_the_handshake() {
    let pki = TestPki::generate();
    let storage = support::session_storage();
    let server = TestServer::spawn(Behaviour::Echo(vec![
        pki.server_config(storage.clone(), MAX_EARLY_DATA),
        pki.server_config(storage, 0),
    ]));
    let dir = tempfile::tempdir().expect("tempdir");

    let outcome = Orchestrator::new(settings_for(server.port, &pki, dir.path())).run();
    let report = match outcome {
        Outcome::Shutdown(report) => report,
        Outcome::Aborted { step, error } => panic!("aborted at {step}: {error}"),
    };
    assert_eq!(report.early.early_data(), EarlyDataOutcome::Rejected);
    assert_eq!(report.early.response.text(), "echo: 0-RTT\n\n");
    assert_eq!(report.stats.early_data_rejected, 1);

    let seen = server.join();
    assert!(seen[1].early_data.is_empty());
    assert_eq!(seen[1].request, b"0-RTT\n\n");
}

#[test]
fn early_data_without_a_prior_handshake_falls_back() {
    let pki = TestPki::generate();
    let server = TestServer::spawn(Behaviour::Echo(vec![
        pki.server_config(support::session_storage(), MAX_EARLY_DATA),
    ]));

    let engine = TlsEngine::init().expect("engine");
    let params = TlsParameters {
        options: Default::default(),
        versions: Default::default(),
        verification: VerificationStrategy::AcceptAny,
    };
    let socket = open(SocketOptions::default()).expect("socket");
    let mut handle = configure(&engine, socket, "localhost", &params).expect("configure");

    let response = connect_with_early_data(
        &mut handle,
        "127.0.0.1",
        server.port,
        b"0-RTT\n\n",
        Default::default(),
        ReadOptions::default(),
    )
    .expect("reply without resumption");
    assert_eq!(response.text(), "echo: 0-RTT\n\n");

    let summary = handle.summary().expect("handshake finished").clone();
    assert_eq!(summary.kind, Some(HandshakeKind::Full));
    assert_eq!(summary.early_data, EarlyDataOutcome::NotAttempted);
    handle.close().expect("close");

    let seen = server.join();
    assert!(seen[0].early_data.is_empty());
    assert!(!seen[0].resumed);
    engine.shutdown().expect("shutdown");
}

#[test]
fn handshake_flag_is_per_connection() {
    let pki = TestPki::generate();
    let storage = support::session_storage();
    let config = pki.server_config(storage, MAX_EARLY_DATA);
    let server = TestServer::spawn(Behaviour::Echo(vec![config.clone(), config]));

    let engine = TlsEngine::init().expect("engine");
    let params = TlsParameters {
        options: Default::default(),
        versions: Default::default(),
        verification: VerificationStrategy::AcceptAny,
    };
    let read = ReadOptions {
        trailing_byte: TrailingBytePolicy::Strip,
        ..ReadOptions::default()
    };

    let socket = open(SocketOptions::default()).expect("socket");
    let mut first = configure(&engine, socket, "localhost", &params).expect("configure");
    assert!(!first.handshake_completed());
    connect(&mut first, "127.0.0.1", server.port, Default::default()).expect("handshake");
    assert!(first.handshake_completed());
    assert!(first.signal().try_take().is_some());
    send(&mut first, b"hello\n\n").expect("send");
    let response = read_once(&mut first, read).expect("reply");
    assert_eq!(response.text(), "echo: hello\n");
    assert_eq!(response.received, "echo: hello\n\n".len());
    assert_eq!(engine.live_sessions(), 1);
    first.close().expect("close");
    assert_eq!(engine.live_sessions(), 0);

    let socket = open(SocketOptions::default()).expect("socket");
    let mut second = configure(&engine, socket, "localhost", &params).expect("configure");
    assert!(!second.handshake_completed());
    let summary = connect(&mut second, "127.0.0.1", server.port, Default::default())
        .expect("resumed handshake");
    assert!(summary.is_resumed());
    send(&mut second, b"again\n\n").expect("send");
    read_once(&mut second, ReadOptions::default()).expect("reply");
    second.close().expect("close");

    server.join();
    engine.shutdown().expect("shutdown");
}

#[test]
fn second_handshake_with_cloned_parameters_resumes() {
    let pki = TestPki::generate();
    let config = pki.server_config(support::session_storage(), MAX_EARLY_DATA);
    let server = TestServer::spawn(Behaviour::Echo(vec![config.clone(), config]));

    let engine = TlsEngine::init().expect("engine");
    let params = TlsParameters {
        options: Default::default(),
        versions: Default::default(),
        verification: VerificationStrategy::AcceptAny,
    };

    let mut kinds = Vec::new();
    for request in [&b"one\n\n"[..], b"two\n\n"] {
        let socket = open(SocketOptions::default()).expect("socket");
        let mut handle = configure(&engine, socket, "localhost", &params.clone()).expect("configure");
        let summary = connect(&mut handle, "127.0.0.1", server.port, Default::default())
            .expect("handshake");
        kinds.push(summary.kind);
        send(&mut handle, request).expect("send");
        read_once(&mut handle, ReadOptions::default()).expect("reply");
        handle.close().expect("close");
    }

    assert_eq!(kinds, [Some(HandshakeKind::Full), Some(HandshakeKind::Resumed)]);
    assert!(engine.session_cache().tickets_taken() >= 1);
    let seen = server.join();
    assert!(!seen[0].resumed);
    assert!(seen[1].resumed);
    engine.shutdown().expect("shutdown");
}

#[test]
fn oversized_reply_is_flagged_as_truncated() {
    let pki = TestPki::generate();
    let server = TestServer::spawn(Behaviour::Echo(vec![
        pki.server_config(support::session_storage(), MAX_EARLY_DATA),
    ]));

    let engine = TlsEngine::init().expect("engine");
    let params = TlsParameters {
        options: Default::default(),
        versions: Default::default(),
        verification: VerificationStrategy::AcceptAny,
    };
    let socket = open(SocketOptions::default()).expect("socket");
    let mut handle = configure(&engine, socket, "localhost", &params).expect("configure");
    connect(&mut handle, "127.0.0.1", server.port, Default::default()).expect("handshake");
    send(&mut handle, b"a longer request\n\n").expect("send");

    let read = ReadOptions {
        buffer_size: 8,
        ..ReadOptions::default()
    };
    let response = read_once(&mut handle, read).expect("reply");
    assert_eq!(response.bytes.as_ref(), b"echo: a ");
    assert!(response.truncated);
    handle.close().expect("close");
    server.join();
}

#[test]
fn accept_any_mode_reaches_shutdown() {
    let pki = TestPki::generate();
    let config = pki.server_config(support::session_storage(), MAX_EARLY_DATA);
    let server = TestServer::spawn(Behaviour::Echo(vec![config.clone(), config]));

    let mut settings =
        ClientSettings::default().with_endpoint(ServerEndpoint::new("localhost", "127.0.0.1", server.port));
    settings.verification.mode = VerificationMode::AcceptAny;
    settings.io.non_blocking = true;

    let outcome = Orchestrator::new(settings).run();
    assert!(outcome.is_shutdown(), "{outcome:?}");
    server.join();
}
