//! Unit tests for bootstrap, dispatch edge cases, and connection policies.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rstest::{fixture, rstest};
use tracing::Level;
use webdavd_config::ForwardTo;
use webdavd_protocol::{Opcode, TransferredHandle};

use crate::bootstrap::{BootstrapError, StaticConfigLoader, bootstrap_with};
use crate::content::Page;
use crate::dispatch::{Dispatcher, HttpConnectionHandler, RequestState, Upload, WriteHandle};
use crate::health::HealthReporter;
use crate::http::RequestHead;
use crate::rap::SpawningLauncher;
use crate::tests::support::{
    HealthEvent, RecordingHealthReporter, ScriptedLauncher, ServerFixture, StaticHomes,
    send_request,
};
use crate::transport::{ConnectionLimits, HttpListener, ListenerHandle};

#[fixture]
fn fixture() -> ServerFixture {
    ServerFixture::new()
}

fn head(method: &str, target: &str, credentials: Option<(&str, &str)>) -> RequestHead {
    let mut headers = vec![("Host".to_owned(), "dav.example.com".to_owned())];
    if let Some((user, secret)) = credentials {
        headers.push((
            "Authorization".to_owned(),
            format!("Basic {}", STANDARD.encode(format!("{user}:{secret}"))),
        ));
    }
    RequestHead::new(method, target, 1, headers)
}

fn complete_status(state: RequestState) -> u16 {
    match state {
        RequestState::Complete(response) => response.status(),
        RequestState::StreamingUpload(_) => panic!("expected a final response"),
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer poisoned")).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer poisoned")
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs<T>(action: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let outcome = tracing::subscriber::with_default(subscriber, action);
    (outcome, logs.text())
}

struct RunningListener {
    handle: Option<ListenerHandle>,
    address: std::net::SocketAddr,
}

impl Drop for RunningListener {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

fn serve(
    fixture: &ServerFixture,
    limits: Arc<ConnectionLimits>,
    forward_to: Option<ForwardTo>,
) -> RunningListener {
    serve_with(fixture, ScriptedLauncher::filesystem(), limits, forward_to)
}

fn serve_with(
    fixture: &ServerFixture,
    launcher: ScriptedLauncher,
    limits: Arc<ConnectionLimits>,
    forward_to: Option<ForwardTo>,
) -> RunningListener {
    let dispatcher = Dispatcher::new(fixture.context(), launcher, StaticHomes::new(fixture.home()));
    let handler = HttpConnectionHandler::new(Arc::new(dispatcher), limits, forward_to);
    let listener = HttpListener::bind_host("127.0.0.1", 0).expect("bind listener");
    let address = listener.local_addr();
    let handle = listener.start(Arc::new(handler)).expect("start listener");
    RunningListener {
        handle: Some(handle),
        address,
    }
}

#[rstest]
fn bootstrap_loads_every_server(fixture: ServerFixture) {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let loader = StaticConfigLoader::new(fixture.config());
    let daemon = bootstrap_with(&loader, Arc::clone(&reporter) as Arc<dyn HealthReporter>)
        .expect("bootstrap succeeds");
    assert_eq!(daemon.server_count(), 1);
    assert_eq!(
        reporter.events(),
        [HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[rstest]
fn bootstrap_reports_missing_pages(fixture: ServerFixture) {
    fixture.remove_page(Page::NotFound);
    let reporter = Arc::new(RecordingHealthReporter::default());
    let loader = StaticConfigLoader::new(fixture.config());
    let error = bootstrap_with(&loader, Arc::clone(&reporter) as Arc<dyn HealthReporter>)
        .expect_err("a missing page is fatal");
    assert!(matches!(error, BootstrapError::Content { server: 0, .. }));
    assert!(matches!(
        reporter.events().last(),
        Some(HealthEvent::BootstrapFailed(_))
    ));
}

#[rstest]
#[case::denied(("mallory", "hunter2-secret"), 401)]
#[case::accepted(("alice", "wonderland"), 404)]
fn secrets_never_reach_the_logs(
    fixture: ServerFixture,
    #[case] credentials: (&str, &str),
    #[case] expected: u16,
) {
    let launcher = ScriptedLauncher::filesystem();
    let dispatcher = Dispatcher::new(
        fixture.context(),
        launcher.clone(),
        StaticHomes::new(fixture.home()),
    );
    let request = head("GET", "/missing.txt", Some(credentials));
    let (state, logs) = capture_logs(|| dispatcher.start(&request));
    assert_eq!(complete_status(state), expected);
    assert!(!logs.is_empty(), "dispatch should log its outcome");
    assert!(!logs.contains(credentials.1), "secret leaked into: {logs}");
    assert_eq!(launcher.log().launches(), launcher.log().releases());
}

#[rstest]
fn missing_host_is_rejected_without_spawning(fixture: ServerFixture) {
    let launcher = ScriptedLauncher::filesystem();
    let dispatcher = Dispatcher::new(
        fixture.context(),
        launcher.clone(),
        StaticHomes::new(fixture.home()),
    );
    let request = RequestHead::new("GET", "/a.txt", 1, Vec::new());
    assert_eq!(complete_status(dispatcher.start(&request)), 400);
    assert_eq!(launcher.log().launches(), 0);
}

#[rstest]
fn malformed_request_replies_are_server_errors(fixture: ServerFixture) {
    let launcher = ScriptedLauncher::failing_with(Opcode::RespondBadClientRequest);
    let dispatcher = Dispatcher::new(
        fixture.context(),
        launcher.clone(),
        StaticHomes::new(fixture.home()),
    );
    let request = head("GET", "/a.txt", Some(("alice", "wonderland")));
    assert_eq!(complete_status(dispatcher.start(&request)), 500);
    assert_eq!(launcher.log().releases(), 1);
}

#[rstest]
fn unstartable_rap_binaries_are_server_errors(fixture: ServerFixture) {
    let launcher = SpawningLauncher::new("/nonexistent/webdavd-rap", Duration::from_secs(1));
    let dispatcher = Dispatcher::new(fixture.context(), launcher, StaticHomes::new(fixture.home()));
    let request = head("GET", "/a.txt", Some(("alice", "wonderland")));
    assert_eq!(complete_status(dispatcher.start(&request)), 500);
}

#[rstest]
fn query_strings_do_not_reach_the_rap(fixture: ServerFixture) {
    fixture.write_home_file("a.txt", b"a");
    let launcher = ScriptedLauncher::filesystem();
    let dispatcher = Dispatcher::new(
        fixture.context(),
        launcher.clone(),
        StaticHomes::new(fixture.home()),
    );
    let request = head("GET", "/a.txt?version=2", Some(("alice", "wonderland")));
    assert_eq!(complete_status(dispatcher.start(&request)), 200);
    let requested: Vec<String> = launcher
        .log()
        .requests()
        .into_iter()
        .map(|(_, _, path)| path)
        .collect();
    assert_eq!(requested, [fixture.home().join("a.txt").into_string()]);
}

#[rstest]
fn a_short_write_fails_the_upload_for_good(fixture: ServerFixture) {
    let full = OpenOptions::new()
        .write(true)
        .open("/dev/full")
        .expect("open /dev/full");
    let mut upload = Upload::new(
        WriteHandle::new(TransferredHandle::from(full)),
        "/home/alice/upload.txt".to_owned(),
    );
    upload.write_chunk(b"first");
    upload.write_chunk(b"second");
    upload.write_chunk(b"third");
    let context = fixture.context();
    assert_eq!(upload.finish(&context).status(), 507);
}

#[rstest]
fn malformed_chunks_after_a_failed_write_still_get_507(fixture: ServerFixture) {
    let running = serve_with(
        &fixture,
        ScriptedLauncher::sink_at("/dev/full"),
        ConnectionLimits::new(4),
        None,
    );
    let authorization = STANDARD.encode("alice:wonderland");
    let request = format!(
        "PUT /upload.txt HTTP/1.1\r\nHost: dav.example.com\r\n\
         Authorization: Basic {authorization}\r\nTransfer-Encoding: chunked\r\n\r\n\
         5\r\nhello\r\nzz\r\nworld\r\n0\r\n\r\n"
    );
    let reply = send_request(running.address, request.as_bytes()).expect("a response");
    assert_eq!(reply.status, 507);
}

#[rstest]
fn malformed_chunks_before_any_failure_get_400(fixture: ServerFixture) {
    let running = serve(&fixture, ConnectionLimits::new(4), None);
    let authorization = STANDARD.encode("alice:wonderland");
    let request = format!(
        "PUT /upload.txt HTTP/1.1\r\nHost: dav.example.com\r\n\
         Authorization: Basic {authorization}\r\nTransfer-Encoding: chunked\r\n\r\n\
         5\r\nhello\r\nzz\r\n"
    );
    let reply = send_request(running.address, request.as_bytes()).expect("a response");
    assert_eq!(reply.status, 400);
}

#[rstest]
fn read_only_upload_grants_are_server_errors(fixture: ServerFixture) {
    fixture.write_home_file("locked.txt", b"keep");
    let launcher = ScriptedLauncher::read_only_at(fixture.home().join("locked.txt"));
    let dispatcher = Dispatcher::new(
        fixture.context(),
        launcher.clone(),
        StaticHomes::new(fixture.home()),
    );
    let request = head("PUT", "/locked.txt", Some(("alice", "wonderland")));
    assert_eq!(complete_status(dispatcher.start(&request)), 500);
    assert_eq!(launcher.log().releases(), 1);
}

#[rstest]
fn forwarding_listeners_redirect_every_request(fixture: ServerFixture) {
    let forward = ForwardTo::new(Some("mirror.example.com".to_owned()), 8443, None);
    let running = serve(&fixture, ConnectionLimits::new(4), Some(forward));
    let reply = send_request(
        running.address,
        b"GET /docs/a.txt?x=1 HTTP/1.1\r\nHost: dav.example.com\r\n\r\n",
    )
    .expect("a response");
    assert_eq!(reply.status, 301);
    assert_eq!(
        reply.header("Location"),
        Some("http://mirror.example.com:8443/docs/a.txt")
    );
}

#[rstest]
fn connections_beyond_the_per_address_cap_get_503(fixture: ServerFixture) {
    let limits = ConnectionLimits::new(1);
    let running = serve(&fixture, Arc::clone(&limits), None);

    let idle = TcpStream::connect(running.address).expect("first connection");
    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let deadline = Instant::now() + Duration::from_secs(5);
    while limits.active(loopback) == 0 {
        assert!(Instant::now() < deadline, "first connection never admitted");
        thread::sleep(Duration::from_millis(10));
    }

    let reply = send_request(
        running.address,
        b"GET / HTTP/1.1\r\nHost: dav.example.com\r\n\r\n",
    )
    .expect("a response");
    assert_eq!(reply.status, 503);
    drop(idle);
}

#[rstest]
fn oversized_heads_get_431(fixture: ServerFixture) {
    let running = serve(&fixture, ConnectionLimits::new(4), None);
    let padding = "a".repeat(crate::http::MAX_HEAD_BYTES + 1);
    let request = format!("GET / HTTP/1.1\r\nHost: dav.example.com\r\nX-Pad: {padding}\r\n\r\n");
    let reply = send_request(running.address, request.as_bytes()).expect("a response");
    assert_eq!(reply.status, 431);
}
