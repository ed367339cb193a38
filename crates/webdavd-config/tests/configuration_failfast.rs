//! Invalid configuration documents are rejected before the daemon starts.

use std::fs;

use camino::Utf8PathBuf;
use rstest::rstest;
use tempfile::TempDir;

use webdavd_config::{Config, ConfigError, DaemonArgs, LogFormat};

use clap::Parser;

const LISTEN: &str = "[[server.listen]]\nport = 8080\n";

#[rstest]
#[case::empty_document("")]
#[case::empty_server_list("server = []")]
fn documents_without_servers_fail(#[case] text: &str) {
    assert!(matches!(
        Config::from_toml_str(text),
        Err(ConfigError::NoServers)
    ));
}

#[rstest]
fn servers_need_a_listen_entry() {
    let text = format!("[[server]]\n{LISTEN}[[server]]\nrap-timeout = 5\n");
    assert!(matches!(
        Config::from_toml_str(&text),
        Err(ConfigError::NoListen { server: 1 })
    ));
}

#[rstest]
#[case::unknown_key("[[server]]\nlisten-port = 80\n")]
#[case::negative_number("[[server]]\nmax-ip-connections = -1\n[[server.listen]]\nport = 80\n")]
#[case::port_out_of_range("[[server]]\n[[server.listen]]\nport = 70000\n")]
#[case::missing_port("[[server]]\n[[server.listen]]\nhost = \"localhost\"\n")]
#[case::bad_encryption("[[server]]\n[[server.listen]]\nport = 80\nencryption = \"rot13\"\n")]
#[case::malformed("[[server]\n")]
fn schema_violations_are_parse_errors(#[case] text: &str) {
    let error = Config::from_toml_str(text).expect_err("document must be rejected");
    assert!(
        matches!(error, ConfigError::Parse { .. }),
        "expected a parse error, got {error:?}"
    );
}

#[rstest]
fn tls_listeners_need_a_certificate() {
    let text = "[[server]]\n[[server.listen]]\nport = 443\nencryption = \"tls\"\n";
    assert!(matches!(
        Config::from_toml_str(text),
        Err(ConfigError::MissingCertificate { server: 0, port: 443 })
    ));
}

#[rstest]
fn certificates_satisfy_tls_listeners() {
    let text = concat!(
        "[[server]]\n[[server.listen]]\nport = 443\nencryption = \"tls\"\n",
        "[[server.ssl-cert]]\ncertificate = \"/etc/ssl/c.pem\"\nkey = \"/etc/ssl/k.pem\"\n",
        "chain = [\"/etc/ssl/i1.pem\", \"/etc/ssl/i2.pem\"]\n",
    );
    let config = Config::from_toml_str(text).expect("config loads");
    let bundle = config
        .servers()
        .first()
        .and_then(|server| server.certificates().first())
        .expect("bundle present");
    assert_eq!(bundle.chain().len(), 2);
}

#[rstest]
fn servers_must_share_the_restricted_user() {
    let text = format!("[[server]]\nrestricted = \"nobody\"\n{LISTEN}[[server]]\n{LISTEN}");
    let error = Config::from_toml_str(&text).expect_err("mismatch rejected");
    match error {
        ConfigError::RestrictedMismatch { first, other } => {
            assert_eq!(first.as_deref(), Some("nobody"));
            assert_eq!(other, None);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn missing_files_report_the_path() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = Utf8PathBuf::from_path_buf(temp_dir.path().join("absent.toml"))
        .expect("utf-8 temp path");
    match Config::load(&path) {
        Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a read error, got {other:?}"),
    }
}

#[rstest]
fn command_line_overrides_apply_to_the_loaded_file() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("webdavd.toml");
    fs::write(&path, format!("[[server]]\n{LISTEN}")).expect("write config");
    let path = path.to_str().expect("utf-8 temp path");

    let args = DaemonArgs::try_parse_from([
        "webdavd",
        "--config",
        path,
        "--log-filter",
        "webdavd=trace",
        "--log-format",
        "compact",
    ])
    .expect("arguments parse");
    let config = Config::load_from_args(&args).expect("config loads");
    assert_eq!(config.log_filter(), "webdavd=trace");
    assert_eq!(config.log_format(), LogFormat::Compact);
}
