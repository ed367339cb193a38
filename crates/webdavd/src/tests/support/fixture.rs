//! Filesystem fixture holding a server's pages, MIME table, and one home.

use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use webdavd_config::Config;

use crate::content::Page;
use crate::context::ServerContext;
use crate::dispatch::{DispatchError, HomeDirectories};

/// Listen entry on an ephemeral loopback port.
pub const LOOPBACK_LISTEN: &str = "[[server.listen]]\nhost = \"127.0.0.1\"\nport = 0\n";

const MIME_TABLE: &str = "# test table\ntext/plain\ttxt text\ntext/html\thtml htm\n";

/// Temporary server root with `pages/`, `mime.types`, and `home/`.
#[derive(Debug)]
pub struct ServerFixture {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl ServerFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temporary directory");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temporary path is UTF-8");
        let pages = root.join("pages");
        fs::create_dir_all(&pages).expect("create pages directory");
        for page in Page::ALL {
            fs::write(
                pages.join(page.file_name()),
                format!("<html>{}</html>\n", page.status()),
            )
            .expect("write static page");
        }
        fs::write(root.join("mime.types"), MIME_TABLE).expect("write MIME table");
        fs::create_dir_all(root.join("home")).expect("create home directory");
        Self { _dir: dir, root }
    }

    /// Home directory of the test user.
    pub fn home(&self) -> Utf8PathBuf {
        self.root.join("home")
    }

    /// Writes `contents` below the home directory, creating parents.
    pub fn write_home_file(&self, relative: &str, contents: &[u8]) -> Utf8PathBuf {
        let path = self.home().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write home file");
        path
    }

    /// Deletes one static page so content loading fails.
    pub fn remove_page(&self, page: Page) {
        fs::remove_file(self.root.join("pages").join(page.file_name())).expect("remove page");
    }

    /// A configuration document using this fixture's content and `listen`.
    pub fn config_text(&self, listen: &str) -> String {
        format!(
            "[[server]]\n\
             mime-file = \"{root}/mime.types\"\n\
             static-response-dir = \"{root}/pages/\"\n\
             rap-binary = \"{root}/no-such-rap\"\n\
             max-ip-connections = 4\n\
             {listen}",
            root = self.root
        )
    }

    pub fn config(&self) -> Config {
        Config::from_toml_str(&self.config_text(LOOPBACK_LISTEN))
            .expect("fixture configuration is valid")
    }

    pub fn context(&self) -> Arc<ServerContext> {
        let server = self
            .config()
            .servers()
            .first()
            .cloned()
            .expect("fixture has one server");
        Arc::new(ServerContext::load(server).expect("fixture content loads"))
    }
}

/// Resolves `alice` to a fixed directory and nobody else.
#[derive(Debug, Clone)]
pub struct StaticHomes {
    home: Utf8PathBuf,
}

impl StaticHomes {
    pub fn new(home: Utf8PathBuf) -> Self {
        Self { home }
    }
}

impl HomeDirectories for StaticHomes {
    fn home_of(&self, user: &str) -> Result<Utf8PathBuf, DispatchError> {
        if user == "alice" {
            Ok(self.home.clone())
        } else {
            Err(DispatchError::UnknownUser {
                user: user.to_owned(),
            })
        }
    }
}
