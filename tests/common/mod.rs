use quillpad::auth::CredentialStore;
use quillpad::config::Config;
use quillpad::gateway::{self, AppState};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A real server bound to an OS-assigned port, backed by a throwaway
/// corpus directory and credentials file.
pub struct TestServer {
    pub url: String,
    pub data_dir: PathBuf,
    pub credentials_path: PathBuf,
    _tmp: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            data_dir: tmp.path().join("data"),
            credentials_path: tmp.path().join("users.conf"),
            session_ttl: Duration::from_secs(3600),
        };
        config.ensure_paths().unwrap();

        let state = AppState::new(&config);
        let app = gateway::router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            url: format!("http://{addr}"),
            data_dir: config.data_dir,
            credentials_path: config.credentials_path,
            _tmp: tmp,
        }
    }

    /// Place a document directly in the corpus.
    pub fn seed_document(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.data_dir.join(name), bytes).unwrap();
    }

    pub fn document_exists(&self, name: &str) -> bool {
        self.data_dir.join(name).is_file()
    }

    pub fn document_bytes(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.data_dir.join(name)).unwrap()
    }

    /// Append a credential record directly, bypassing sign-up
    /// validation: the store itself accepts anything, so tests can seed
    /// users like admin/secret.
    pub fn seed_user(&self, username: &str, password: &str) {
        CredentialStore::new(&self.credentials_path)
            .add(username, password)
            .unwrap();
    }
}

/// Client with redirects off (so 302s are observable) and a cookie store
/// (so the session survives across requests).
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap()
}

/// Seed admin/secret and sign the client's session in.
pub async fn sign_in_admin(server: &TestServer, client: &reqwest::Client) {
    server.seed_user("admin", "secret");
    let response = client
        .post(format!("{}/users/signin", server.url))
        .form(&[("uname", "admin"), ("psswd", "secret")])
        .send()
        .await
        .expect("sign-in request failed");
    assert_eq!(response.status(), 302);
}
