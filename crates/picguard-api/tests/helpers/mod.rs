//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p picguard-api`.

#![allow(dead_code)]

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use picguard_api::setup::{build_state, routes};
use picguard_api::state::AppState;
use picguard_core::{BaseConfig, Config, UploadDirsConfig};
use tempfile::TempDir;

/// Test application: server, state, and the directory it writes into.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_dir(&self) -> &Path {
        self.state.store.base_path()
    }

    pub fn spool_dir(&self) -> &Path {
        self.state.spool.path()
    }

    /// Files currently in the upload directory.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        list_files(self.upload_dir())
    }

    /// Files left behind in the spool.
    pub fn spooled_files(&self) -> Vec<PathBuf> {
        list_files(self.spool_dir())
    }

    /// POST a single `image` part.
    pub async fn upload(&self, filename: &str, mime: &str, data: Vec<u8>) -> TestResponse {
        let form = MultipartForm::new().add_part(
            "image",
            Part::bytes(data).file_name(filename).mime_type(mime),
        );
        self.server.post("/upload").multipart(form).await
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

pub fn test_config(root: &Path) -> Config {
    Config {
        base: BaseConfig {
            server_port: 3000,
            environment: "test".to_string(),
            request_timeout_secs: 30,
        },
        uploads: UploadDirsConfig {
            upload_dir: root.join("uploads"),
            spool_dir: root.join("temp"),
            public_prefix: "/uploads".to_string(),
        },
    }
}

/// Setup a test app over fresh temporary directories.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    let state = build_state(config.clone()).await.unwrap();
    let router = routes::setup_routes(&config, state.clone()).unwrap();
    let server = TestServer::new(router).unwrap();

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}
