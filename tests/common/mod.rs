//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use container_entrypoint::health::{DependencyProbe, Endpoint, TcpProbe};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Start accepting connections on `addr` only after `delay`.
pub fn start_delayed_listener(addr: SocketAddr, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = TcpListener::bind(addr).await.unwrap();
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let _ = socket.shutdown().await;
                }
                Err(_) => break,
            }
        }
    })
}

/// Real TCP probe aimed at a fixed local address, whatever host it is asked about.
///
/// Lets a non-loopback endpoint such as `db:3306` be served by a local listener.
pub struct RedirectingProbe {
    target: Endpoint,
    inner: TcpProbe,
    calls: AtomicU32,
}

impl RedirectingProbe {
    pub fn new(port: u16) -> Self {
        Self {
            target: Endpoint::new("127.0.0.1", port),
            inner: TcpProbe::new(Duration::from_millis(200)),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DependencyProbe for RedirectingProbe {
    async fn probe(&self, _endpoint: &Endpoint) -> io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.probe(&self.target).await
    }
}

/// An application tree with the directories a built image always has.
pub fn app_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("public")).unwrap();
    fs::create_dir_all(dir.path().join("bootstrap/cache")).unwrap();
    dir
}

/// Stand-in for `php artisan`.
///
/// Appends each subcommand to `$STUB_LOG`, prints a key for `key:generate`,
/// creates the link for `storage:link`, and fails the cache build named in
/// `$STUB_FAIL` with status 7.
pub fn write_artisan_stub(dir: &Path) -> PathBuf {
    let path = dir.join("artisan-stub.sh");
    fs::write(
        &path,
        r#"echo "$1" >> "$STUB_LOG"
case "$1" in
  key:generate)
    echo "base64:c3R1Yi1rZXktZm9yLXRlc3Rz"
    ;;
  storage:link)
    mkdir -p public storage/app/public && ln -s ../storage/app/public public/storage
    ;;
  config:cache|route:cache|view:cache)
    if [ "$1" = "$STUB_FAIL" ]; then
      echo "$1 failed" >&2
      exit 7
    fi
    ;;
esac
exit 0
"#,
    )
    .unwrap();
    path
}

/// Subcommands the stub has received, in order.
pub fn stub_calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
