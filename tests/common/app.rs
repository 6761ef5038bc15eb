use super::Backend;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// The compiled admin binary, wired to its own stub backend and session file.
pub struct AdminProcess {
    pub base_url: String,
    pub backend: Backend,
    session_path: PathBuf,
    child: Child,
}

impl AdminProcess {
    pub async fn start() -> Self {
        let backend = Backend::default();
        let api_url = super::spawn_detached(backend.clone());
        let port = super::free_port();
        let session_path = std::env::temp_dir().join(format!(
            "gym_admin_session_{}_{port}.json",
            std::process::id()
        ));

        let child = Command::new(env!("CARGO_BIN_EXE_gym_admin"))
            .env("PORT", port.to_string())
            .env("GYM_API_URL", api_url)
            .env("GYM_SESSION_PATH", &session_path)
            .env("RUST_LOG", "info")
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("start gym_admin binary");

        #[cfg(unix)]
        reap::on_exit(child.id());

        let process = Self {
            base_url: format!("http://127.0.0.1:{port}"),
            backend,
            session_path,
            child,
        };
        process.await_listening().await;
        process
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn await_listening(&self) {
        let client = reqwest::Client::new();
        for _ in 0..50 {
            let answered = client
                .get(self.url("/login"))
                .send()
                .await
                .is_ok_and(|resp| resp.status().is_success());
            if answered {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("admin server never answered on {}", self.base_url);
    }
}

impl Drop for AdminProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.session_path);
    }
}

/// Processes held in statics are never dropped, so they are signalled when
/// the test binary exits.
#[cfg(unix)]
mod reap {
    use std::sync::Mutex;

    static PIDS: Mutex<Vec<libc::pid_t>> = Mutex::new(Vec::new());

    pub fn on_exit(pid: u32) {
        let mut pids = PIDS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if pids.is_empty() {
            unsafe {
                libc::atexit(terminate_all);
            }
        }
        pids.push(pid as libc::pid_t);
    }

    extern "C" fn terminate_all() {
        let pids = PIDS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for pid in pids.iter() {
            unsafe {
                libc::kill(*pid, libc::SIGTERM);
            }
        }
    }
}
