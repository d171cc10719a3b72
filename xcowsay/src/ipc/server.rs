use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

use xcowsay_ipc::{Command, Response};

use crate::app::process_command;
use crate::core::RequestQueue;

/// Daemon end of the socket. Every line a client writes is one JSON
/// `Command`; each is answered with one JSON `Response` line.
///
/// Display commands go straight onto the request queue. A `Quit` command
/// fires `shutdown` once its reply has been written.
pub struct IpcServer {
    socket_path: PathBuf,
    queue: Arc<RequestQueue>,
    shutdown: Arc<Notify>,
    bound: bool,
}

impl IpcServer {
    pub fn new(socket_path: impl Into<PathBuf>, queue: Arc<RequestQueue>, shutdown: Arc<Notify>) -> Self {
        Self {
            socket_path: socket_path.into(),
            queue,
            shutdown,
            bound: false,
        }
    }

    /// Bind the socket. A leftover socket file is replaced only when no
    /// daemon answers on it.
    pub fn bind(&mut self) -> Result<UnixListener> {
        match std::os::unix::net::UnixStream::connect(&self.socket_path) {
            Ok(_) => bail!("Another daemon is listening on {:?}", self.socket_path),
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                tracing::debug!("Removing stale socket {:?}", self.socket_path);
                std::fs::remove_file(&self.socket_path)
                    .with_context(|| format!("Failed to remove stale socket {:?}", self.socket_path))?;
            }
            Err(_) => {}
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind {:?}", self.socket_path))?;
        self.bound = true;
        tracing::info!("Listening for requests on {:?}", self.socket_path);
        Ok(listener)
    }

    pub async fn serve(self: Arc<Self>, listener: UnixListener) {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    tracing::warn!("Failed to accept client: {}", e);
                    continue;
                }
            };
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.serve_client(stream).await {
                    tracing::warn!("Client connection failed: {:#}", e);
                }
            });
        }
    }

    async fn serve_client(&self, stream: UnixStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let cmd = match serde_json::from_str::<Command>(line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    let response = Response::Error {
                        message: format!("Invalid command: {}", e),
                    };
                    reply(&mut writer, &response).await?;
                    continue;
                }
            };

            tracing::debug!("Client command: {:?}", cmd);
            let outcome = process_command(&self.queue, cmd);
            reply(&mut writer, &outcome.response).await?;
            if outcome.quit {
                self.shutdown.notify_one();
            }
        }
        Ok(())
    }
}

async fn reply(writer: &mut OwnedWriteHalf, response: &Response) -> Result<()> {
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n');
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        if self.bound {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}
