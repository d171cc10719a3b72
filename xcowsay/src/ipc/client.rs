use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use xcowsay_ipc::{Command, Response};

const SOCKET_NAME: &str = "xcowsay.sock";
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the daemon listens: the per-user runtime directory when there is
/// one, else a per-user name in the temp directory.
pub fn socket_path() -> PathBuf {
    match dirs::runtime_dir() {
        Some(dir) => dir.join(SOCKET_NAME),
        None => std::env::temp_dir().join(format!("xcowsay-{}.sock", nix::unistd::getuid())),
    }
}

pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    pub fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Failed to connect to xcowsay daemon at {:?}", path))?;
        stream.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        Ok(Self { stream })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        let json = serde_json::to_string(cmd)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        let mut reader = BufReader::new(&self.stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.is_empty() {
            bail!("Daemon closed the connection");
        }

        let response: Response = serde_json::from_str(&line)?;
        Ok(response)
    }
}

/// Send one command to the daemon at `path`, turning an error response into
/// an `Err`.
pub fn request(path: &Path, cmd: &Command) -> Result<Response> {
    let mut client = IpcClient::connect(path)?;
    match client.send(cmd)? {
        Response::Error { message } => bail!("Daemon refused request: {}", message),
        response => Ok(response),
    }
}
