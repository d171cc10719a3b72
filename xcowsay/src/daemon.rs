use std::fs::OpenOptions;
use std::os::fd::AsRawFd;

use anyhow::{Context, Result};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{fork, setsid, ForkResult};

/// Detach from the controlling terminal and keep running in the background.
///
/// Must be called before any other thread is started: only the calling
/// thread survives the fork. The parent process exits here.
pub fn detach() -> Result<()> {
    // SAFETY: no other threads exist yet, so the child starts from a
    // consistent copy of the process.
    match unsafe { fork() }.context("Failed to fork daemon")? {
        ForkResult::Parent { child } => {
            tracing::debug!("Daemon started as pid {}", child);
            std::process::exit(0);
        }
        ForkResult::Child => {}
    }

    setsid().context("Failed to start a new session")?;

    // SAFETY: ignoring a signal installs no handler code.
    unsafe { signal(Signal::SIGHUP, SigHandler::SigIgn) }.context("Failed to ignore SIGHUP")?;

    std::env::set_current_dir("/").context("Failed to change to the root directory")?;
    redirect_stdio_to_null()
}

fn redirect_stdio_to_null() -> Result<()> {
    let null = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .context("Failed to open /dev/null")?;
    let fd = null.as_raw_fd();

    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: both descriptors are open for the duration of the call.
        if unsafe { libc::dup2(fd, target) } < 0 {
            return Err(std::io::Error::last_os_error())
                .with_context(|| format!("Failed to redirect descriptor {}", target));
        }
    }
    Ok(())
}
