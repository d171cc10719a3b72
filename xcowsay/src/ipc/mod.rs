mod client;
mod server;

pub use client::{request, socket_path, IpcClient};
pub use server::IpcServer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Notify;
    use xcowsay_ipc::{Command, CowMode, Response};

    use crate::core::RequestQueue;

    struct Daemon {
        rt: tokio::runtime::Runtime,
        queue: Arc<RequestQueue>,
        shutdown: Arc<Notify>,
    }

    fn start_daemon(path: &Path) -> Daemon {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let queue = Arc::new(RequestQueue::new());
        let shutdown = Arc::new(Notify::new());
        let mut server = IpcServer::new(path, Arc::clone(&queue), Arc::clone(&shutdown));

        let listener = {
            let _guard = rt.enter();
            server.bind().unwrap()
        };
        rt.spawn(Arc::new(server).serve(listener));
        Daemon {
            rt,
            queue,
            shutdown,
        }
    }

    #[test]
    fn test_display_commands_reach_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsay.sock");
        let daemon = start_daemon(&path);

        let response = request(
            &path,
            &Command::ShowCow {
                text: "Moo".to_string(),
            },
        )
        .unwrap();
        assert!(matches!(response, Response::Ok));
        request(
            &path,
            &Command::Think {
                text: "Hmm".to_string(),
            },
        )
        .unwrap();

        let head = daemon.queue.dequeue_blocking().unwrap();
        assert_eq!(head.content, "Moo");

        match request(&path, &Command::Status).unwrap() {
            Response::Status { pending, current } => {
                assert_eq!(pending, 1);
                let current = current.unwrap();
                assert_eq!(current.mode, CowMode::Normal);
                assert_eq!(current.content, "Moo");
            }
            other => panic!("Wrong response: {:?}", other),
        }
    }

    #[test]
    fn test_quit_answers_then_signals_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsay.sock");
        let daemon = start_daemon(&path);

        let shutdown = Arc::clone(&daemon.shutdown);
        let notified = daemon.rt.spawn(async move { shutdown.notified().await });

        assert!(matches!(request(&path, &Command::Quit).unwrap(), Response::Ok));
        daemon
            .rt
            .block_on(async { tokio::time::timeout(Duration::from_secs(5), notified).await })
            .unwrap()
            .unwrap();

        let err = request(
            &path,
            &Command::ShowCow {
                text: "too late".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("request queue is closed"));
    }

    #[test]
    fn test_several_commands_on_one_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsay.sock");
        let daemon = start_daemon(&path);

        let mut client = IpcClient::connect(&path).unwrap();
        for text in ["one", "two", "three"] {
            let response = client
                .send(&Command::Think {
                    text: text.to_string(),
                })
                .unwrap();
            assert!(matches!(response, Response::Ok));
        }
        assert_eq!(daemon.queue.pending(), 3);
    }

    #[test]
    fn test_invalid_command_gets_error_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsay.sock");
        let _daemon = start_daemon(&path);

        let mut stream = UnixStream::connect(&path).unwrap();
        writeln!(stream, "{{\"type\":\"moo\"}}").unwrap();
        let mut line = String::new();
        BufReader::new(&stream).read_line(&mut line).unwrap();

        let response: Response = serde_json::from_str(&line).unwrap();
        match response {
            Response::Error { message } => assert!(message.starts_with("Invalid command")),
            other => panic!("Wrong response: {:?}", other),
        }
    }

    #[test]
    fn test_bind_keeps_live_daemon_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsay.sock");
        let _daemon = start_daemon(&path);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut second = IpcServer::new(
            &path,
            Arc::new(RequestQueue::new()),
            Arc::new(Notify::new()),
        );
        {
            let _guard = rt.enter();
            assert!(second.bind().is_err());
        }
        drop(second);

        assert!(path.exists());
        assert!(request(&path, &Command::Status).is_ok());
    }

    #[test]
    fn test_bind_replaces_stale_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsay.sock");
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let _daemon = start_daemon(&path);
        assert!(request(&path, &Command::Status).is_ok());
    }

    #[test]
    fn test_socket_removed_when_server_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsay.sock");
        let daemon = start_daemon(&path);
        assert!(path.exists());

        drop(daemon);
        assert!(!path.exists());
    }

    #[test]
    fn test_connect_without_daemon_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(IpcClient::connect(&dir.path().join("absent.sock")).is_err());
    }

    #[test]
    fn test_socket_path_name() {
        let path = socket_path();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("xcowsay"));
        assert!(name.ends_with(".sock"));
    }
}
