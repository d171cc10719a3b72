use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use tokio::sync::Notify;
use winit::event_loop::{EventLoop, EventLoopProxy};
use xcowsay_ipc::{Command, Response};

use crate::core::{run_display_worker, CowConfig, CowRequest, RequestQueue};
use crate::desktop::{CowsayGui, GuiEvent};
use crate::ipc::IpcServer;

/// Result of handling one daemon command.
#[derive(Debug)]
pub struct CommandOutcome {
    pub response: Response,
    pub quit: bool,
}

impl CommandOutcome {
    fn respond(response: Response) -> Self {
        Self {
            response,
            quit: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::respond(Response::Error {
            message: message.into(),
        })
    }
}

/// Apply a daemon command to the request queue. Display requests are queued
/// and answered straight away; they never wait for the cow.
pub fn process_command(queue: &RequestQueue, cmd: Command) -> CommandOutcome {
    let request = match cmd {
        Command::ShowCow { text } => CowRequest::say(text),
        Command::Think { text } => CowRequest::think(text),
        Command::Dream { path } => CowRequest::dream(path),
        Command::Status => {
            return CommandOutcome::respond(Response::Status {
                pending: queue.pending(),
                current: queue.in_flight().map(|r| r.info()),
            });
        }
        Command::Quit => {
            queue.close();
            return CommandOutcome {
                response: Response::Ok,
                quit: true,
            };
        }
    };

    match queue.enqueue(request) {
        Ok(len) => {
            tracing::debug!("Queued request, {} in queue", len);
            CommandOutcome::respond(Response::Ok)
        }
        Err(e) => CommandOutcome::error(e.to_string()),
    }
}

pub struct App {}

impl App {
    /// Show a single cow in this process and return once it has gone.
    pub fn run_once(config: CowConfig, cow_image: RgbaImage, request: CowRequest) -> Result<()> {
        let event_loop = EventLoop::<GuiEvent>::with_user_event()
            .build()
            .context("Failed to create event loop")?;

        let mut gui = CowsayGui::one_shot(config, cow_image, request);
        event_loop
            .run_app(&mut gui)
            .context("Event loop failed")?;

        match gui.take_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Serve display requests from the socket until told to quit.
    ///
    /// The main thread runs the GUI event loop, a tokio thread runs the IPC
    /// server, and a display worker feeds queued requests to the GUI one at
    /// a time.
    pub fn run_daemon(config: CowConfig, cow_image: RgbaImage, socket_path: PathBuf) -> Result<()> {
        let event_loop = EventLoop::<GuiEvent>::with_user_event()
            .build()
            .context("Failed to create event loop")?;
        let proxy = event_loop.create_proxy();
        let queue = Arc::new(RequestQueue::new());
        let shutdown = Arc::new(Notify::new());

        // Display worker: the only queue consumer. Not joined on exit, it
        // may be waiting on a popup the loop will never finish.
        {
            let queue = Arc::clone(&queue);
            let proxy = proxy.clone();
            std::thread::Builder::new()
                .name("display-worker".to_string())
                .spawn(move || run_display_worker(&queue, &proxy))
                .context("Failed to start display worker")?;
        }

        let ipc_thread = {
            let server = IpcServer::new(socket_path, Arc::clone(&queue), Arc::clone(&shutdown));
            let shutdown = Arc::clone(&shutdown);
            std::thread::Builder::new()
                .name("ipc".to_string())
                .spawn(move || match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt.block_on(Self::serve_until_quit(server, shutdown, proxy)),
                    Err(e) => {
                        tracing::error!("Failed to start tokio runtime: {}", e);
                        let _ = proxy.send_event(GuiEvent::Quit);
                    }
                })
                .context("Failed to start IPC thread")?
        };

        tracing::info!("xcowsay daemon running");
        let mut gui = CowsayGui::daemon(config, cow_image);
        let result = event_loop.run_app(&mut gui).context("Event loop failed");

        queue.close();
        shutdown.notify_one();
        if ipc_thread.join().is_err() {
            tracing::error!("IPC thread panicked");
        }
        tracing::info!("xcowsay daemon exiting");
        result
    }

    /// Accept clients until a `Quit` command arrives or the GUI side asks
    /// for shutdown, then stop the event loop. The socket file goes away
    /// with the server when the runtime is dropped.
    async fn serve_until_quit(mut server: IpcServer, shutdown: Arc<Notify>, proxy: EventLoopProxy<GuiEvent>) {
        match server.bind() {
            Ok(listener) => {
                tokio::spawn(Arc::new(server).serve(listener));
                shutdown.notified().await;
            }
            Err(e) => tracing::error!("Cannot accept requests: {:#}", e),
        }

        if proxy.send_event(GuiEvent::Quit).is_err() {
            tracing::debug!("GUI event loop already gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcowsay_ipc::CowMode;

    #[test]
    fn test_display_commands_are_queued_in_order() {
        let queue = RequestQueue::new();
        for cmd in [
            Command::ShowCow {
                text: "Moo".to_string(),
            },
            Command::Think {
                text: "Hmm".to_string(),
            },
            Command::Dream {
                path: "/tmp/grass.png".to_string(),
            },
        ] {
            let outcome = process_command(&queue, cmd);
            assert!(matches!(outcome.response, Response::Ok));
            assert!(!outcome.quit);
        }

        let modes: Vec<CowMode> = (0..3)
            .map(|_| {
                let head = queue.dequeue_blocking().unwrap();
                queue.complete_head();
                head.mode
            })
            .collect();
        assert_eq!(modes, vec![CowMode::Normal, CowMode::Think, CowMode::Dream]);
    }

    #[test]
    fn test_status_reports_queue() {
        let queue = RequestQueue::new();
        queue.enqueue(CowRequest::say("first")).unwrap();
        queue.enqueue(CowRequest::say("second")).unwrap();
        queue.dequeue_blocking().unwrap();

        match process_command(&queue, Command::Status).response {
            Response::Status { pending, current } => {
                assert_eq!(pending, 1);
                let current = current.unwrap();
                assert_eq!(current.content, "first");
                assert_eq!(current.mode, CowMode::Normal);
            }
            other => panic!("Wrong response: {:?}", other),
        }
    }

    #[test]
    fn test_status_when_idle() {
        let queue = RequestQueue::new();
        match process_command(&queue, Command::Status).response {
            Response::Status { pending, current } => {
                assert_eq!(pending, 0);
                assert!(current.is_none());
            }
            other => panic!("Wrong response: {:?}", other),
        }
    }

    #[test]
    fn test_quit_closes_queue() {
        let queue = RequestQueue::new();
        let outcome = process_command(&queue, Command::Quit);
        assert!(outcome.quit);
        assert!(queue.is_closed());

        let late = process_command(
            &queue,
            Command::ShowCow {
                text: "too late".to_string(),
            },
        );
        match late.response {
            Response::Error { message } => assert_eq!(message, "request queue is closed"),
            other => panic!("Wrong response: {:?}", other),
        }
    }
}
