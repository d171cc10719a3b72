mod app;
mod assets;
mod core;
mod daemon;
mod desktop;
mod effect;
mod ipc;
mod platform;
mod popup;
mod render;

use std::io::Read;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use tracing_subscriber::EnvFilter;
use xcowsay_ipc::{Command, CowMode, Response};

use crate::core::{font_scale_for, keys, load_config_file, CowConfig, CowRequest, Settings};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const MAX_STDIN: usize = 4096;
const COW_SIZES: [&str; 3] = ["small", "med", "large"];

/// Display a cow on your desktop with a message
#[derive(FromArgs, Default)]
struct Cli {
    /// message to display; read from stdin when omitted
    #[argh(positional, greedy)]
    message: Vec<String>,

    /// number of seconds to display the message for (0 waits for a click)
    #[argh(option, short = 't')]
    time: Option<i64>,

    /// milliseconds per word when computing the display time
    #[argh(option, short = 'r')]
    reading_speed: Option<i64>,

    /// image file to dream about instead of a message
    #[argh(option, short = 'd')]
    dream: Option<String>,

    /// display a thought bubble rather than a speech bubble
    #[argh(switch)]
    think: bool,

    /// run in the background and queue requests from other invocations
    #[argh(switch)]
    daemon: bool,

    /// keep the daemon in the foreground and log debug output
    #[argh(switch)]
    debug: bool,

    /// print version information and exit
    #[argh(switch, short = 'v')]
    version: bool,

    /// size of the cow: small, med or large
    #[argh(option)]
    cow_size: Option<String>,

    /// message font as a Pango description; a trailing point size sets the
    /// text scale
    #[argh(option, short = 'f')]
    font: Option<String>,

    /// use a different image instead of the cow
    #[argh(option, short = 'i')]
    image: Option<String>,

    /// index of the monitor to display on
    #[argh(option)]
    monitor: Option<i64>,

    /// position of the cow on the monitor, as X,Y
    #[argh(option)]
    at: Option<String>,

    /// offset of the bubble from its default position, as X,Y
    #[argh(option)]
    bubble_at: Option<String>,

    /// put the bubble on the left of the cow
    #[argh(switch)]
    left: bool,

    /// do not wrap long lines
    #[argh(switch)]
    no_wrap: bool,

    /// print the state of the running daemon
    #[argh(switch)]
    status: bool,

    /// stop the running daemon
    #[argh(switch)]
    quit: bool,
}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    if cli.version {
        print_version();
        return Ok(());
    }

    init_logging(cli.debug);

    let socket_path = ipc::socket_path();
    if cli.status {
        return print_status(ipc::request(&socket_path, &Command::Status)?);
    }
    if cli.quit {
        ipc::request(&socket_path, &Command::Quit)?;
        println!("xcowsay daemon stopping");
        return Ok(());
    }

    let mut settings = Settings::with_defaults();
    if let Some(path) = core::default_config_path() {
        load_config_file(&mut settings, &path);
    }
    apply_cli_overrides(&mut settings, &cli)?;
    let config = CowConfig::from_settings(&settings)?;

    if cli.daemon {
        if ipc::IpcClient::connect(&socket_path).is_ok() {
            bail!("xcowsay daemon already running on {:?}", socket_path);
        }
        if !cli.debug {
            daemon::detach()?;
        }
        let cow_image = assets::load_cow_image(&config.image)?;
        return app::App::run_daemon(config, cow_image, socket_path);
    }

    let request = build_request(&cli)?;
    match ipc::request(&socket_path, &Command::from_request(request.mode, &request.content)) {
        Ok(_) => {
            tracing::debug!("Request handed to daemon");
            Ok(())
        }
        Err(e) => {
            tracing::debug!("No daemon available, displaying directly: {:#}", e);
            let cow_image = assets::load_cow_image(&config.image)?;
            app::App::run_once(config, cow_image, request)
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_version() {
    println!("xcowsay {}", VERSION);
    println!("Copyright (C) 2008 Nick Gasson");
    println!("This program comes with ABSOLUTELY NO WARRANTY. This is free software, and");
    println!("you are welcome to redistribute it under certain conditions. See the GNU");
    println!("General Public Licence for details.");
}

fn print_status(response: Response) -> Result<()> {
    match response {
        Response::Status { pending, current } => {
            match current {
                Some(info) => println!("Showing: {:?} {}", info.mode, info.content),
                None => println!("Showing: nothing"),
            }
            println!("Pending: {}", pending);
            Ok(())
        }
        other => bail!("Unexpected response: {:?}", other),
    }
}

fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) -> Result<()> {
    if let Some(secs) = cli.time {
        if secs < 0 {
            bail!("Display time must not be negative: {}", secs);
        }
        settings.set_int(keys::DISPLAY_TIME, secs.saturating_mul(1000))?;
    }
    if let Some(speed) = cli.reading_speed {
        settings.set_int(keys::READING_SPEED, speed)?;
    }
    if let Some(size) = &cli.cow_size {
        if !COW_SIZES.contains(&size.as_str()) {
            bail!("Invalid cow size {:?} (expected small, med or large)", size);
        }
        settings.set_string(keys::COW_SIZE, size.as_str())?;
    }
    if let Some(font) = &cli.font {
        settings.set_string(keys::FONT, font.as_str())?;
        if let Some(scale) = font_scale_for(font) {
            settings.set_int(keys::FONT_SCALE, i64::from(scale))?;
        }
    }
    if let Some(image) = &cli.image {
        settings.set_string(keys::ALT_IMAGE, image.as_str())?;
    }
    if let Some(monitor) = cli.monitor {
        settings.set_int(keys::MONITOR, monitor)?;
    }
    if let Some(at) = &cli.at {
        let (x, y) = parse_point(at)?;
        if x < 0 || y < 0 {
            bail!("Cow position must not be negative: {}", at);
        }
        settings.set_int(keys::COW_X, x)?;
        settings.set_int(keys::COW_Y, y)?;
    }
    if let Some(bubble_at) = &cli.bubble_at {
        let (x, y) = parse_point(bubble_at)?;
        settings.set_int(keys::BUBBLE_X, x)?;
        settings.set_int(keys::BUBBLE_Y, y)?;
    }
    if cli.left {
        settings.set_bool(keys::LEFT, true)?;
    }
    if cli.no_wrap {
        settings.set_bool(keys::WRAP, false)?;
    }
    Ok(())
}

/// Parse an `X,Y` pair.
fn parse_point(s: &str) -> Result<(i64, i64)> {
    let (x, y) = s
        .split_once(',')
        .with_context(|| format!("Expected X,Y but found {:?}", s))?;
    let x = x
        .trim()
        .parse()
        .with_context(|| format!("Invalid X coordinate in {:?}", s))?;
    let y = y
        .trim()
        .parse()
        .with_context(|| format!("Invalid Y coordinate in {:?}", s))?;
    Ok((x, y))
}

fn build_request(cli: &Cli) -> Result<CowRequest> {
    if let Some(dream) = &cli.dream {
        let path = assets::resolve_dream_file(dream)?;
        return Ok(CowRequest::dream(path.to_string_lossy()));
    }

    let text = if cli.message.is_empty() {
        read_bounded(std::io::stdin().lock(), MAX_STDIN)?
    } else {
        cli.message.join(" ")
    };
    let mode = if cli.think {
        CowMode::Think
    } else {
        CowMode::Normal
    };
    Ok(CowRequest::new(text, mode))
}

/// Read at most `limit` bytes. Filling the limit means input was cut off, so
/// the last byte is dropped as well.
fn read_bounded(reader: impl Read, limit: usize) -> Result<String> {
    let mut data = Vec::with_capacity(limit);
    reader
        .take(limit as u64)
        .read_to_end(&mut data)
        .context("Failed to read message from stdin")?;
    if data.len() == limit {
        tracing::warn!("Excess input truncated");
        data.pop();
    }
    Ok(String::from_utf8_lossy(&data).into_owned())
}
