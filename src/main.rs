//! Photo Booth CLI
//!
//! Runs the upload server, lists cameras, or captures and uploads a
//! single tagged photo.

use clap::{Parser, Subcommand};
use photo_booth::capture::{CaptureController, MediaDevices, MockDevices};
use photo_booth::config::FileConfig;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "photo-booth", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the upload server.
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind, overrides the config file.
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
        /// Upload directory, overrides the config file.
        #[arg(long)]
        upload_dir: Option<PathBuf>,
    },
    /// List available cameras.
    Devices {
        /// Use the synthetic camera backend.
        #[arg(long)]
        mock: bool,
    },
    /// Capture one photo and upload it.
    #[cfg(feature = "client")]
    Capture {
        /// Upload endpoint URL.
        #[arg(long, default_value = "http://localhost:8080/backend/upload")]
        endpoint: String,
        /// Device id to open instead of the default camera.
        #[arg(long)]
        device: Option<String>,
        /// Frames to preview before capturing.
        #[arg(long, default_value_t = 10)]
        warmup_frames: u32,
        /// Write the tag QR code to this SVG file.
        #[arg(long)]
        tag_svg: Option<PathBuf>,
        /// Use the synthetic camera backend.
        #[arg(long)]
        mock: bool,
    },
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Photo Booth v{}", photo_booth::VERSION);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        #[cfg(feature = "server")]
        Command::Serve { bind, upload_dir } => serve(config, bind, upload_dir),
        Command::Devices { mock } => {
            if mock {
                list_devices(MockDevices::new(2), config)
            } else {
                list_devices(native_devices()?, config)
            }
        }
        #[cfg(feature = "client")]
        Command::Capture {
            endpoint,
            device,
            warmup_frames,
            tag_svg,
            mock,
        } => {
            let options = CaptureOptions {
                endpoint,
                device,
                warmup_frames,
                tag_svg,
            };
            if mock {
                capture(MockDevices::new(2), config, options)
            } else {
                capture(native_devices()?, config, options)
            }
        }
    }
}

#[cfg(feature = "camera")]
fn native_devices() -> Result<photo_booth::capture::NativeDevices, Box<dyn Error>> {
    Ok(photo_booth::capture::NativeDevices::new())
}

#[cfg(not(feature = "camera"))]
fn native_devices() -> Result<MockDevices, Box<dyn Error>> {
    Err("built without camera support; rebuild with --features camera or pass --mock".into())
}

fn list_devices<D: MediaDevices>(media: D, config: FileConfig) -> Result<(), Box<dyn Error>> {
    let mut controller = CaptureController::new(media, config.capture);
    let devices = controller.list_devices();
    if devices.is_empty() {
        println!("No cameras found.");
    }
    for (i, device) in devices.iter().enumerate() {
        println!("{}: {} ({})", i, device.label, device.device_id);
    }
    Ok(())
}

/// Prints the status line, errors to stderr.
#[cfg(feature = "client")]
fn report(status: &photo_booth::capture::StatusLine) {
    if status.is_error() {
        eprintln!("{status}");
    } else {
        println!("{status}");
    }
}

#[cfg(feature = "server")]
fn serve(
    mut config: FileConfig,
    bind: Option<std::net::SocketAddr>,
    upload_dir: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    use photo_booth::metrics::UploadMetrics;
    use photo_booth::server::UploadServer;
    use photo_booth::upload::UploadService;

    if let Some(bind) = bind {
        config.server.bind_addr = bind;
    }
    if let Some(dir) = upload_dir {
        config.upload.dir = dir;
    }

    let service = UploadService::from_config(&config.upload);
    let server = UploadServer::new(config.server, service, UploadMetrics::new()?);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.run())?;
    Ok(())
}

#[cfg(feature = "client")]
struct CaptureOptions {
    endpoint: String,
    device: Option<String>,
    warmup_frames: u32,
    tag_svg: Option<PathBuf>,
}

#[cfg(feature = "client")]
fn capture<D: MediaDevices>(
    media: D,
    config: FileConfig,
    options: CaptureOptions,
) -> Result<(), Box<dyn Error>> {
    use photo_booth::client::HttpUploader;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let mut controller = CaptureController::new(media, config.capture);
    controller.list_devices();

    let started = controller.start_stream(options.device.as_deref());
    report(controller.status());
    started?;
    if let Some(device) = controller.streaming_device() {
        info!(device, frames = options.warmup_frames, "Warming up camera");
    }

    for _ in 0..options.warmup_frames {
        if interrupted.load(Ordering::SeqCst) {
            controller.shutdown();
            info!("Interrupted; camera released");
            return Ok(());
        }
        controller.preview()?;
    }

    let captured = controller.capture().map(|photo| photo.tag.clone());
    report(controller.status());
    let tag = captured?;
    println!("Tag: {}", tag);

    if let (Some(path), Some(rendered)) = (&options.tag_svg, controller.tag()) {
        std::fs::write(path, &rendered.svg)?;
        info!(path = %path.display(), "Tag QR code written");
    }

    let uploader = HttpUploader::new(options.endpoint);
    let runtime = tokio::runtime::Runtime::new()?;
    let uploaded = runtime.block_on(controller.upload(&uploader));
    report(controller.status());
    uploaded?;

    Ok(())
}
