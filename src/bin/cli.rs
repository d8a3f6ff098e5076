use anyhow::{bail, Context, Result};
use camerahelper::{
    CameraBackend, CameraConfig, CameraError, CameraEvent, CameraFacing, CameraHelper,
    CaptureResult, ChannelListener, HelperSettings, NativeBackend, OffscreenSurface,
    PictureEncoding,
};
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const USAGE: &str = concat!(
    "Usage: camerahelper-cli <list-devices|capture|preview> ",
    "[--facing front|back] [--raw] [--output <path>] [--settings <path>] [--json]"
);

#[tokio::main]
async fn main() -> Result<()> {
    camerahelper::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "list-devices" => cmd_list_devices(&args),
        "capture" => cmd_capture(&Options::parse(&args[2..])?).await,
        "preview" => cmd_preview(&Options::parse(&args[2..])?).await,
        other => {
            eprintln!("Unknown command: {}\n{}", other, USAGE);
            std::process::exit(1);
        }
    }
}

struct Options {
    facing: CameraFacing,
    encoding: PictureEncoding,
    output: Option<PathBuf>,
    settings: Option<PathBuf>,
    json: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self> {
        // Desktop webcams face the user
        let mut options = Options {
            facing: CameraFacing::Front,
            encoding: PictureEncoding::Compressed,
            output: None,
            settings: None,
            json: false,
        };

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--facing" => {
                    i += 1;
                    options.facing = match args.get(i).map(String::as_str) {
                        Some("front") => CameraFacing::Front,
                        Some("back") => CameraFacing::Back,
                        other => bail!("--facing expects front or back, got {:?}", other),
                    };
                }
                "--raw" => options.encoding = PictureEncoding::RawPlanar,
                "--output" => {
                    i += 1;
                    options.output = Some(args.get(i).context("--output needs a path")?.into());
                }
                "--settings" => {
                    i += 1;
                    options.settings =
                        Some(args.get(i).context("--settings needs a path")?.into());
                }
                "--json" => options.json = true,
                other => bail!("Unknown option: {}", other),
            }
            i += 1;
        }
        Ok(options)
    }

    fn settings(&self) -> Result<HelperSettings> {
        match &self.settings {
            Some(path) => Ok(HelperSettings::load_from_file(path)?),
            None => Ok(HelperSettings::load_or_default()),
        }
    }
}

fn cmd_list_devices(args: &[String]) -> Result<()> {
    let devices = NativeBackend::new().enumerate()?;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&devices)?);
    } else {
        for d in devices {
            println!("{}: {} ({})", d.index, d.name, d.facing);
        }
    }
    Ok(())
}

fn open_helper(
    options: &Options,
    surface: Arc<OffscreenSurface>,
) -> Result<(CameraHelper, camerahelper::UiLoop, crossbeam_channel::Receiver<CameraEvent>)> {
    let (listener, events) = ChannelListener::new();
    let config = CameraConfig::builder()
        .preview_size(1280, 720)
        .camera_facing(options.facing)
        .picture_encoding(options.encoding)
        .preview_on(surface)
        .listener(Arc::new(listener))
        .settings(options.settings()?)
        .build()?;
    let (helper, ui) = CameraHelper::with_ui_loop(config, Arc::new(NativeBackend::new()))?;
    Ok((helper, ui, events))
}

async fn cmd_capture(options: &Options) -> Result<()> {
    let surface = Arc::new(OffscreenSurface::new(1280, 720));
    let (helper, mut ui, events) = open_helper(options, surface)?;

    helper.init().await?;
    helper.start().await?;
    helper.take_picture()?;

    let outcome = wait_for_picture(&mut ui, &events).await;
    helper.release().await;
    ui.run_pending();
    let result = outcome?;

    let output = options.output.clone().unwrap_or_else(|| match result.encoding {
        PictureEncoding::Compressed => PathBuf::from("capture.jpg"),
        PictureEncoding::RawPlanar => PathBuf::from("capture.png"),
    });
    match (&result.encoding, &result.image) {
        (PictureEncoding::RawPlanar, Some(image)) => image
            .save(&output)
            .with_context(|| format!("Failed to write {:?}", output))?,
        _ => std::fs::write(&output, &result.data)
            .with_context(|| format!("Failed to write {:?}", output))?,
    }

    if options.json {
        let summary = serde_json::json!({
            "request_id": result.request_id,
            "width": result.width,
            "height": result.height,
            "encoding": result.encoding,
            "display_orientation": result.display_orientation,
            "bytes": result.data.len(),
            "captured_at": result.captured_at,
            "output": output,
        });
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "Captured {}x{} ({} bytes) to {}",
            result.width,
            result.height,
            result.data.len(),
            output.display()
        );
    }
    Ok(())
}

async fn wait_for_picture(
    ui: &mut camerahelper::UiLoop,
    events: &crossbeam_channel::Receiver<CameraEvent>,
) -> Result<CaptureResult> {
    loop {
        if !ui.run_one().await {
            bail!("UI loop closed before the picture arrived");
        }
        for event in events.try_iter() {
            match event {
                CameraEvent::PictureTaken(result) => return Ok(result),
                CameraEvent::Error(CameraError::Unsupported(reason)) => {
                    log::warn!("{}", reason);
                }
                CameraEvent::Error(error) => return Err(error.into()),
                other => log::debug!("Event: {}", other.name()),
            }
        }
    }
}

async fn cmd_preview(options: &Options) -> Result<()> {
    let surface = Arc::new(OffscreenSurface::new(1280, 720));
    let (helper, mut ui, events) = open_helper(options, surface.clone())?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    helper.init().await?;
    helper.start().await?;
    println!("Previewing, press Ctrl-C to stop");

    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(500)).await;
        ui.run_pending();
        for event in events.try_iter() {
            if let CameraEvent::Error(error) = event {
                eprintln!("Camera error: {}", error);
            }
        }
        if options.json {
            println!(
                "{}",
                serde_json::json!({
                    "frames": surface.frames_presented(),
                    "transform": surface.transform()
                })
            );
        } else {
            println!("{} frames", surface.frames_presented());
        }
    }

    helper.release().await;
    ui.run_pending();
    Ok(())
}
