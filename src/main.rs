//! Raspivideo Source CLI
//!
//! Demonstration binary: streams synthetic frames from the mock driver
//! through the acquisition loop, logging delivered records. Ctrl-C requests
//! a stop the same way a stream host would.

use clap::Parser;
use raspivideo_source::{
    FrameRecord, FrameSink, MockDriver, SinkError, SourceConfig, VideoSource,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "raspivideo-source",
    version,
    about = "Stream camera frame records to a logging sink"
)]
struct Args {
    /// Frame width in pixels
    #[arg(long, default_value_t = 640)]
    width: i64,

    /// Frame height in pixels
    #[arg(long, default_value_t = 480)]
    height: i64,

    /// Pixel format (rgb or bgr)
    #[arg(long, default_value = "bgr")]
    format: String,

    /// Synthetic frames the mock camera serves before tearing down
    #[arg(long, default_value_t = 100)]
    frames: usize,
}

struct LogSink {
    delivered: u64,
}

impl FrameSink for LogSink {
    fn write(&mut self, record: FrameRecord) -> Result<(), SinkError> {
        self.delivered += 1;
        if self.delivered % 30 == 0 {
            info!(
                frames = self.delivered,
                bytes = record.image().len(),
                "delivered frame records"
            );
        }
        Ok(())
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Raspivideo source v{}", raspivideo_source::VERSION);
    info!("This is a demonstration using the mock camera driver");

    let mut params = toml::value::Table::new();
    params.insert("width".to_string(), toml::Value::Integer(args.width));
    params.insert("height".to_string(), toml::Value::Integer(args.height));
    params.insert("format".to_string(), toml::Value::String(args.format));

    let config = match SourceConfig::from_params(&params) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid source parameters: {}", e);
            std::process::exit(1);
        }
    };

    let driver = MockDriver::new().good_frames(args.frames, config.frame_bytes());
    let source = VideoSource::new(config, driver);

    let stop = source.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.stop()) {
        warn!("Ctrl-C handler not installed: {}", e);
    }

    let mut sink = LogSink { delivered: 0 };
    match source.run(&mut sink) {
        Ok(()) => info!("Stream ended after {} frame records", sink.delivered),
        Err(e) => {
            eprintln!("Stream failed: {}", e);
            std::process::exit(1);
        }
    }
}
