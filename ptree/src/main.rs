//! ptree — entry point.
//!
//! ```text
//! ptree --image cat.gif                 Draw an image (loops forever)
//! ptree --image cat.png --once          Draw once, then exit
//! ptree --config <path>                 Load a custom config TOML
//! ptree --gen-config                    Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ptree::config::{Backend, EncodingKind, PtreeConfig};
use ptree::service::PtreeService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ptree", about = "Draw images on an IPv6 pixel tree by pinging it")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "ptree.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// The destination network of the IPv6 tree.
    #[arg(long)]
    dst_net: Option<String>,

    /// The image to ping to the tree.
    #[arg(long)]
    image: Option<PathBuf>,

    /// The x offset to draw the image.
    #[arg(short, allow_negative_numbers = true)]
    x: Option<i64>,

    /// The y offset to draw the image.
    #[arg(short, allow_negative_numbers = true)]
    y: Option<i64>,

    /// How many times to draw the image per second.
    #[arg(long)]
    rate: Option<u32>,

    /// The number of workers to use.
    #[arg(long)]
    workers: Option<usize>,

    /// Abort after one loop.
    #[arg(long)]
    once: bool,

    /// Address layout of the display.
    #[arg(long, value_enum)]
    encoding: Option<EncodingKind>,

    /// Use pcap for sending.
    #[arg(long, conflicts_with = "pfring")]
    pcap: bool,

    /// Use PF_RING for sending.
    #[arg(long)]
    pfring: bool,

    /// Interface for outgoing traffic with pcap / PF_RING.
    #[arg(long)]
    interface: Option<String>,

    /// Fixed seed for the pixel shuffle.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Flags given on the command line win over the config file.
    fn apply(&self, config: &mut PtreeConfig) {
        if let Some(dst_net) = &self.dst_net {
            config.display.dst_net = dst_net.clone();
        }
        if let Some(image) = &self.image {
            config.image.path = Some(image.clone());
        }
        if let Some(x) = self.x {
            config.image.x = x;
        }
        if let Some(y) = self.y {
            config.image.y = y;
        }
        if let Some(rate) = self.rate {
            config.playback.rate = rate;
        }
        if let Some(workers) = self.workers {
            config.transmit.workers = workers;
        }
        if self.once {
            config.playback.once = true;
        }
        if let Some(encoding) = self.encoding {
            config.display.encoding = encoding;
        }
        if self.pcap {
            config.transmit.backend = Backend::Pcap;
        } else if self.pfring {
            config.transmit.backend = Backend::PfRing;
        }
        if let Some(interface) = &self.interface {
            config.transmit.interface = interface.clone();
        }
        if let Some(seed) = self.seed {
            config.playback.seed = Some(seed);
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&PtreeConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Logging is not up yet, so config errors go straight to stderr.
    let mut config = match PtreeConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    cli.apply(&mut config);

    if config.image.path.is_none() {
        eprintln!("the image flag must be provided");
        std::process::exit(1);
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("ptree v{}", env!("CARGO_PKG_VERSION"));
    info!("destination: {}", config.display.dst_net);
    info!("rate: {}/s, workers: {}", config.playback.rate, config.transmit.workers);

    let service = PtreeService::new(config);
    let stop = service.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("interrupt received, shutting down");
        stop.cancel();
    });

    if let Err(e) = service.run().await {
        error!("{e}");
        return Err(e.into());
    }

    Ok(())
}
