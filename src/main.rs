use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pixel_warden::config::{
    ConnectionConfig, FixParams, OverlayConfig, ProtectParams, RunMode, SessionConfig,
};
use pixel_warden::overlay::Stride;

/// Keep a pixel-art overlay alive on a shared, credit-limited canvas:
/// diff the overlay against the live board, then repaint or reinforce the
/// cheapest useful pixels within a credit budget.
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Reconcile a pixel-art overlay against a shared canvas")]
struct Cli {
    /// GraphQL endpoint of the canvas service (or WARDEN_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// Authorization header value (or WARDEN_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,

    /// Palette cache file, fetched and written on first run
    #[arg(long, default_value = "colors.json")]
    palette_cache: PathBuf,

    /// Also write the fetched board snapshot PNG to this path
    #[arg(long)]
    save_map: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Overlay placement and decoding flags shared by both passes.
#[derive(Args, Debug)]
struct OverlayArgs {
    /// Overlay/target image (PNG)
    image: PathBuf,

    /// Canvas x coordinate of the image's top-left pixel
    #[arg(long, default_value_t = 0)]
    origin_x: i32,

    /// Canvas y coordinate of the image's top-left pixel
    #[arg(long, default_value_t = 0)]
    origin_y: i32,

    /// Sub-sample the image: keep every Nth pixel per axis
    #[arg(long)]
    stride: Option<u32>,

    /// First kept coordinate when --stride is set
    #[arg(long, default_value_t = 1)]
    stride_init: u32,

    /// Palette index treated as transparent
    #[arg(long)]
    transparent_color: Option<u8>,

    /// Fixed shuffle seed, for reproducible pixel order
    #[arg(long)]
    seed: Option<u64>,

    /// Keep pixels in image scan order instead of shuffling
    #[arg(long)]
    no_shuffle: bool,

    /// Pixels submitted per mutation batch
    #[arg(long, default_value_t = 3)]
    batch_size: usize,

    /// Credit ceiling for this pass
    #[arg(long, default_value_t = 100)]
    max_credit: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repaint pixels that drifted from the overlay
    Fix {
        #[command(flatten)]
        overlay: OverlayArgs,

        /// Leave pixels at or above this protection level alone
        #[arg(long, default_value_t = 4)]
        max_level: u32,

        /// Also raise each repainted pixel's level (doubles its cost)
        #[arg(long)]
        upgrade: bool,
    },
    /// Raise the protection level of pixels that already match
    Protect {
        #[command(flatten)]
        overlay: OverlayArgs,

        /// Stop reinforcing pixels once they reach this level
        #[arg(long, default_value_t = 2)]
        min_level: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let connection = ConnectionConfig {
        endpoint: cli
            .endpoint
            .or_else(|| std::env::var("WARDEN_ENDPOINT").ok())
            .unwrap_or_default(),
        auth_token: cli
            .auth_token
            .or_else(|| std::env::var("WARDEN_TOKEN").ok()),
    };

    let (overlay_args, mode) = match cli.command {
        Command::Fix {
            overlay,
            max_level,
            upgrade,
        } => {
            let params = FixParams {
                max_credit: overlay.max_credit,
                max_level,
                upgrade,
                batch_size: overlay.batch_size,
            };
            (overlay, RunMode::Fix(params))
        }
        Command::Protect { overlay, min_level } => {
            let params = ProtectParams {
                max_credit: overlay.max_credit,
                min_level,
                batch_size: overlay.batch_size,
            };
            (overlay, RunMode::Protect(params))
        }
    };

    let mut overlay = OverlayConfig::new(overlay_args.image);
    overlay.origin = (overlay_args.origin_x, overlay_args.origin_y);
    overlay.stride = overlay_args.stride.map(|step| Stride {
        init: overlay_args.stride_init,
        step,
    });
    overlay.transparent_color = overlay_args.transparent_color;
    overlay.shuffle = !overlay_args.no_shuffle;
    overlay.seed = overlay_args.seed;

    let mut config = SessionConfig::new(overlay, mode);
    config.palette_cache = cli.palette_cache;
    config.save_map = cli.save_map;

    let report = pixel_warden::run(connection, config).await?;
    println!(
        "Done: {} mutations in {} batches ({} credits spent)",
        report.planned, report.batches, report.running_cost
    );
    Ok(())
}
