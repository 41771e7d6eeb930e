use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rfm69_link::radio::presets::{self, Band};
use rfm69_link::{init_logger, log_info, Packet, RadioConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rfm69-cli")]
#[command(about = "CLI tool for RFM69 packet radios")]
struct Cli {
    /// JSON driver configuration; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive packets and log them
    Rx,
    /// Send a message periodically
    Tx {
        #[arg(long)]
        to: u8,
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
        message: String,
    },
    /// Print the register recipe for a band and bit rate
    Presets {
        #[arg(long, default_value = "433")]
        band: Band,
        #[arg(long, default_value = "100000")]
        bitrate: u32,
    },
}

/// Message type 1: temperature (Celsius) and relative humidity
#[cfg_attr(not(feature = "raspberry-pi"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq)]
struct SensorData {
    temperature: f32,
    relative_humidity: f32,
}

#[cfg_attr(not(feature = "raspberry-pi"), allow(dead_code))]
impl SensorData {
    fn decode(body: &[u8]) -> Option<Self> {
        let temperature = f32::from_le_bytes(body.get(0..4)?.try_into().ok()?);
        let relative_humidity = f32::from_le_bytes(body.get(4..8)?.try_into().ok()?);
        Some(Self {
            temperature,
            relative_humidity,
        })
    }
}

#[cfg_attr(not(feature = "raspberry-pi"), allow(dead_code))]
fn report(packet: &Packet) {
    log_info(&format!("got packet: {packet:?}"));
    match packet.payload.split_first() {
        Some((1, body)) => match SensorData::decode(body) {
            Some(msg) => {
                log_info(&format!("msg = {msg:?}"));
                log_info(&format!("temp = {:.1}F", msg.temperature * 9.0 / 5.0 + 32.0));
            }
            None => log_info("error reading message: short sensor record"),
        },
        Some((kind, _)) => log_info(&format!("unknown message type: {kind}")),
        None => log_info("empty packet"),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RadioConfig> {
    let config = match path {
        Some(path) => RadioConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RadioConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(feature = "raspberry-pi")]
async fn open_radio(
    config: RadioConfig,
) -> Result<rfm69_link::Radio<rfm69_link::hal::RaspberryPiBoard>> {
    use rfm69_link::hal::{GpioPins, RaspberryPiBoard};

    let board = RaspberryPiBoard::new(0, &GpioPins::default()).context("board init")?;
    let mut radio = rfm69_link::Radio::new(board, rfm69_link::logging::default_sink(), config);
    radio.setup().await.context("setup")?;
    Ok(radio)
}

#[cfg(feature = "raspberry-pi")]
async fn run_rx(config: RadioConfig) -> Result<()> {
    let mut radio = open_radio(config).await?;
    let (tx, mut rx) = tokio::sync::mpsc::channel(1);
    let printer = tokio::spawn(async move {
        while let Some(packet) = rx.recv().await {
            report(&packet);
        }
    });

    radio.receive(tx).await.context("rx")?;
    printer.await.context("packet printer")?;
    Ok(())
}

#[cfg(feature = "raspberry-pi")]
async fn run_tx(config: RadioConfig, to: u8, interval_ms: u64, message: String) -> Result<()> {
    let mut radio = open_radio(config).await?;
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(interval_ms));
    loop {
        ticker.tick().await;
        radio.send(to, message.as_bytes()).await.context("tx")?;
        log_info(&format!("sent {} bytes to 0x{to:02X}", message.len()));
    }
}

#[cfg(not(feature = "raspberry-pi"))]
async fn run_rx(_config: RadioConfig) -> Result<()> {
    bail!("rx requires the raspberry-pi feature")
}

#[cfg(not(feature = "raspberry-pi"))]
async fn run_tx(_config: RadioConfig, _to: u8, _interval_ms: u64, _message: String) -> Result<()> {
    bail!("tx requires the raspberry-pi feature")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Rx => run_rx(config).await?,
        Commands::Tx {
            to,
            interval_ms,
            message,
        } => {
            if interval_ms == 0 {
                bail!("--interval-ms must be positive");
            }
            run_tx(config, to, interval_ms, message).await?
        }
        Commands::Presets { band, bitrate } => {
            for (reg, value) in presets::config_for(band, bitrate) {
                println!("0x{reg:02X} = 0x{value:02X}");
            }
        }
    }

    Ok(())
}
