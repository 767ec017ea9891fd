//! Command-line demos for the comedi crates
//!
//! Every demo runs against the simulated board; the device filename is only
//! used for logging.
//!
//! ```bash
//! comedi-demo constants trigger_source_flags
//! comedi-demo chanspec --channel 3 --range 1 --aref diff --flags edge
//! comedi-demo insn -c 2 -N 20
//! comedi-demo -vv cmd -c 0,1,2 -F 1000 -N 5
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comedi_device::{
    prepare_command, timed_read, AcquisitionConfig, Chanlist, DataChannel, Device,
    SimulatedDriver, Subdevice,
};
use comedi_spec::{ChanSpec, Constants, FlagValue, ProducesChanSpec};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Driver tests per command before giving up
const MAX_COMMAND_TESTS: usize = 2;

#[derive(Parser)]
#[command(name = "comedi-demo")]
#[command(about = "Typed comedi instructions and commands on a simulated board", long_about = None)]
struct Cli {
    /// Increase verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List constant families, or the members of one family
    Constants {
        /// Family name, e.g. `trigger_source_flags`
        family: Option<String>,
    },

    /// Pack a channel specifier and show its fields
    Chanspec {
        #[arg(long, default_value_t = 0)]
        channel: u32,

        #[arg(long, default_value_t = 0)]
        range: u32,

        /// `AREF` member name
        #[arg(long, default_value = "ground")]
        aref: String,

        /// `CR` flags, e.g. `edge|invert`
        #[arg(long, default_value = "")]
        flags: String,
    },

    /// Read samples with a gtod/read/gtod instruction list
    Insn(AcquisitionArgs),

    /// Run a generic timed streaming command
    Cmd(AcquisitionArgs),
}

/// Options shared by the acquisition demos; they override `--config`.
#[derive(Args)]
struct AcquisitionArgs {
    /// JSON acquisition config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device file
    #[arg(short, long)]
    filename: Option<String>,

    /// Subdevice index (default: first analog input)
    #[arg(short, long)]
    subdevice: Option<u32>,

    /// Channels to read
    #[arg(short, long, value_delimiter = ',')]
    channels: Option<Vec<u32>>,

    #[arg(short, long)]
    range: Option<u32>,

    #[arg(short, long)]
    aref: Option<String>,

    /// Number of scans (samples per channel)
    #[arg(short = 'N', long)]
    num_scans: Option<u32>,

    /// Scan frequency in Hz
    #[arg(short = 'F', long)]
    frequency: Option<f64>,
}

impl AcquisitionArgs {
    fn resolve(self, constants: &Constants) -> Result<AcquisitionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => AcquisitionConfig::default(),
        };
        if let Some(filename) = self.filename {
            config.filename = filename;
        }
        if self.subdevice.is_some() {
            config.subdevice = self.subdevice;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(range) = self.range {
            config.range = range;
        }
        if let Some(aref) = self.aref {
            config.aref = aref;
        }
        if let Some(num_scans) = self.num_scans {
            config.num_scans = num_scans;
        }
        if self.frequency.is_some() {
            config.frequency = self.frequency;
        }
        config.validate(constants).context("invalid acquisition config")?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let constants = Constants::global();

    match cli.command {
        Commands::Constants { family } => constants_cmd(constants, family.as_deref(), cli.json),
        Commands::Chanspec {
            channel,
            range,
            aref,
            flags,
        } => chanspec_cmd(constants, channel, range, &aref, &flags, cli.json),
        Commands::Insn(args) => insn_cmd(args.resolve(constants)?, cli.json),
        Commands::Cmd(args) => cmd_cmd(args.resolve(constants)?, cli.json),
    }
}

fn constants_cmd(constants: &Constants, family: Option<&str>, json: bool) -> Result<()> {
    let Some(family) = family else {
        for registry in constants.registries() {
            println!("{:<40} {:<5} {} members", registry.name(), registry.kind(), registry.len());
        }
        return Ok(());
    };
    let Some(registry) = constants.registry(family) else {
        bail!("unknown constant family {family:?}");
    };
    if json {
        let members: Vec<_> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }
    for member in registry {
        println!("{:<24} {:#010x}  {}", member.name, member.value, member.doc);
    }
    if let Some(empty) = registry.empty() {
        println!("(empty: {})", empty.name);
    }
    if let Some(all) = registry.all() {
        println!("(all: {} = {:#010x})", all.name, all.value);
    }
    Ok(())
}

fn chanspec_cmd(
    constants: &Constants,
    channel: u32,
    range: u32,
    aref: &str,
    flags: &str,
    json: bool,
) -> Result<()> {
    let aref = constants.aref.member(aref)?;
    let flags = FlagValue::parse(&constants.cr, flags)?;
    let spec = ChanSpec::pack(channel, range, aref.value, flags.value(), &constants.cr)?;
    if json {
        println!("{}", serde_json::to_string(&spec)?);
    } else {
        println!("{spec}: {}", spec.describe(constants));
    }
    Ok(())
}

fn open(config: &AcquisitionConfig) -> Device<SimulatedDriver> {
    tracing::info!(filename = %config.filename, "using simulated board");
    Device::open(&config.filename, SimulatedDriver::new())
}

fn pick_subdevice(device: &Device<SimulatedDriver>, config: &AcquisitionConfig) -> Result<Subdevice> {
    match config.subdevice {
        Some(index) => Ok(Subdevice::new(index)),
        None => {
            let ai = Constants::global().subdevice_type.member("ai")?;
            Ok(device.find_subdevice_by_type(ai)?)
        }
    }
}

fn chanlist(subdevice: &Subdevice, config: &AcquisitionConfig) -> Result<Chanlist> {
    let aref = config.aref_value(Constants::global())?;
    Ok(config
        .channels
        .iter()
        .map(|&index| DataChannel::new(subdevice.index(), index, config.range, aref))
        .collect())
}

fn insn_cmd(config: AcquisitionConfig, json: bool) -> Result<()> {
    tracing::info!("{config}");
    let mut device = open(&config);
    let subdevice = pick_subdevice(&device, &config)?;
    let chanlist = chanlist(&subdevice, &config)?;

    for channel in chanlist.channels() {
        let result = timed_read(
            &mut device,
            &subdevice,
            channel.chanspec(),
            config.num_scans as usize,
        )
        .with_context(|| format!("reading channel {}", channel.index))?;

        if json {
            println!("{}", serde_json::to_string(&result)?);
            continue;
        }
        println!("channel {}", channel.index);
        println!("t1: {:.6}", result.t1);
        for sample in &result.data {
            println!("{sample}");
        }
        println!("t2: {:.6}", result.t2);
        if let Some(period) = result.sample_period() {
            println!("read time: {:.6} s per sample", period);
        }
    }
    Ok(())
}

fn cmd_cmd(config: AcquisitionConfig, json: bool) -> Result<()> {
    tracing::info!("{config}");
    let mut device = open(&config);
    let subdevice = pick_subdevice(&device, &config)?;
    let chanlist = chanlist(&subdevice, &config)?;
    let mut streaming = device.streaming_subdevice(subdevice.index());

    prepare_command(
        &mut device,
        &mut streaming,
        &chanlist,
        config.period_ns(),
        config.num_scans,
    )?;
    streaming
        .prepare_until_valid(&mut device, MAX_COMMAND_TESTS)
        .context("preparing command")?;

    if json {
        eprintln!("{}", serde_json::to_string_pretty(&streaming.cmd)?);
    } else {
        eprintln!("{}", streaming.cmd);
    }

    streaming.command(&mut device)?;
    let scans = streaming.read_scans(&mut device, config.num_scans as usize)?;

    if json {
        println!("{}", serde_json::to_string(&scans)?);
        return Ok(());
    }
    let header: Vec<String> = config.channels.iter().map(|c| format!("ch{c}")).collect();
    println!("{}", header.join("\t"));
    for scan in &scans {
        let row: Vec<String> = scan.iter().map(ToString::to_string).collect();
        println!("{}", row.join("\t"));
    }
    Ok(())
}
