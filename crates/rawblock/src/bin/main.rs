//! Command-line inspector for raw blocks.
//!
//! Reads a serialized block (hex by default, raw bytes with `--binary`) from
//! a file or stdin, decodes it and prints the header fields, target,
//! difficulty and height.

use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use clap::Parser;
use rawblock_common::{Block, DecodeOptions, hashes::Hash256, network::Network};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Command line arguments for the block inspector.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File holding the block; reads stdin when omitted
    input: Option<PathBuf>,

    /// Treat the input as raw bytes instead of hex
    #[arg(long)]
    binary: bool,

    /// Network the block belongs to (bitcoin, testnet, signet, regtest)
    #[arg(short, long, default_value = "bitcoin")]
    network: String,

    /// Fail unless the header hashes to this value (display-order hex)
    #[arg(long)]
    expected_hash: Option<String>,

    /// Known block height, instead of reading it from the coinbase
    #[arg(long)]
    height: Option<u32>,

    /// Decode only the coinbase up front
    #[arg(long)]
    lazy: bool,

    /// With --lazy, decode this many more transactions (0 = all)
    #[arg(long)]
    limit: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Initializes tracing with the specified log level.
fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    debug!("Logging initialized with level: {}", args.log_level);
}

/// Reads the block bytes from the file or stdin.
fn read_input(args: &Args) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let data = match &args.input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    if args.binary {
        return Ok(data);
    }

    let text = String::from_utf8(data)?;
    let hex: String = text.split_whitespace().collect();
    Ok(hex::decode(hex)?)
}

/// Builds decode options from the command line.
fn decode_options(args: &Args) -> Result<DecodeOptions, Box<dyn std::error::Error>> {
    let network: Network = args.network.parse()?;
    let mut options = DecodeOptions::default()
        .with_network(network)
        .with_parse_all_transactions(!args.lazy);

    if let Some(hash) = &args.expected_hash {
        options = options.with_expected_hash(hash.parse::<Hash256>()?);
    }
    if let Some(height) = args.height {
        options = options.with_height(height);
    }

    Ok(options)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args);

    let raw = read_input(&args)?;
    let options = decode_options(&args)?;
    info!(
        "Decoding {} bytes on {} network",
        raw.len(),
        options.network
    );

    let mut block = Block::decode(&raw, &options)?;

    if let Some(limit) = args.limit {
        if !args.lazy {
            warn!("--limit has no effect without --lazy");
        }
        let added = block.continue_parsing(limit)?;
        info!("Decoded {} more transactions", added);
    }

    let summary = block.summary()?;

    if args.json {
        let mut value = serde_json::to_value(&summary)?;
        if let Some(map) = value.as_object_mut() {
            map.insert("height".to_string(), serde_json::json!(block.height()));
            map.insert(
                "pending_bytes".to_string(),
                serde_json::json!(block.pending_bytes().len()),
            );
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{block}");
    println!("  version:       {:#010x}", summary.version);
    println!("  previous:      {}", summary.previous_block_hash);
    println!("  merkle root:   {}", summary.merkle_root);
    println!("  timestamp:     {}", summary.timestamp);
    println!("  bits:          {:#010x}", summary.bits);
    println!("  nonce:         {}", summary.nonce);
    println!("  target:        {}", summary.target);
    println!("  difficulty:    {}", summary.difficulty);
    println!(
        "  transactions:  {} decoded, {} declared",
        summary.transaction_count,
        block.declared_transaction_count()
    );
    if !block.is_fully_parsed() {
        println!("  pending bytes: {}", block.pending_bytes().len());
    }

    Ok(())
}
