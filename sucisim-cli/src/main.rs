//! sucisim command-line driver
//!
//! Runs the full SUPI concealment round trip (device side through the SUCI
//! wire format to network-side recovery) and a 5G-AKA authentication
//! vector generation, logging every intermediate value.
//!
//! # Usage
//!
//! ```bash
//! sucisim -c config/subscriber.yaml
//! sucisim --log-level debug
//! ```

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use sucisim_common::config::SimConfig;
use sucisim_common::logging::{init_logging, LogLevel};
use sucisim_session::auth::{
    generate_aka_vector, generate_rand, serving_network_name, OpcCache, SubscriberCredentials,
};
use sucisim_session::supi::split_supi;
use sucisim_session::{deconceal_suci, ConcealmentSession, Suci};

/// sucisim - 5G SUPI concealment and Milenage AKA simulator
#[derive(Parser, Debug)]
#[command(name = "sucisim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulator configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "log-level", default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let log_level: LogLevel = args
        .log_level
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    init_logging(log_level);

    let config = match &args.config_file {
        Some(path) => SimConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => SimConfig::default(),
    };

    run_concealment(&config)?;
    run_authentication(&config)?;

    Ok(())
}

/// Device-side concealment pipeline followed by network-side recovery.
fn run_concealment(config: &SimConfig) -> Result<()> {
    info!(
        supi = %config.subscriber.supi,
        profile = ?config.concealment.profile,
        "starting SUPI concealment"
    );

    let mut session = ConcealmentSession::from_config(config);
    session.generate_home_network_key()?;
    session.provision()?;
    session.generate_ephemeral_key()?;
    session.compute_shared_secret()?;
    session.derive_keys()?;
    session.encrypt_identifier()?;
    session.compute_mac()?;
    let wire = session.assemble_suci()?.to_string();

    print!("{}", session.visualize_structure());

    // Network side: only the wire string and the home-network key cross over
    let received: Suci = wire.parse()?;
    let hn_keys = session
        .home_network_keys()
        .context("home network keys missing after pipeline")?;

    let deconcealed = deconceal_suci(hn_keys, &received)?;
    info!(supi = %deconcealed.supi, "network side recovered SUPI");

    if deconcealed.supi != config.subscriber.supi {
        bail!(
            "recovered SUPI {} does not match {}",
            deconcealed.supi,
            config.subscriber.supi
        );
    }
    Ok(())
}

/// One 5G-AKA authentication vector generation.
fn run_authentication(config: &SimConfig) -> Result<()> {
    let credentials = SubscriberCredentials::from_config(&config.subscriber)?;
    let parts = split_supi(&config.subscriber.supi)?;
    let sn_name = serving_network_name(&parts.mcc, &parts.mnc);

    let mut opc_cache = OpcCache::new();
    let rand = generate_rand();
    let vector = generate_aka_vector(&credentials, &mut opc_cache, rand, &sn_name);

    info!(sn_name = %sn_name, "5G-AKA vector generated");
    println!("rand:     {}", hex::encode(vector.rand));
    println!("autn:     {}", hex::encode(vector.autn));
    println!("res:      {}", hex::encode(vector.milenage.res));
    println!("ck:       {}", hex::encode(vector.milenage.ck));
    println!("ik:       {}", hex::encode(vector.milenage.ik));
    println!("ak:       {}", hex::encode(vector.milenage.ak));
    println!("kausf:    {}", hex::encode(vector.kausf));
    Ok(())
}
