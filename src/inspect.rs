use std::path::PathBuf;

use anyhow::Context;
use ark_bls12_381::Fr;
use clap::Parser;
use log::info;
use snarkctx::ConstraintSystemSnapshot;
use snarkctx::gate::JsonConstraintSystem;

mod utils;

#[derive(Parser)]
#[command(author, version, about = "Print a constraint system exported as JSON", long_about = None)]
struct Cli {
    /// Constraint system JSON, as written by `demo --output`
    file: PathBuf,
    /// Print the gate count per type
    #[arg(long)]
    summary: bool,
    /// Check that decoding and re-encoding reproduces the file's gates exactly
    #[arg(long)]
    roundtrip: bool,
}

fn main() -> Result<(), anyhow::Error> {
    utils::init_logging();
    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let json: JsonConstraintSystem = serde_json::from_str(&text)?;
    let cs = ConstraintSystemSnapshot::from_json::<Fr>(&json)?;
    info!(
        "Loaded {}: {} gates, {} public inputs, digest {}",
        cli.file.display(),
        cs.rows(),
        cs.public_input_size(),
        cs.digest()
    );

    cs.print();

    if cli.summary {
        for (name, count) in cs.summary() {
            println!("{:<16} {}", name, count);
        }
    }

    if cli.roundtrip {
        let original = serde_json::to_string(&json)?;
        let reencoded = serde_json::to_string(&cs.to_json::<Fr>()?)?;
        if original != reencoded {
            anyhow::bail!("Re-encoded constraint system differs from {}", cli.file.display());
        }
        info!("Round trip reproduced all {} gates", cs.rows());
    }

    Ok(())
}
