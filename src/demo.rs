use std::path::PathBuf;

use ark_bls12_381::Fr;
use clap::Parser;
use log::info;
use snarkctx::backend::PlonkishBackend;
use snarkctx::utils::field_to_string;
use snarkctx::{CircuitRunner, WitnessOptions};

mod circuit;
mod utils;

#[derive(Parser)]
#[command(author, version, about = "Extract and prove the adder circuit", long_about = None)]
struct Cli {
    #[arg(long, default_value_t = 3)]
    x: u64,
    #[arg(long, default_value_t = 5)]
    y: u64,
    /// Claimed sum, x + y unless given
    #[arg(long)]
    sum: Option<u64>,
    /// Generate the witness without checking gates
    #[arg(long)]
    skip_checks: bool,
    /// Print the gate listing
    #[arg(long)]
    print: bool,
    /// Write the constraint system JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

async fn extract(print: bool, output: Option<PathBuf>) -> Result<(), anyhow::Error> {
    let runner = CircuitRunner::new(PlonkishBackend::<Fr>::new());
    let circuit = circuit::AdderCircuit::<Fr>::blank();
    let cs = runner
        .constraint_system(async { circuit.synthesize(&runner) })
        .await?;

    info!(
        "Constraint system: {} rows, {} public inputs, digest {}",
        cs.rows(),
        cs.public_input_size(),
        cs.digest()
    );
    for (name, count) in cs.summary() {
        info!("  {:<16} {}", name, count);
    }
    if print {
        cs.print();
    }
    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&cs.to_json::<Fr>()?)?;
        std::fs::write(&path, json)?;
        info!("Constraint system written to {}", path.display());
    }
    Ok(())
}

async fn prove(circuit: circuit::AdderCircuit<Fr>, options: WitnessOptions) -> Result<(), anyhow::Error> {
    let runner = CircuitRunner::new(PlonkishBackend::<Fr>::new());
    let witness = runner
        .generate_witness(async { circuit.synthesize(&runner) }, options)
        .await?;

    let public_inputs: Vec<String> = witness
        .public_inputs
        .iter()
        .map(|input| field_to_string(*input))
        .collect();
    info!(
        "Witness generated: {} rows, public inputs {:?}",
        witness.rows.len(),
        public_inputs
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    utils::init_logging();
    let cli = Cli::parse();

    let sum = cli.sum.unwrap_or(cli.x + cli.y);
    info!("Adder circuit with x = {}, y = {}, sum = {}", cli.x, cli.y, sum);

    extract(cli.print, cli.output).await?;

    let circuit = circuit::AdderCircuit {
        x: Fr::from(cli.x),
        y: Fr::from(cli.y),
        sum: Fr::from(sum),
    };
    let options = WitnessOptions {
        check_constraints: !cli.skip_checks,
    };
    prove(circuit, options).await?;

    Ok(())
}
