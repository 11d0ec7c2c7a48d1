//! # snarkctx - execution contexts for zk circuits
//!
//! A library for running zero-knowledge circuit code in its different phases. The same circuit body is
//! traced once to extract its constraint system and run again by the prover to generate a witness; this
//! crate keeps track of which phase is active, drives the proving backend through it, and turns the
//! backend's output into an inspectable constraint-system snapshot.
//!
//! ## Quick Start
//!
//! Add the following to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! snarkctx = "0.1.0"
//! ark-bls12-381 = "0.3"
//! anyhow = "1.0"
//! ```
//!
//! ## Basic Usage
//!
//! ### 1. Write a Circuit Body
//!
//! A circuit body is a closure (or future) that records gates on the runner's backend. Values the
//! prover knows are allocated with `witness`; the computation only runs when concrete values exist.
//!
//! ```rust
//! use ark_bls12_381::Fr;
//! use snarkctx::backend::PlonkishBackend;
//! use snarkctx::{CircuitRunner, Var};
//!
//! fn adder(runner: &CircuitRunner<PlonkishBackend<Fr>>, x: Fr, y: Fr) -> anyhow::Result<()> {
//!     let x_var = runner.backend_mut().public_input(x)?;
//!     let y_var = runner.witness::<Var, _>(|| Ok(y))?;
//!     let sum = runner.backend_mut().add(x_var, y_var)?;
//!
//!     let expected = runner.witness::<Var, _>(|| Ok(x + y))?;
//!     runner.backend_mut().assert_equal(sum, expected)?;
//!     Ok(())
//! }
//! ```
//!
//! ### 2. Extract the Constraint System
//!
//! ```rust
//! # use ark_bls12_381::Fr;
//! # use snarkctx::backend::PlonkishBackend;
//! # use snarkctx::{CircuitRunner, Var};
//! # fn adder(runner: &CircuitRunner<PlonkishBackend<Fr>>, x: Fr, y: Fr) -> anyhow::Result<()> {
//! #     let x_var = runner.backend_mut().public_input(x)?;
//! #     let y_var = runner.witness::<Var, _>(|| Ok(y))?;
//! #     let sum = runner.backend_mut().add(x_var, y_var)?;
//! #     let expected = runner.witness::<Var, _>(|| Ok(x + y))?;
//! #     runner.backend_mut().assert_equal(sum, expected)?;
//! #     Ok(())
//! # }
//! # fn main() -> anyhow::Result<()> {
//! let runner = CircuitRunner::new(PlonkishBackend::<Fr>::new());
//! let cs = runner.constraint_system_sync(|| adder(&runner, Fr::from(0u64), Fr::from(0u64)))?;
//!
//! assert_eq!(cs.rows(), 2);
//! assert_eq!(cs.summary()["Total rows"], 2);
//! cs.print();
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. Generate a Witness
//!
//! ```rust
//! # use ark_bls12_381::Fr;
//! # use snarkctx::backend::PlonkishBackend;
//! # use snarkctx::{CircuitRunner, Var, WitnessOptions};
//! # fn adder(runner: &CircuitRunner<PlonkishBackend<Fr>>, x: Fr, y: Fr) -> anyhow::Result<()> {
//! #     let x_var = runner.backend_mut().public_input(x)?;
//! #     let y_var = runner.witness::<Var, _>(|| Ok(y))?;
//! #     let sum = runner.backend_mut().add(x_var, y_var)?;
//! #     let expected = runner.witness::<Var, _>(|| Ok(x + y))?;
//! #     runner.backend_mut().assert_equal(sum, expected)?;
//! #     Ok(())
//! # }
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let runner = CircuitRunner::new(PlonkishBackend::<Fr>::new());
//! let (x, y) = (Fr::from(3u64), Fr::from(5u64));
//!
//! let witness = runner
//!     .generate_witness(async { adder(&runner, x, y) }, WitnessOptions::default())
//!     .await?;
//! assert_eq!(witness.public_inputs, vec![x]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Unconstrained Values
//!
//! Data that should travel with a circuit but never be constrained lives in an [`Unconstrained`]. It can
//! be read outside the circuit and inside `witness` / `as_prover` computations only:
//!
//! ```rust
//! use snarkctx::context::Frame;
//! use snarkctx::{ExecutionContext, ProvableError, Unconstrained};
//!
//! let ctx = ExecutionContext::new();
//! let nonce = Unconstrained::from(7u64);
//! assert_eq!(*nonce.get(&ctx).unwrap(), 7);
//!
//! let id = ctx.enter(Frame { in_checked_computation: true, ..Frame::default() });
//! assert!(matches!(nonce.get(&ctx), Err(ProvableError::AccessViolation)));
//! ctx.leave(id).unwrap();
//! ```

pub mod backend;
pub mod config;
pub mod constraint_system;
pub mod context;
pub mod error;
pub mod format;
pub mod gate;
pub mod provable;
pub mod runner;
pub mod unconstrained;
pub mod utils;

pub use backend::{Backend, BackendError, Var};
pub use config::WitnessOptions;
pub use constraint_system::ConstraintSystemSnapshot;
pub use context::{ContextGuard, ContextId, ExecutionContext, Frame};
pub use error::{CircuitExecutionError, ProvableError};
pub use format::GateFormatter;
pub use gate::{Gate, GateType, Wire};
pub use provable::Provable;
pub use runner::CircuitRunner;
pub use unconstrained::{ProverScope, Unconstrained};
