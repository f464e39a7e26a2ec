//! # CLI Module
//!
//! Command-line front end for running bridged calls in-process.
//!
//! ## Commands
//!
//! ### `call`
//!
//! Host the Greeter resources in a [`ResourceDispatcher`](crate::dispatcher::ResourceDispatcher),
//! bind it, and forward one `SayHello` call through the bridge:
//!
//! ```bash
//! brrtbridge call --name Ada
//! brrtbridge call --name Ada --codec json --json
//! brrtbridge call --name Ada --config bridge.yaml
//! ```
//!
//! ### `routes`
//!
//! Print how RPC method identifiers translate to dispatcher paths:
//!
//! ```bash
//! brrtbridge routes --config bridge.toml
//! brrtbridge routes --method helloworld.Greeter/SayGoodbye
//! ```
//!
//! Without `--config`, both commands use the built-in Greeter configuration.
//! `BRRTB_DISPATCHER` overrides the dispatcher name either way.

mod commands;


pub use commands::{default_config_file, run_cli, run_cli_with_output, Cli, CodecChoice, Commands};
