use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::bridge::DispatchBridge;
use crate::codec::{Framing, JsonCodec};
use crate::config::{BridgeConfigFile, DEFAULT_BASE_URL};
use crate::dispatcher::{DispatcherRegistry, ResourceDispatcher};
use crate::greeter::{register_greeter_resources_with, GreeterBridge, HelloRequest, SAY_HELLO};
use crate::middleware::TracingMiddleware;

/// Command-line interface for brrtbridge
#[derive(Parser, Debug)]
#[command(name = "brrtbridge", version)]
#[command(about = "Forward RPC calls through an in-process dispatcher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Body codec used between the bridge and the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum CodecChoice {
    /// Protobuf (`application/grpc`)
    #[default]
    Protobuf,
    /// JSON (`application/json`)
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one in-process Greeter call and print the reply
    Call {
        /// Name to greet
        #[arg(short, long)]
        name: String,

        /// Bridge configuration file (.yaml, .yml or .toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Body codec between bridge and dispatcher
        #[arg(long, value_enum, default_value_t = CodecChoice::Protobuf)]
        codec: CodecChoice,

        /// Print the reply as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print method -> path translations
    Routes {
        /// Bridge configuration file (.yaml, .yml or .toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Additional method identifiers to translate (repeatable)
        #[arg(short, long)]
        method: Vec<String>,
    },
}

/// Built-in configuration: the Greeter service on a dispatcher named `greeter`
#[must_use]
pub fn default_config_file() -> BridgeConfigFile {
    BridgeConfigFile {
        dispatcher: "greeter".to_string(),
        base_url: DEFAULT_BASE_URL.to_string(),
        framing: Framing::Raw,
        path_rules: Vec::new(),
        methods: vec![SAY_HELLO.to_string()],
    }
}

fn load_config_file(path: Option<&Path>) -> anyhow::Result<BridgeConfigFile> {
    let file = match path {
        Some(path) => BridgeConfigFile::load(path)
            .with_context(|| format!("loading bridge configuration from {}", path.display()))?,
        None => default_config_file(),
    };
    Ok(file.apply_env())
}

fn run_call(
    config_path: Option<&Path>,
    name: &str,
    codec: CodecChoice,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let file = load_config_file(config_path)?;
    let config = file.build()?;

    let mut resources = ResourceDispatcher::new();
    resources.add_middleware(Arc::new(TracingMiddleware));
    register_greeter_resources_with(&mut resources, file.framing)?;

    let registry = Arc::new(DispatcherRegistry::new());
    registry.bind(config.dispatcher_name(), Arc::new(resources))?;
    info!(
        dispatcher = %config.dispatcher_name(),
        codec = ?codec,
        "Greeter resources bound"
    );

    let request = tonic::Request::new(HelloRequest {
        name: name.to_string(),
    });
    let response = match codec {
        CodecChoice::Protobuf => {
            let bridge = DispatchBridge::with_codec(config, registry, file.codec());
            GreeterBridge::from_bridge(bridge).say_hello(request)
        }
        CodecChoice::Json => {
            let bridge = DispatchBridge::with_codec(config, registry, JsonCodec);
            GreeterBridge::from_bridge(bridge).say_hello(request)
        }
    }
    .map_err(|status| anyhow::anyhow!("call failed: {:?}: {}", status.code(), status.message()))?;

    let reply = response.into_inner();
    if json {
        writeln!(out, "{}", serde_json::to_string(&reply)?)?;
    } else {
        writeln!(out, "{}", reply.message)?;
    }
    Ok(())
}

fn run_routes(
    config_path: Option<&Path>,
    extra_methods: &[String],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut file = load_config_file(config_path)?;
    file.methods.extend(extra_methods.iter().cloned());
    let config = file.build()?;

    writeln!(out, "dispatcher: {}", config.dispatcher_name())?;
    for route in config.routes() {
        writeln!(out, "{} -> {} ({})", route.method_id, route.path, route.url)?;
    }
    Ok(())
}

/// Run a parsed command, writing results to `out`
pub fn run_cli_with_output(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Call {
            name,
            config,
            codec,
            json,
        } => run_call(config.as_deref(), name, *codec, *json, out),
        Commands::Routes { config, method } => run_routes(config.as_deref(), method, out),
    }
}

/// Run a parsed command against stdout
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    run_cli_with_output(&cli, &mut lock)
}
