use crate::client::{run_submit, SubmitArgs};
use crate::commands::{
    run_cabinet_payload, run_cabinet_template, run_evaluate, run_policy_init,
    run_policy_validate, EvaluateArgs, PayloadArgs, PolicyInitArgs, PolicyValidateArgs,
    TemplateArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use store_dr::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Store DR Unloadability",
    about = "Rank refrigeration cabinets for demand-response load shedding",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score and rank a cabinet table against the store policy
    Evaluate(EvaluateArgs),
    /// Work with cabinet input tables
    Cabinets {
        #[command(subcommand)]
        command: CabinetsCommand,
    },
    /// POST a saved evaluation request to a running service
    Submit(SubmitArgs),
    /// Validate or initialise the scoring policy
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CabinetsCommand {
    /// Write a blank cabinet CSV with R-xx and F-xx placeholder rows
    Template(TemplateArgs),
    /// Build the evaluation request JSON for a cabinet table
    Payload(PayloadArgs),
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Check a policy YAML file without starting the service
    Validate(PolicyValidateArgs),
    /// Write the built-in policy to CONFIG_DIR/config.yaml
    Init(PolicyInitArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
        Command::Cabinets {
            command: CabinetsCommand::Template(args),
        } => run_cabinet_template(args),
        Command::Cabinets {
            command: CabinetsCommand::Payload(args),
        } => run_cabinet_payload(args),
        Command::Submit(args) => run_submit(args).await,
        Command::Policy {
            command: PolicyCommand::Validate(args),
        } => run_policy_validate(args),
        Command::Policy {
            command: PolicyCommand::Init(args),
        } => run_policy_init(args),
    }
}
