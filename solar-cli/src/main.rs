use clap::Parser;

#[derive(Parser)]
#[command(name = "solar-cli", version, about = "Maintain and summarize a solar meter readings table")]
struct Cli {
    #[command(subcommand)]
    command: solar_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    solar_cmd::run(cli.command).await
}
