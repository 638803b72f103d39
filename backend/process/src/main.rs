use anyhow::Result;
use clap::{Parser, Subcommand};
use process::Credentials;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "GATEWAY_URL", default_value = "http://localhost:54321")]
    gateway_url: String,

    #[arg(long, env = "GATEWAY_ANON_KEY", hide_env_values = true)]
    anon_key: String,

    #[arg(long, env = "ADMIN_EMAIL", requires = "password")]
    email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, requires = "email")]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write default calculator rates and site copy for missing keys
    Seed {
        /// Overwrite keys that already exist
        #[arg(long)]
        force: bool,
    },
    /// Print dashboard counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let credentials = args
        .email
        .zip(args.password)
        .map(|(email, password)| Credentials { email, password });

    let gateway =
        process::connect(&args.gateway_url, &args.anon_key, credentials.as_ref()).await?;

    match args.command {
        Command::Seed { force } => {
            let report = process::seed(&gateway, force).await?;
            println!("Calculator settings written: {}", report.settings);
            println!("Content sections written: {}", report.sections);
        }
        Command::Stats => println!("{}", process::stats(&gateway).await?),
    }

    Ok(())
}
