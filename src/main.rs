use anyhow::{bail, Context, Result};
use uartplot::{logging, AppConfig, Exit, Service};

#[derive(Debug)]
struct Cli {
    config_path: Option<String>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = std::env::args().skip(1);
        let mut config_path: Option<String> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                    config_path = Some(value);
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: uartplot [--config <path>]\n\
                         --config <path>   Path to TOML configuration (default: {}, if present)\n\
                         \n\
                         Keys: r/s/p toggle the Raw/Scaled/PWM series, q or Esc quits.",
                        AppConfig::default_path()
                    );
                    std::process::exit(0);
                }
                other => bail!("unknown argument '{other}'"),
            }
        }

        Ok(Self { config_path })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse()?;

    let config = match &cli.config_path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("unable to load configuration from {path}"))?,
        None => AppConfig::load_or_default(AppConfig::default_path())
            .with_context(|| format!("unable to load {}", AppConfig::default_path()))?,
    };

    let _log_guard = logging::init(&config)?;

    if Service::new(config).run().await? == Exit::Interrupted {
        println!("Stopped by user.");
    }
    Ok(())
}
