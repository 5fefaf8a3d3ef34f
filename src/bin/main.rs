use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut custom_config_path: Option<PathBuf> = None;

    match args.get(1).map(|s| s.as_str()) {
        Some("--version") => {
            println!("axwm {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("--help") => {
            print_help();
            return Ok(());
        }
        Some("--init") => {
            return init_config(args.get(2).map(PathBuf::from));
        }
        Some("--config") => match args.get(2) {
            Some(path) => custom_config_path = Some(PathBuf::from(path)),
            None => bail!("--config requires a path argument"),
        },
        Some(other) => bail!("unknown argument '{other}', see --help"),
        None => {}
    }

    init_logging();

    let config = load_config(custom_config_path)?;
    axwm::x11::run(config).context("window manager exited with an error")?;
    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("axwm=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(custom_path: Option<PathBuf>) -> Result<axwm::Config> {
    let config_path = match custom_path {
        Some(path) => path,
        None => match axwm::config::default_path() {
            Some(path) => path,
            None => {
                tracing::warn!("no config directory, using defaults");
                return Ok(axwm::Config::default());
            }
        },
    };

    axwm::config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))
}

fn init_config(custom_path: Option<PathBuf>) -> Result<()> {
    let config_path = match custom_path {
        Some(path) => path,
        None => axwm::config::default_path().context("Could not find config directory")?,
    };
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    std::fs::write(&config_path, axwm::config::TEMPLATE)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("✓ Config created at {}", config_path.display());
    println!("  Edit the file and restart axwm to apply it");

    Ok(())
}

fn print_help() {
    println!("axwm - a dynamic tiling window manager for X11\n");
    println!("USAGE:");
    println!("    axwm [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --init [PATH]       Write the default config (default: ~/.config/axwm/config.ron)");
    println!("    --config <PATH>     Use a custom config file");
    println!("    --version           Print version information");
    println!("    --help              Print this help message\n");
    println!("LOGGING:");
    println!("    Set RUST_LOG to adjust verbosity, for example RUST_LOG=axwm=debug\n");
}
