use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nu_ansi_term::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use nexarion::config::{load_config, load_config_from, save_config_to, NexarionConfig};
use nexarion::emotion::{spawn, EmotionHandle, EmotionalState};
use nexarion::garden::Garden;
use nexarion::persona::{EchoBackend, Faculty, Persona, PersonaVariant};

#[derive(Parser, Debug)]
#[command(name = "nexarion", version, about = "Emotional state engine for the Nexarion persona")]
struct Cli {
    /// Emotional state file (overrides config)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Config file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Persona variant
    #[arg(long, global = true)]
    variant: Option<PersonaVariant>,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Interactive session (default)
    Chat,
    /// Print the current emotional snapshot as JSON
    Status,
    /// Run decay cycles and save
    Tick {
        #[arg(default_value_t = 1)]
        cycles: u32,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn rng_for(seed: Option<u64>, offset: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(offset)),
        None => StdRng::from_os_rng(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting nexarion version {}", env!("CARGO_PKG_VERSION"));

    if let Some(Command::Init { force }) = cli.command {
        return init_config(cli.config.clone(), cli.variant, force);
    }

    let mut config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;
    if let Some(path) = cli.state_file.clone() {
        config.state_file = Some(path);
    }
    if let Some(variant) = cli.variant {
        config.variant = variant;
    }

    let state_path = config.state_path();
    tracing::debug!("Emotional state file: {:?}", state_path);
    let state = EmotionalState::load_or_default_with_rng(&state_path, config.engine.clone(), rng_for(cli.seed, 0));

    match cli.command.unwrap_or(Command::Chat) {
        Command::Status => {
            let snapshot = state.snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Command::Tick { cycles } => {
            let mut state = state;
            for _ in 0..cycles {
                let report = state.decay_cycle();
                if let Some(fluctuation) = report.fluctuation {
                    tracing::info!("Fluctuation: {}", fluctuation.name());
                }
            }
            state
                .save(&state_path)
                .with_context(|| format!("Failed to save emotional state to {}", state_path.display()))?;
            println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
            Ok(())
        }
        Command::Chat => run_chat(config, state, state_path, cli.seed).await,
        Command::Init { force } => init_config(cli.config.clone(), cli.variant, force),
    }
}

fn init_config(path: Option<PathBuf>, variant: Option<PersonaVariant>, force: bool) -> anyhow::Result<()> {
    let path = path
        .or_else(NexarionConfig::config_path)
        .context("No config directory available; pass --config")?;
    if path.exists() && !force {
        anyhow::bail!("Config file {} already exists (use --force to overwrite)", path.display());
    }

    let mut config = NexarionConfig::default();
    if let Some(variant) = variant {
        config.variant = variant;
    }
    save_config_to(&config, &path).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn spawn_garden_loop(
    emotions: EmotionHandle,
    period: Duration,
    seed: Option<u64>,
    status: watch::Sender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut garden = Garden::with_rng("Nexarion Garden", rng_for(seed, 1));
        let _ = status.send(garden.status_line());
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match garden.tend(&emotions).await {
                Ok(report) => {
                    for bloom in &report.new_blooms {
                        tracing::info!("{}", bloom.message);
                    }
                    let _ = status.send(garden.status_line());
                }
                Err(e) => {
                    tracing::warn!("Garden loop stopping: {}", e);
                    break;
                }
            }
        }
    })
}

async fn run_chat(
    config: NexarionConfig,
    state: EmotionalState,
    state_path: PathBuf,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let (emotions, actor) = spawn(state);
    let mut tasks = vec![emotions.spawn_decay_ticker(Duration::from_secs(config.tick_interval_secs.max(1)))];

    let (status_tx, status_rx) = watch::channel(String::from("Garden dormant"));
    if config.garden_interval_secs > 0 {
        tasks.push(spawn_garden_loop(
            emotions.clone(),
            Duration::from_secs(config.garden_interval_secs),
            seed,
            status_tx,
        ));
    }

    let mut persona = Persona::new(config.variant, Arc::new(EchoBackend), emotions.clone())
        .with_faculty(Faculty::for_variant(config.variant, rng_for(seed, 2)))
        .with_autosave(&state_path, config.autosave_every);

    println!(
        "{} ({} variant). Commands: emotions, garden, report, save, exit",
        Color::Cyan.bold().paint("Nexarion"),
        persona.variant()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", Color::Green.paint(">"));
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "emotions" => {
                let snapshot = emotions.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            "garden" => println!("{}", status_rx.borrow().as_str()),
            "report" => match persona.faculty_report() {
                Some(report) => println!("{report}"),
                None => println!("The {} variant keeps no faculty report.", persona.variant()),
            },
            "save" => match persona.save().await {
                Ok(()) => println!("Saved to {}", state_path.display()),
                Err(e) => println!("{}", Color::Red.paint(format!("Save failed: {e}"))),
            },
            _ => {
                let outcome = persona.process_interaction(input).await?;
                println!(
                    "{} {}",
                    Color::Cyan.paint(format!("Nexarion ({}):", outcome.snapshot.dominant_label())),
                    outcome.response
                );
            }
        }
    }

    for task in &tasks {
        task.abort();
    }
    if let Err(e) = persona.save().await {
        tracing::warn!("Final save failed: {}", e);
    }

    drop(persona);
    drop(emotions);
    let _ = actor.await;
    println!("{}", Color::Cyan.paint("Goodbye."));
    Ok(())
}
