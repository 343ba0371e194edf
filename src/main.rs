//! 命令行入口

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use lexical_overlay::env::{core::LogLevel, generate_env_docs, EnvVar};
use lexical_overlay::parsers::html::classify::{collect_outermost, NodeKind};
use lexical_overlay::parsers::Document;
use lexical_overlay::translation::config::{config_file_exists, load_engine_config};
use lexical_overlay::translation::pipeline::full_revert;
use lexical_overlay::translation::storage::settings::{
    KEY_LEARNING_LEVEL, KEY_TARGET_LANGUAGE, KEY_TRANSLATION_ENABLED,
};
use lexical_overlay::translation::{
    Capabilities, ConfigManager, EngineConfig, HttpTranslationClient, LifecycleController,
    MemoryStore, RunOutcome, Settings, StaticBackend,
};

#[derive(Parser, Debug)]
#[command(
    name = "lexical-overlay",
    about = "Overlay translated vocabulary onto HTML documents",
    version
)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate an HTML file with translated vocabulary.
    Annotate {
        /// HTML file to annotate.
        input: PathBuf,
        /// Local translations JSON file (same shape as the service response).
        #[arg(short, long)]
        translations: Option<PathBuf>,
        /// Write the result here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Target language code.
        #[arg(short, long)]
        language: Option<String>,
        /// Learning level.
        #[arg(long)]
        level: Option<String>,
    },
    /// Restore the original text of an annotated HTML file.
    Revert {
        /// Annotated HTML file.
        input: PathBuf,
        /// Write the result here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check whether the translation service is reachable.
    Health,
    /// Show the effective configuration.
    Config {
        /// Write an example configuration file to this path.
        #[arg(long, value_name = "PATH")]
        init: Option<PathBuf>,
        /// Print the environment variable reference.
        #[arg(long)]
        env: bool,
    },
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let level = LogLevel::get()
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Annotate {
            input,
            translations,
            output,
            language,
            level,
        } => handle_annotate(
            config,
            &input,
            translations.as_deref(),
            output.as_deref(),
            language,
            level,
        ),
        Command::Revert { input, output } => handle_revert(&input, output.as_deref()),
        Command::Health => handle_health(&config),
        Command::Config { init, env } => handle_config(&config, init.as_deref(), env),
    }
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(ConfigManager::from_file(path)?.into_config()),
        None => Ok(load_engine_config()),
    }
}

fn handle_annotate(
    config: EngineConfig,
    input: &Path,
    translations: Option<&Path>,
    output: Option<&Path>,
    language: Option<String>,
    level: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let html = fs::read(input)?;
    let document = Document::parse_bytes(&html, "utf-8");

    let defaults = Settings::default();
    let store = MemoryStore::new()
        .with(
            KEY_TARGET_LANGUAGE,
            Value::String(language.unwrap_or(defaults.target_language)),
        )
        .with(
            KEY_LEARNING_LEVEL,
            Value::String(level.unwrap_or(defaults.learning_level)),
        )
        .with(KEY_TRANSLATION_ENABLED, Value::Bool(true));

    let runtime = tokio::runtime::Runtime::new()?;
    let mut controller =
        LifecycleController::new(document, config.clone(), Box::new(store), Capabilities::default());

    let outcome = match controller.start() {
        None => RunOutcome::NotStarted,
        Some(ticket) => match translations {
            Some(path) => {
                let backend = StaticBackend::from_file(path)?;
                runtime.block_on(controller.execute(ticket, &backend))
            }
            None => {
                let backend = HttpTranslationClient::new(&config)?;
                runtime.block_on(controller.execute(ticket, &backend))
            }
        },
    };

    match outcome {
        RunOutcome::Applied(stats) => tracing::info!(
            "已替换 {} 个文本节点，生成 {} 个译词",
            stats.wrappers_created,
            stats.markers_created
        ),
        RunOutcome::Failed(e) => return Err(e.into()),
        other => tracing::info!("没有应用任何翻译: {:?}", other),
    }

    write_output(output, &controller.document().to_html())
}

fn handle_revert(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let html = fs::read(input)?;
    let document = Document::parse_bytes(&html, "utf-8");
    let root = document.content_root();

    let stats = full_revert(&document, &root);
    for ui in collect_outermost(&root, NodeKind::EngineUi) {
        document.remove_node(&ui);
    }
    tracing::info!(
        "已还原 {} 个包装容器，跳过 {} 个标记",
        stats.wrappers_reverted,
        stats.markers_skipped
    );

    write_output(output, &document.to_html())
}

fn handle_health(config: &EngineConfig) -> Result<(), Box<dyn Error>> {
    let client = HttpTranslationClient::new(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(client.health_check())?;
    println!("Translation service is reachable at {}", config.health_url);
    Ok(())
}

fn handle_config(config: &EngineConfig, init: Option<&Path>, env: bool) -> Result<(), Box<dyn Error>> {
    if let Some(path) = init {
        ConfigManager::generate_example_config(&path.to_string_lossy())?;
        println!("Wrote example configuration to {}", path.display());
        return Ok(());
    }
    if env {
        print!("{}", generate_env_docs());
        return Ok(());
    }

    if !config_file_exists() {
        tracing::info!("没有找到配置文件，显示默认配置");
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn write_output(output: Option<&Path>, html: &str) -> Result<(), Box<dyn Error>> {
    match output {
        Some(path) => fs::write(path, html)?,
        None => println!("{}", html),
    }
    Ok(())
}
