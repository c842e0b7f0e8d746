use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use rgomoku_client::{
    AnalysisEvent, ClientConfig, CommandMatcher, EngineProcess, EventMonitor, InteractionLoop,
    VOCABULARY,
};

/// Gomocup (pbrain) エンジンの対話的解析ツール。
///
/// # 例
///
/// - 設定ファイルなしで起動:
///   `rgomoku-analyze --engine ./pbrain-rapfi`
///
/// - 20路盤、エンジンに引数を渡す:
///   `rgomoku-analyze --engine ./pbrain-rapfi --board-size 20 -- --mode gomocup`
#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive analysis front end for Gomocup engines")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine executable (overrides [engine] path)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Board size sent with START (overrides [session] board_size)
    #[arg(long)]
    board_size: Option<u8>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Extra arguments passed to the engine (overrides [engine] args)
    #[arg(last = true)]
    engine_args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    );
    builder
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
        })
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Stderr);
    builder.init();

    if let Err(e) = run(cli) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(path) = cli.engine {
        config.engine.path = Some(path);
    }
    if !cli.engine_args.is_empty() {
        config.engine.args = cli.engine_args;
    }
    if let Some(size) = cli.board_size {
        config.session.board_size = size;
    }
    let path = config
        .engine
        .path
        .clone()
        .ok_or_else(|| anyhow!("no engine given (use --engine or [engine] path)"))?;
    let board_size = config.session.board_size;

    let mut engine = EngineProcess::spawn(&path, &config.engine.args, config.session.clone())?;
    let session = engine.session();

    {
        let identity = session.identify().context("engine did not answer ABOUT")?;
        println!(
            "-> Engine: {} {} ({})",
            identity.name.as_deref().unwrap_or("unknown"),
            identity.version.as_deref().unwrap_or(""),
            identity.author.as_deref().unwrap_or("unknown author")
        );
    }
    if !session.check_ready(board_size).context("engine did not answer START")? {
        bail!("engine rejected START {board_size}");
    }
    session.configure(config.info.iter().map(|(key, value)| (key.as_str(), *value)))?;
    println!("-> Ready ({board_size}x{board_size})");

    let monitor: EventMonitor = Arc::new(|event: &AnalysisEvent| match event {
        AnalysisEvent::Diagnostic(info) => println!("-o-> {}", info.summary()),
        AnalysisEvent::Closed => println!("-x-> engine output closed"),
        AnalysisEvent::Result(_) => {}
    });
    let matcher = CommandMatcher::new(VOCABULARY).with_max_cost(config.matcher.max_cost);

    let stdin = io::stdin();
    InteractionLoop::new(session, stdin.lock(), io::stdout())
        .with_matcher(matcher)
        .with_monitor(monitor)
        .run()?;
    Ok(())
}
