//! pagelingo 命令行入口
//!
//! 读取页面文档（文件或标准输入），执行一条宿主命令，再把文档写回。

use std::io::{self, Write};
use std::path::Path;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagelingo::core::{read_input, PageDocument, STDIO_PATH};
use pagelingo::env::{self, EnvVar};
use pagelingo::translation::error::helpers;
use pagelingo::translation::{
    dispatch, ConfigManager, HostCommand, HostResponse, PageTranslator, TranslationConfig,
    TranslationError, TranslationResult,
};
use pagelingo::utils::StatusToast;

/// pagelingo CLI
#[derive(Parser)]
#[command(name = "pagelingo")]
#[command(about = "Translate web pages with a local completion model, keeping inline markup")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Completion endpoint base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Target language code
    #[arg(short, long, global = true)]
    target_lang: Option<String>,

    /// Input document encoding
    #[arg(short, long, global = true)]
    encoding: Option<String>,

    /// Accept model output without plausibility checks
    #[arg(long, global = true)]
    no_validate: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a page in place
    Page(DocumentArgs),

    /// Switch a translated page between original and translated text
    Toggle(DocumentArgs),

    /// Print the translation state of a page as JSON
    State {
        /// Input document, `-` for stdin
        input: String,
    },

    /// Translate a piece of text
    Selection {
        /// Text to translate
        text: String,
    },

    /// Run a raw host command, e.g. '{"action":"toggleTranslation"}'
    Exec {
        #[command(flatten)]
        document: DocumentArgs,

        /// Command JSON
        #[arg(long)]
        command: String,
    },

    /// Write an example configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "pagelingo.toml")]
        path: String,
    },

    /// Print environment variable documentation
    EnvDocs,
}

#[derive(Args)]
struct DocumentArgs {
    /// Input document, `-` for stdin
    input: String,

    /// Output path; defaults to overwriting the input (stdout for stdin)
    #[arg(short, long)]
    output: Option<String>,
}

impl DocumentArgs {
    fn output_target(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        helpers::log_error(&e);
        eprintln!("错误: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = match env::core::LogLevel::get_if_set() {
        Some(Ok(level)) => level,
        _ if verbose => "debug".to_string(),
        _ if quiet => "warn".to_string(),
        _ => "info".to_string(),
    };
    let ansi = !env::core::NoColor::get().unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_ansi(ansi),
        )
        .init();
}

fn run(cli: Cli) -> TranslationResult<()> {
    match &cli.command {
        Commands::InitConfig { path } => {
            ConfigManager::generate_example_config(path)?;
            println!("已生成示例配置: {}", path);
            return Ok(());
        }
        Commands::EnvDocs => {
            print!("{}", env::generate_env_docs());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(execute(&cli, &config))
}

/// 加载配置并应用命令行覆盖
fn load_config(cli: &Cli) -> TranslationResult<TranslationConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigManager::from_path(path)?.into_config(),
        None => ConfigManager::new()?.into_config(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.trim_end_matches('/').to_string();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(target_lang) = &cli.target_lang {
        config.target_lang = target_lang.clone();
    }
    if cli.no_validate {
        config.enforce_validation = false;
    }

    config.validate()?;
    Ok(config)
}

async fn execute(cli: &Cli, config: &TranslationConfig) -> TranslationResult<()> {
    let (command, document_args, json_output) = match &cli.command {
        Commands::Page(args) => (HostCommand::TranslatePage, Some(args), false),
        Commands::Toggle(args) => (HostCommand::ToggleTranslation, Some(args), false),
        Commands::State { .. } => (HostCommand::GetTranslationState, None, true),
        Commands::Selection { text } => (
            HostCommand::TranslateSelection { text: text.clone() },
            None,
            false,
        ),
        Commands::Exec { document, command } => {
            (HostCommand::from_json(command)?, Some(document), true)
        }
        Commands::InitConfig { .. } | Commands::EnvDocs => return Ok(()),
    };

    let input = match &cli.command {
        Commands::State { input } => Some(input.as_str()),
        _ => document_args.map(|args| args.input.as_str()),
    };

    let show_progress = !cli.quiet && command == HostCommand::TranslatePage;
    let translator = PageTranslator::from_config(config)?
        .with_progress(Box::new(StatusToast::new(!show_progress)));

    let document = match input {
        Some(input) if command.needs_document() => {
            Some(load_document(input, cli.encoding.as_deref())?)
        }
        _ => None,
    };
    let root = document.as_ref().map(PageDocument::body).transpose()?;

    let response = dispatch(&translator, root.as_ref(), command.clone()).await?;

    let mut writes_stdout = false;
    if let (Some(document), Some(args)) = (&document, document_args) {
        if command.mutates_document() {
            let target = args.output_target();
            write_output(&document.to_bytes()?, target)?;
            writes_stdout = target == STDIO_PATH;
        }
    }

    print_response(&response, json_output, writes_stdout)
}

fn load_document(input: &str, encoding: Option<&str>) -> TranslationResult<PageDocument> {
    let data = read_input(input)
        .map_err(|e| TranslationError::IoError(format!("无法读取 {}: {}", input, e)))?;
    PageDocument::from_bytes(&data, encoding)
}

/// 写出文档；写入文件时先写临时文件再原子替换
fn write_output(bytes: &[u8], target: &str) -> TranslationResult<()> {
    if target == STDIO_PATH {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        return Ok(());
    }

    let path = Path::new(target);
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path)
        .map_err(|e| TranslationError::IoError(format!("无法写入 {}: {}", target, e)))?;

    tracing::debug!("已写入 {}", target);
    Ok(())
}

/// 输出命令响应；文档占用标准输出时改写到标准错误
fn print_response(response: &HostResponse, json: bool, stdout_busy: bool) -> TranslationResult<()> {
    let text = match response {
        HostResponse::Message { message } if !json => message.clone(),
        _ => response.to_json()?,
    };

    if stdout_busy {
        eprintln!("{}", text);
    } else {
        println!("{}", text);
    }
    Ok(())
}
