use askbot::{
    AppProfile, Backend, ConfigurationError, GenerationRequest, GeneratorConfig, OllamaClient,
    ResponseGenerator,
};
use clap::{Args, Parser, Subcommand};
use miette::{Result, WrapErr};
use shared::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "askbot-cli")]
#[command(about = "Ask a language model a question from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one question and print the answer
    Ask(AskArgs),
    /// List the models offered for each backend
    Models,
}

#[derive(Args)]
struct AskArgs {
    question: String,

    /// `openai` or `ollama`
    #[arg(long, default_value = "ollama")]
    backend: String,

    /// Defaults to the first model in the backend's catalog
    #[arg(long)]
    model: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// API key for the hosted backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    credential: Option<String>,

    #[arg(long, value_enum, default_value_t = AppProfile::Combined)]
    profile: AppProfile,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askbot=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = GeneratorConfig::from_env();

    match cli.command {
        Command::Ask(args) => ask(&config, args).await,
        Command::Models => models(&config).await,
    }
}

async fn ask(config: &GeneratorConfig, args: AskArgs) -> Result<()> {
    let backend: Backend = args.backend.parse().map_err(ConfigurationError::from)?;

    let request = GenerationRequest {
        question: args.question,
        backend,
        model: args
            .model
            .unwrap_or_else(|| backend.default_model().to_string()),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        credential: args.credential,
    };

    let generator = ResponseGenerator::new(config, args.profile);
    let answer = generator
        .generate(&request)
        .await
        .wrap_err("Could not answer the question")?;

    println!("{answer}");

    Ok(())
}

async fn models(config: &GeneratorConfig) -> Result<()> {
    for backend in Backend::all() {
        println!("{}:", backend.display_name());
        for model in backend.models() {
            println!("  {model}");
        }
    }

    let ollama = OllamaClient::new(&config.endpoints.ollama)?;
    match ollama.list_models().await {
        Ok(installed) => {
            println!("Installed in Ollama ({}):", config.endpoints.ollama);
            for model in installed {
                println!("  {model}");
            }
        }
        Err(e) => tracing::warn!("Could not list local models: {}", e),
    }

    Ok(())
}
