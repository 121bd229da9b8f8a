use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use grok_async::operations::{ChatParams, SearchParams, TopicParams, TrendParams};
use grok_async::types::{AnalysisType, ChatResponse, TimeWindow};
use grok_async::{Client, GrokError};
use grok_tools::types::render_text;
use grok_tools::{GrokServer, GrokTools, logging};
use rmcp::ServiceExt;
use rmcp::transport::stdio;

#[derive(Parser)]
#[command(name = "grok-tools")]
#[command(about = "X search, topic analysis, trends and chat via xAI Grok, as CLI or MCP server")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Output format for CLI results
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    format: OutputFormat,

    /// Load environment variables from a .env file in the current directory
    #[arg(long, global = true)]
    dot_env: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Full normalized response as JSON
    Json,
    /// Answer text followed by sources
    Text,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Query(QueryCommand),
    /// Start MCP server on stdio
    Mcp,
}

/// One-shot commands that print a single response
#[derive(Subcommand)]
enum QueryCommand {
    /// Search recent X posts and analyze sentiment/themes
    Search {
        /// Search query
        query: String,
        /// 15min, 1hr, 4hr, 24hr or 7d
        #[arg(long, default_value = "4hr")]
        time_window: TimeWindow,
        /// sentiment, themes or both
        #[arg(long, default_value = "both")]
        analysis: AnalysisType,
        /// Maximum posts to analyze
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Analyze a topic along specific aspects
    Topic {
        /// Topic to analyze
        topic: String,
        /// Comma-separated aspects (default: sentiment,key_voices,themes,controversies)
        #[arg(long, value_delimiter = ',')]
        aspects: Vec<String>,
        /// 15min, 1hr, 4hr, 24hr or 7d
        #[arg(long, default_value = "4hr")]
        time_window: TimeWindow,
    },
    /// List what is trending on X today
    Trends {
        /// Restrict to a category
        #[arg(long)]
        category: Option<String>,
        /// Number of trends
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Ask Grok a free-form question
    Chat {
        /// Prompt text
        prompt: String,
        /// Ground the answer in live X search
        #[arg(long, overrides_with = "no_search")]
        search: bool,
        /// Answer without X search (default)
        #[arg(long, overrides_with = "search")]
        no_search: bool,
        /// Sampling temperature between 0 and 2
        #[arg(long)]
        temperature: Option<f64>,
        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Before logging so RUST_LOG from .env applies
    let dot_env = args.dot_env.then(dotenvy::dotenv);

    logging::init(args.verbose)?;
    match dot_env {
        Some(Ok(path)) => tracing::debug!("Loaded environment from {}", path.display()),
        Some(Err(e)) => tracing::warn!("Failed to load .env: {e}"),
        None => {}
    }

    match args.command {
        Commands::Mcp => run_mcp_server().await,
        Commands::Query(command) => run_cli(command, args.format).await,
    }
}

async fn run_mcp_server() -> Result<()> {
    let client = Client::from_env()?;
    let server = GrokServer::new(GrokTools::new(client));
    tracing::info!("Starting grok-tools MCP server on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

async fn run_cli(command: QueryCommand, format: OutputFormat) -> Result<()> {
    let client = Client::from_env().unwrap_or_else(|e| exit_with(&e));

    let result = match command {
        QueryCommand::Search {
            query,
            time_window,
            analysis,
            limit,
        } => {
            client
                .search_posts(SearchParams {
                    query,
                    time_window,
                    analysis_type: analysis,
                    limit,
                })
                .await
        }
        QueryCommand::Topic {
            topic,
            aspects,
            time_window,
        } => {
            client
                .analyze_topic(TopicParams {
                    topic,
                    aspects,
                    time_window,
                })
                .await
        }
        QueryCommand::Trends { category, limit } => {
            client.detect_trends(TrendParams { category, limit }).await
        }
        QueryCommand::Chat {
            prompt,
            search,
            no_search,
            temperature,
            max_tokens,
        } => {
            client
                .chat(ChatParams {
                    prompt,
                    search: search && !no_search,
                    temperature,
                    max_tokens,
                })
                .await
        }
    };

    match result {
        Ok(resp) => print_response(&resp, format),
        Err(e) => exit_with(&e),
    }
}

fn print_response(resp: &ChatResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(resp)?),
        OutputFormat::Text => println!("{}", render_text(resp)),
    }
    Ok(())
}

fn exit_with(err: &GrokError) -> ! {
    let body = serde_json::json!({ "error": err.to_payload() });
    match serde_json::to_string_pretty(&body) {
        Ok(text) => eprintln!("{text}"),
        Err(_) => eprintln!("{{\"error\":{{\"message\":\"{err}\",\"status\":{}}}}}", err.status()),
    }
    std::process::exit(1);
}
