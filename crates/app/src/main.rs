use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use legal_search_core::{
    BpkScraper, CharacterNgramEmbedder, ChatClient, DocumentService, MemoryStore, PdfExtractor,
    QueryService, RelevanceRanker, ResponseFormat, ScraperConfig, TextEnhancer, UserPreferences,
    Verbosity, DEFAULT_BASE_URL,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "legal-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the regulation site to scrape.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    site_url: String,

    /// API key for the chat completion endpoint. Optional; without it
    /// the tool falls back to templated summaries.
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Chat completion base URL override.
    #[arg(long, env = "OPENAI_BASE_URL")]
    llm_url: Option<String>,

    /// Chat completion model override.
    #[arg(long, env = "OPENAI_MODEL")]
    llm_model: Option<String>,

    /// Request timeout in seconds for scraping and generation.
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Search the regulation site and synthesise an answer.
    Search {
        /// User query, e.g. "hak tanah ulayat".
        #[arg(long)]
        query: String,
        /// Number of documents to return (clamped to 1..=50).
        #[arg(long, default_value = "10")]
        max_results: usize,
        /// Answer verbosity.
        #[arg(long, value_enum, default_value_t = VerbosityArg::Detailed)]
        verbosity: VerbosityArg,
        /// Answer register.
        #[arg(long, value_enum, default_value_t = FormatArg::Simple)]
        format: FormatArg,
        /// Omit citations from the answer.
        #[arg(long, default_value_t = false)]
        no_citations: bool,
        /// Write an HTML report of the results.
        #[arg(long, default_value_t = false)]
        report: bool,
        /// Directory for the HTML report.
        #[arg(long, default_value = ".")]
        report_dir: PathBuf,
    },
    /// Download one PDF by URL and print its extracted text.
    Pdf {
        /// Direct URL of the PDF.
        #[arg(long)]
        url: String,
        /// Title to record in the document metadata.
        #[arg(long, default_value = "Untitled Document")]
        title: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum VerbosityArg {
    Concise,
    Detailed,
    Comprehensive,
}

impl From<VerbosityArg> for Verbosity {
    fn from(value: VerbosityArg) -> Self {
        match value {
            VerbosityArg::Concise => Verbosity::Concise,
            VerbosityArg::Detailed => Verbosity::Detailed,
            VerbosityArg::Comprehensive => Verbosity::Comprehensive,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Simple,
    Legal,
    Technical,
}

impl From<FormatArg> for ResponseFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Simple => ResponseFormat::Simple,
            FormatArg::Legal => ResponseFormat::Legal,
            FormatArg::Technical => ResponseFormat::Technical,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);

    let chat = ChatClient::new(cli.api_key.clone(), cli.llm_url.clone(), cli.llm_model.clone(), timeout);
    let ranker = RelevanceRanker::new(Arc::new(CharacterNgramEmbedder::default()));
    let scraper = BpkScraper::new(
        ScraperConfig {
            base_url: cli.site_url.clone(),
            timeout,
        },
        TextEnhancer::default(),
        PdfExtractor::new(timeout),
        ranker,
    )
    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let documents = DocumentService::new(
        Arc::new(scraper),
        Arc::new(MemoryStore::new()),
        PdfExtractor::new(timeout),
    );
    let service = QueryService::new(documents, chat);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "legal-search boot"
    );

    match cli.command {
        Command::Search {
            query,
            max_results,
            verbosity,
            format,
            no_citations,
            report,
            report_dir,
        } => {
            let preferences = UserPreferences {
                verbosity: verbosity.into(),
                format: format.into(),
                citations: !no_citations,
                max_results,
            };

            let result = service
                .process_query(&query, &preferences)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("query: {}", result.original_query);
            println!("keywords: {}", result.keywords.join(", "));
            println!("documents: {}", result.documents.len());

            for (index, value) in result.documents.iter().enumerate() {
                let title = value
                    .pointer("/metadata/title")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("Untitled Document");
                let source = value
                    .pointer("/metadata/source")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("Unknown source");
                let score = value
                    .pointer("/metadata/relevance_score")
                    .and_then(serde_json::Value::as_f64);
                match score {
                    Some(score) => {
                        println!("  [{}] score={score:.3} {title}", index + 1)
                    }
                    None => println!("  [{}] {title}", index + 1),
                }
                println!("      source={source}");
            }

            println!("\n{}", result.response);

            if report {
                let documents: Vec<_> = result
                    .documents
                    .iter()
                    .filter_map(legal_search_core::Document::from_value)
                    .collect();
                let path = legal_search_core::generate_html_report(
                    &report_dir,
                    &result.original_query,
                    &documents,
                    &result.response,
                )?;
                println!("report written to {}", path.display());
            }
        }
        Command::Pdf { url, title } => {
            let document = service
                .document_service()
                .extract_pdf_content(&url, &title)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("title: {}", document.title());
            if let Some(pages) = document
                .metadata
                .get("pages")
                .and_then(serde_json::Value::as_u64)
            {
                println!("pages: {pages}");
            }
            println!("\n{}", document.content);
        }
    }

    Ok(())
}
