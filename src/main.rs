//! Page Anchor CLI
//!
//! Runs the highlight pipeline against saved page snapshots: restore a
//! page's stored highlights, add new ones, inspect addresses.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use anyhow::{anyhow, Context};
    use clap::{Parser, Subcommand};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    use page_anchor::path::{parse, resolve_path};
    use page_anchor::storage::JsonFileStorage;
    use page_anchor::timer::TokioTimer;
    use page_anchor::{
        normalize_url, Document, HighlightColor, HighlighterConfig, PageSession, TextSearchEngine,
    };

    #[derive(Parser)]
    #[command(name = "page-anchor", version, about = "Durable text highlights for saved pages")]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Restore a page's stored highlights and report what came back
        Restore {
            #[command(flatten)]
            page: PageArgs,
        },
        /// Highlight the first occurrence of some text and store it
        Highlight {
            #[command(flatten)]
            page: PageArgs,
            /// Text to highlight
            #[arg(long)]
            text: String,
            /// yellow, green, blue or pink
            #[arg(long, default_value = "yellow")]
            color: String,
        },
        /// Resolve a structural address against a snapshot
        Resolve {
            /// HTML snapshot
            #[arg(long)]
            html: PathBuf,
            /// Address such as div[0]/p[1]/text[0]
            path: String,
        },
        /// Print the normalized form and storage key of a URL
        NormalizeUrl { url: String },
    }

    #[derive(clap::Args)]
    struct PageArgs {
        /// HTML snapshot of the page
        #[arg(long)]
        html: PathBuf,
        /// Page URL
        #[arg(long)]
        url: String,
        /// JSON highlight store
        #[arg(long, env = "PAGE_ANCHOR_STORE", default_value = "highlights.json")]
        store: PathBuf,
    }

    async fn open(
        page: &PageArgs,
        config: HighlighterConfig,
    ) -> anyhow::Result<PageSession<JsonFileStorage>> {
        let html = tokio::fs::read_to_string(&page.html)
            .await
            .with_context(|| format!("reading {}", page.html.display()))?;
        let storage = JsonFileStorage::new(&page.store);
        Ok(PageSession::new(&page.url, Document::parse_html(&html), storage, config)?)
    }

    pub async fn run() -> anyhow::Result<()> {
        // Initialize tracing
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "page_anchor=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();

        // Load configuration
        dotenvy::dotenv().ok();
        let config = HighlighterConfig::from_env();

        match Cli::parse().command {
            Command::Restore { page } => {
                let mut session = open(&page, config).await?;
                let summary = session.restore(&TokioTimer::new()).await?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                for (id, text) in session.store().quotes() {
                    println!("{id}\t{}", page_anchor::text::excerpt(text, 60));
                }
            }
            Command::Highlight { page, text, color } => {
                let color: HighlightColor = color.parse()?;
                let mut session = open(&page, config).await?;
                session.restore(&TokioTimer::new()).await?;

                let needle = page_anchor::text::normalize_text(&text);
                let (range, tier) = TextSearchEngine::new()
                    .search(session.document_mut(), &needle)
                    .ok_or_else(|| anyhow!("text not found on page: {needle}"))?;
                tracing::debug!(?tier, "located text");

                let id = session.highlight_range(&range, color).await?;
                println!("{id}");
            }
            Command::Resolve { html, path } => {
                let raw = tokio::fs::read_to_string(&html)
                    .await
                    .with_context(|| format!("reading {}", html.display()))?;
                let doc = Document::parse_html(&raw);
                let parsed = parse(&path)?;
                match resolve_path(&doc, &parsed) {
                    Some(node) if doc.is_text(node) => {
                        println!("text: {:?}", doc.text(node).unwrap_or_default())
                    }
                    Some(node) => println!(
                        "<{}>: {:?}",
                        doc.tag(node).unwrap_or_default(),
                        page_anchor::text::excerpt(&doc.text_content(node), 80)
                    ),
                    None => return Err(anyhow!("address does not resolve: {path}")),
                }
            }
            Command::NormalizeUrl { url } => {
                let normalized = normalize_url(&url, &config.url.tracking_params)?;
                println!("{normalized}");
                println!("{}", page_anchor::storage_key(&normalized));
            }
        }

        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
