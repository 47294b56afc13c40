use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use catbase_core::{Config, Document};
use catbase_ingest::loader::load_pdf_directory;
use catbase_ingest::{embedder_from_config, ArxivClient, Chunker};
use catbase_storage::{index_documents, inspect_collection, IndexOptions, IndexReport, VectorStore};

use crate::cli::Command;

const SEPARATOR: &str = "-----------------------------------";

pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Hello { name } => {
            println!("{}", greeting(&name));
            Ok(())
        }
        Command::List => list(&open_store(config)?),
        Command::Pluck { database_name } => pluck(&open_store(config)?, &database_name),
        Command::Inspect {
            database_name,
            sample,
        } => inspect(&open_store(config)?, &database_name, sample),
        Command::Create {
            database_name,
            pdf_directory,
        } => create(config, &database_name, &pdf_directory).await,
        Command::Arxiv {
            database_name,
            keyword_list,
            max_docs,
        } => arxiv(config, &database_name, &keyword_list, max_docs).await,
    }
}

fn greeting(name: &str) -> String {
    format!("Hello {name}!")
}

fn open_store(config: &Config) -> Result<VectorStore> {
    VectorStore::from_config(config).with_context(|| {
        format!(
            "failed to open storage at {}",
            config.storage.storage_path.display()
        )
    })
}

fn list(store: &VectorStore) -> Result<()> {
    let names = store.list_collections().context("failed to list collections")?;
    println!("Listing databases:");
    println!("{SEPARATOR}");
    for name in &names {
        println!("{name}");
    }
    println!("{SEPARATOR}");
    println!("That's it! :)");
    Ok(())
}

fn pluck(store: &VectorStore, name: &str) -> Result<()> {
    store
        .delete_collection(name)
        .with_context(|| format!("failed to delete collection '{name}'"))?;
    println!("Bye bye {name}!");
    Ok(())
}

fn inspect(store: &VectorStore, name: &str, sample: usize) -> Result<()> {
    let collection = store
        .get_collection(name)
        .with_context(|| format!("failed to open collection '{name}'"))?;
    print!("{}", inspect_collection(&collection, sample));
    Ok(())
}

async fn create(config: &Config, name: &str, pdf_directory: &Path) -> Result<()> {
    println!("Creating database {name} in {}", pdf_directory.display());
    let documents = load_pdfs(pdf_directory)
        .await
        .with_context(|| format!("failed to load PDFs from {}", pdf_directory.display()))?;
    let report = index(config, name, &documents).await?;
    print_report(&report);
    Ok(())
}

/// pdf-extract is blocking; keep it off the runtime workers.
async fn load_pdfs(dir: &Path) -> Result<Vec<Document>> {
    let dir = dir.to_path_buf();
    let documents = tokio::task::spawn_blocking(move || load_pdf_directory(&dir))
        .await
        .context("PDF loading task panicked")??;
    Ok(documents)
}

async fn arxiv(config: &Config, name: &str, keywords: &str, max_docs: usize) -> Result<()> {
    println!("Creating database {name} from arXiv with keywords {keywords}");
    let client = ArxivClient::from_config(&config.arxiv);
    let documents = client
        .load_documents(keywords, max_docs)
        .await
        .context("arXiv search failed")?;
    let report = index(config, name, &documents).await?;
    print_report(&report);
    Ok(())
}

async fn index(config: &Config, name: &str, documents: &[Document]) -> Result<IndexReport> {
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let store = open_store(config)?;
    let chunker = Chunker::from_config(&config.chunking).context("failed to build chunker")?;
    let embedder = embedder_from_config(config).context("failed to build embedder")?;
    let options = IndexOptions::from(&config.embedding);

    info!(documents = documents.len(), collection = name, "indexing documents");
    index_documents(&store, name, documents, &chunker, embedder, &options)
        .await
        .with_context(|| format!("failed to index collection '{name}'"))
}

fn print_report(report: &IndexReport) {
    println!(
        "Stored {} chunks from {} documents in '{}' ({} records total, {} from cache).",
        report.chunks, report.documents, report.collection, report.collection_count, report.cached
    );
    if report.pruned > 0 {
        println!("Removed {} stale chunks of re-indexed documents.", report.pruned);
    }
    println!("Done! :)");
}
