use std::{io::Write, sync::Arc};

use anyhow::{Context, bail};
use futures::future::join_all;
use review_cache::{MemoryCacheStore, MemorySearchBackend, ReviewLister, ReviewRecord};
use serde_json::{Value, json};

use super::config::{ListArgs, NodeConfig};

/// Parses JSON-lines review documents. Blank lines are ignored.
fn parse_documents(text: &str) -> anyhow::Result<Vec<Value>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).with_context(|| format!("line {} is not JSON", number + 1))
        })
        .collect()
}

pub async fn run(config: &NodeConfig, args: &ListArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&args.docs)
        .await
        .with_context(|| format!("failed to read {}", args.docs.display()))?;
    let documents = parse_documents(&text)?;
    tracing::info!(documents = documents.len(), path = %args.docs.display(), "indexed documents");
    list(config, documents, args, out).await
}

/// Issues `args.concurrency` identical listings against an in-memory index
/// holding `documents`, then prints the page and the read-path counters.
async fn list(
    config: &NodeConfig,
    documents: Vec<Value>,
    args: &ListArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let search = Arc::new(MemorySearchBackend::new());
    search.extend(&config.reader.index, documents);
    let lister = ReviewLister::with_config(
        Arc::new(MemoryCacheStore::new()),
        search,
        config.reader.clone(),
    );

    let pages = join_all(
        (0..args.concurrency).map(|_| lister.list_by_store(args.store, args.offset, args.limit)),
    )
    .await
    .into_iter()
    .collect::<Result<Vec<Vec<ReviewRecord>>, _>>()?;

    let Some((page, rest)) = pages.split_first() else {
        bail!("no listing was issued");
    };
    if rest.iter().any(|other| other != page) {
        bail!("coalesced callers received different pages");
    }

    while lister.reader().in_flight() > 0 {
        tokio::task::yield_now().await;
    }

    for record in page {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    let stats = lister.reader().stats().snapshot();
    serde_json::to_writer(&mut *out, &json!({ "stats": stats }))?;
    writeln!(out)?;

    tracing::info!(
        records = page.len(),
        callers = args.concurrency,
        backend_queries = stats.backend_queries,
        coalesced_waits = stats.coalesced_waits,
        "listing complete"
    );
    Ok(())
}
