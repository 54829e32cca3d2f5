use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context};
use blox_block::RmOptions;
use blox_pin::{PinKind, PinQueryScope};
use blox_types::{normalize, ContentId};
use colored::Colorize;
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;

use crate::cli::*;
use crate::listing::{normalize_key, ListingPrinter, StoreLister};
use crate::repo::Repo;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        repo: root,
        format: out,
        ..
    } = cli;
    if let Command::Init = command {
        return cmd_init(&root).await;
    }

    let repo = Repo::open(&root).await?;
    match command {
        Command::Init => Ok(()),
        Command::Block(BlockCommand::Put(args)) => cmd_block_put(&repo, args, out).await,
        Command::Block(BlockCommand::Rm(args)) => cmd_block_rm(&repo, args, out).await,
        Command::Block(BlockCommand::Stat(args)) => cmd_block_stat(&repo, args, out).await,
        Command::Pin(PinCommand::Add(args)) => cmd_pin_add(&repo, args, out).await,
        Command::Pin(PinCommand::Rm(args)) => cmd_pin_rm(&repo, args, out).await,
        Command::Pin(PinCommand::Ls(args)) => cmd_pin_ls(&repo, args, out).await,
        Command::Ls(args) => cmd_ls(&repo, args, out).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

async fn cmd_init(root: &Path) -> anyhow::Result<()> {
    let repo = Repo::init(root).await?;
    println!(
        "{} Initialized blox repository in {}",
        "✓".green().bold(),
        repo.root().display().to_string().bold()
    );
    println!("  Removal concurrency: {}", repo.config.block.rm_concurrency);
    Ok(())
}

async fn cmd_block_put(repo: &Repo, args: PutArgs, out: OutputFormat) -> anyhow::Result<()> {
    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let id = repo.blocks()?.put(data, args.block_format).await?;
    match out {
        OutputFormat::Json => print_json(&serde_json::json!({ "id": id })),
        OutputFormat::Text => {
            println!("{id}");
            Ok(())
        }
    }
}

async fn cmd_block_rm(repo: &Repo, args: RmArgs, out: OutputFormat) -> anyhow::Result<()> {
    let options = RmOptions {
        force: args.force,
        quiet: args.quiet,
    };
    let mut outcomes = repo.blocks()?.rm(args.ids, options);
    let mut failed = 0usize;

    while let Some(item) = outcomes.next().await {
        let outcome = item?;
        if out == OutputFormat::Json {
            print_json(&outcome)?;
        }
        match &outcome.error {
            Some(error) => {
                failed += 1;
                if out == OutputFormat::Text {
                    eprintln!("{}", error.red());
                }
            }
            None if out == OutputFormat::Text => println!("removed {}", outcome.id),
            None => {}
        }
    }

    if failed > 0 {
        return Err(anyhow!("{failed} block(s) could not be removed"));
    }
    Ok(())
}

async fn cmd_block_stat(repo: &Repo, args: StatArgs, out: OutputFormat) -> anyhow::Result<()> {
    let stat = repo.blocks()?.stat(args.id).await?;
    match out {
        OutputFormat::Json => print_json(&stat),
        OutputFormat::Text => {
            println!("Key: {}", stat.id.to_string().yellow());
            println!("Size: {}", stat.size);
            Ok(())
        }
    }
}

async fn cmd_pin_add(repo: &Repo, args: PinAddArgs, out: OutputFormat) -> anyhow::Result<()> {
    let kind = if args.recursive {
        PinKind::Recursive
    } else {
        PinKind::Direct
    };
    let children = args
        .children
        .iter()
        .map(|c| normalize(c.as_str()))
        .collect::<Result<Vec<ContentId>, _>>()?;
    let id = repo.pinning().pin(args.id, kind, children).await?;
    repo.save_pins()?;
    match out {
        OutputFormat::Json => print_json(&serde_json::json!({ "id": id, "type": kind })),
        OutputFormat::Text => {
            println!("pinned {} {}", id, kind.name().cyan());
            Ok(())
        }
    }
}

async fn cmd_pin_rm(repo: &Repo, args: PinRmArgs, out: OutputFormat) -> anyhow::Result<()> {
    let target = args.id;
    if !repo.pinning().unpin(target.as_str()).await? {
        return Err(anyhow!("{target} is not pinned"));
    }
    repo.save_pins()?;
    match out {
        OutputFormat::Json => print_json(&serde_json::json!({ "id": target, "unpinned": true })),
        OutputFormat::Text => {
            println!("unpinned {target}");
            Ok(())
        }
    }
}

fn parse_scope(kind: &str) -> anyhow::Result<PinQueryScope> {
    if kind == "all" {
        return Ok(PinQueryScope::ALL);
    }
    Ok(PinQueryScope::from(kind.parse::<PinKind>()?))
}

async fn cmd_pin_ls(repo: &Repo, args: PinLsArgs, out: OutputFormat) -> anyhow::Result<()> {
    let scope = parse_scope(&args.kind)?;
    for (id, kind) in repo.pinning().list(scope).await? {
        match out {
            OutputFormat::Json => print_json(&serde_json::json!({ "id": id, "type": kind }))?,
            OutputFormat::Text => println!("{} {}", id, kind.name().cyan()),
        }
    }
    Ok(())
}

async fn cmd_ls(repo: &Repo, args: LsArgs, out: OutputFormat) -> anyhow::Result<()> {
    let key = normalize_key(&args.key);
    debug!(key = %key.path, recursive = args.recursive, base = %args.cid_base, "listing");
    let mut entries = StoreLister::new(repo.store.as_ref()).list(&key);

    match out {
        OutputFormat::Json => {
            while let Some(entry) = entries.next().await {
                let entry = entry?;
                print_json(&serde_json::json!({
                    "id": entry.id.to_text_in(args.cid_base),
                    "name": entry.name,
                    "size": entry.size,
                    "kind": entry.kind,
                }))?;
            }
        }
        OutputFormat::Text => {
            let stdout = std::io::stdout();
            let mut printer = ListingPrinter::new(stdout.lock(), key.depth, args.headers)
                .with_base(args.cid_base);
            while let Some(entry) = entries.next().await {
                printer.print(&entry?)?;
            }
            printer.into_inner().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blox_types::TextBase;

    #[test]
    fn pin_scope_names() {
        assert_eq!(parse_scope("all").unwrap(), PinQueryScope::ALL);
        assert_eq!(parse_scope("direct").unwrap(), PinQueryScope::DIRECT);
        assert_eq!(parse_scope("indirect").unwrap(), PinQueryScope::INDIRECT);
        assert!(parse_scope("sideways").is_err());
    }

    #[tokio::test]
    async fn rm_reports_failure_after_processing_everything() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("node")).await.unwrap();
        let blocks = repo.blocks().unwrap();
        let kept = blocks.put(b"kept".to_vec(), blox_types::BlockFormat::Raw).await.unwrap();
        let gone = blocks.put(b"gone".to_vec(), blox_types::BlockFormat::Raw).await.unwrap();
        repo.pinning().pin(kept, PinKind::Direct, vec![]).await.unwrap();

        let args = RmArgs {
            ids: vec![kept.to_string(), gone.to_string()],
            force: false,
            quiet: false,
        };
        assert!(cmd_block_rm(&repo, args, OutputFormat::Text).await.is_err());
        assert!(blocks.stat(kept).await.is_ok());
        assert!(blocks.stat(gone).await.is_err());
    }

    #[tokio::test]
    async fn forced_rm_of_pinned_block_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("node")).await.unwrap();
        let id = repo
            .blocks()
            .unwrap()
            .put(b"p".to_vec(), blox_types::BlockFormat::Raw)
            .await
            .unwrap();
        repo.pinning().pin(id, PinKind::Direct, vec![]).await.unwrap();

        let forced = RmArgs {
            ids: vec![id.to_string()],
            force: true,
            quiet: false,
        };
        assert!(cmd_block_rm(&repo, forced, OutputFormat::Json).await.is_ok());
    }

    #[tokio::test]
    async fn ls_streams_in_either_base() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("node")).await.unwrap();
        let id = repo
            .blocks()
            .unwrap()
            .put(b"listed".to_vec(), blox_types::BlockFormat::Raw)
            .await
            .unwrap();

        for base in [TextBase::Base16, TextBase::Base32] {
            let args = LsArgs {
                key: format!("/blox/{}", id.to_text_in(base)),
                headers: true,
                recursive: false,
                cid_base: base,
            };
            cmd_ls(&repo, args, OutputFormat::Text).await.unwrap();
        }
        let missing = LsArgs {
            key: ContentId::compute(blox_types::BlockFormat::Raw, b"absent").to_string(),
            headers: false,
            recursive: false,
            cid_base: TextBase::Base32,
        };
        assert!(cmd_ls(&repo, missing, OutputFormat::Json).await.is_err());
    }

    #[tokio::test]
    async fn pins_persist_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("node");
        let repo = Repo::init(&root).await.unwrap();
        let id = repo
            .blocks()
            .unwrap()
            .put(b"persist".to_vec(), blox_types::BlockFormat::Raw)
            .await
            .unwrap();
        let args = PinAddArgs {
            id: id.to_string(),
            recursive: false,
            children: vec![],
        };
        cmd_pin_add(&repo, args, OutputFormat::Json).await.unwrap();

        let reopened = Repo::open(&root).await.unwrap();
        assert_eq!(
            reopened.pinning().list(PinQueryScope::ALL).await.unwrap(),
            vec![(id, PinKind::Direct)]
        );
    }
}
