use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use canvas_actions::{find_file_block, ActionParser, MutationCommand, RootAlias};
use canvas_context::{minimal_common_ancestor, serialize_with, SerializeOptions, Serialized};
use canvas_core::ConfigStore;
use canvas_observability::{
    canonical_logs_dir_from_root, emit_event, init_process_logging, ObservabilityEvent, ProcessKind,
};
use canvas_types::OutlineNode;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "canvas-engine")]
#[command(about = "Replay agent action streams and render canvas context offline")]
struct Cli {
    #[arg(long, global = true, env = "CANVAS_STATE_DIR")]
    state_dir: Option<String>,
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream a recorded response through the incremental parser.
    Replay {
        /// Response text or bare action lines; `-` reads stdin.
        #[arg(long)]
        file: String,
        #[arg(long, default_value_t = 64)]
        chunk: usize,
        /// Instance id of the page's generated root container.
        #[arg(long)]
        root_id: Option<String>,
    },
    /// Serialize the minimal subtree covering the given ids.
    Context {
        #[arg(long)]
        outline: PathBuf,
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let state_dir = resolve_state_dir(cli.state_dir);
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| state_dir.join("config.json"));
    let config = ConfigStore::new(&config_path, None).await?.get().await;

    let logs_dir = canonical_logs_dir_from_root(&state_dir);
    let (_log_guard, log_info) =
        init_process_logging(ProcessKind::Engine, &logs_dir, config.logging.retention_days)?;
    emit_event(
        tracing::Level::INFO,
        ProcessKind::Engine,
        ObservabilityEvent {
            event: "logging.initialized",
            component: "engine.main",
            status: Some("ok"),
            detail: Some("engine jsonl logging initialized"),
            ..ObservabilityEvent::default()
        },
    );
    info!("engine logging initialized: {:?}", log_info);

    match cli.command {
        Command::Replay {
            file,
            chunk,
            root_id,
        } => {
            let text = read_input(&file)?;
            let alias = config.actions.root_alias(root_id);
            let commands = replay(&text, chunk, &alias)?;
            for command in &commands {
                println!("{}", serde_json::to_string(command)?);
            }
            info!(commands = commands.len(), "replay matched one-shot parse");
        }
        Command::Context { outline, ids } => {
            let raw = std::fs::read_to_string(&outline)
                .with_context(|| format!("failed to read {}", outline.display()))?;
            let root: OutlineNode =
                serde_json::from_str(&raw).context("outline is not a valid outline tree")?;
            let rendered = render_context(&root, &ids, &config.context.serialize_options());
            println!("{}", rendered.text);
            let namespaces = rendered.namespaces.into_iter().collect::<Vec<_>>();
            println!("namespaces: {}", namespaces.join(", "));
        }
    }

    Ok(())
}

fn resolve_state_dir(flag: Option<String>) -> PathBuf {
    if let Some(dir) = flag {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_dir()
        .map(|dir| dir.join("canvas"))
        .unwrap_or_else(|| PathBuf::from(".canvas"))
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input.trim() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    let path = Path::new(input);
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Action lines of `received`: the body of its json block when the response is fenced,
/// otherwise the text itself.
fn action_text(received: &str, fenced: bool) -> String {
    if !fenced {
        return received.to_string();
    }
    find_file_block(received, "json")
        .map(|block| block.body)
        .unwrap_or_default()
}

fn chunk_ends(text: &str, chunk: usize) -> Vec<usize> {
    let mut ends = text
        .char_indices()
        .map(|(i, _)| i)
        .step_by(chunk.max(1))
        .skip(1)
        .collect::<Vec<_>>();
    ends.push(text.len());
    ends
}

/// Feeds `text` in `chunk`-character steps and checks the result against a one-shot parse.
fn replay(text: &str, chunk: usize, alias: &RootAlias) -> anyhow::Result<Vec<MutationCommand>> {
    let fenced = find_file_block(text, "json").is_some();

    let mut parser = ActionParser::with_root_alias(alias.clone());
    let mut streamed = Vec::new();
    for end in chunk_ends(text, chunk) {
        streamed.extend(parser.feed(&action_text(&text[..end], fenced)));
    }
    streamed.extend(parser.finish(&action_text(text, fenced)));

    let one_shot = ActionParser::with_root_alias(alias.clone()).finish(&action_text(text, fenced));
    if streamed != one_shot {
        anyhow::bail!(
            "incremental parse produced {} commands, one-shot parse produced {}",
            streamed.len(),
            one_shot.len()
        );
    }
    Ok(streamed)
}

fn render_context<S: AsRef<str>>(
    root: &OutlineNode,
    ids: &[S],
    options: &SerializeOptions,
) -> Serialized {
    let scope = minimal_common_ancestor(root, ids).unwrap_or(root);
    serialize_with(scope, ids, options)
}
