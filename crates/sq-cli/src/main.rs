#![forbid(unsafe_code)]

//! Seqnum CLI - number the messages of Mermaid sequence diagrams.
//!
//! # Commands
//!
//! - `annotate`: Print the document with sequence numbers drawn in
//! - `scan`: Output annotation placements as JSON for tooling/debugging
//! - `blocks`: List located diagram blocks and why each one is (in)active
//! - `watch`: Re-annotate on file change (requires `watch` feature)

use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sq_core::{AnnotatorConfig, DiagramGates, DocumentKind, Placement, ThemeKind};
use sq_parser::{analyze, annotate, annotation_evidence_json, detect_document_kind};
use sq_render_term::{LabelMode, TermRenderConfig, render_term_with_config};
use tracing::{debug, info, warn};

/// Seqnum CLI - number the messages of Mermaid sequence diagrams.
#[derive(Debug, Parser)]
#[command(
    name = "sq-cli",
    version,
    about = "Seqnum CLI - number the messages of Mermaid sequence diagrams",
    long_about = "Computes the numbers Mermaid's `autonumber` directive would assign.\n\n\
        Works on standalone .mmd files and on ```mermaid fences inside Markdown."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the document with sequence numbers drawn next to each message.
    Annotate {
        /// Input file path or "-" for stdin. If omitted, reads from stdin.
        #[arg(default_value = "-")]
        input: String,

        /// How to interpret the input
        #[arg(short, long, value_enum, default_value = "auto")]
        kind: KindArg,

        /// Put labels before or after the statement
        #[arg(short, long, value_enum)]
        placement: Option<PlacementArg>,

        /// Color variant for labels
        #[arg(short, long, value_enum)]
        theme: Option<ThemeArg>,

        /// Draw `[n]` markers instead of colored badges
        #[arg(long)]
        no_color: bool,

        /// Print numbers in a left gutter instead of inline
        #[arg(long)]
        gutter: bool,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Output annotation placements as JSON.
    Scan {
        /// Input file path or "-" for stdin
        #[arg(default_value = "-")]
        input: String,

        #[arg(short, long, value_enum, default_value = "auto")]
        kind: KindArg,

        /// Output every block and message instead of a summary
        #[arg(long)]
        full: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List located diagram blocks.
    Blocks {
        /// Input file path or "-" for stdin
        #[arg(default_value = "-")]
        input: String,

        #[arg(short, long, value_enum, default_value = "auto")]
        kind: KindArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Watch a file and re-annotate on changes.
    #[cfg(feature = "watch")]
    Watch {
        /// Input file path to watch
        input: String,

        #[arg(short, long, value_enum, default_value = "auto")]
        kind: KindArg,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Clear screen before each annotation
        #[arg(long)]
        clear: bool,
    },
}

/// Document kind selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum KindArg {
    /// From the file extension, else from the first significant line
    Auto,
    Markdown,
    Mermaid,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum PlacementArg {
    Before,
    After,
}

impl From<PlacementArg> for Placement {
    fn from(value: PlacementArg) -> Self {
        match value {
            PlacementArg::Before => Self::Before,
            PlacementArg::After => Self::After,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for ThemeKind {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

/// One located block, as printed by `blocks --json`.
#[derive(Debug, Serialize)]
struct BlockSummary {
    index: usize,
    start_line: usize,
    line_count: usize,
    gates: DiagramGates,
    message_count: usize,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct BlocksResult {
    kind: DocumentKind,
    blocks: Vec<BlockSummary>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Annotate {
            input,
            kind,
            placement,
            theme,
            no_color,
            gutter,
            config,
            output,
        } => {
            let config = load_config(config.as_deref(), placement, theme)?;
            cmd_annotate(&input, kind, &config, no_color, gutter, output.as_deref())
        }

        Command::Scan {
            input,
            kind,
            full,
            pretty,
        } => cmd_scan(&input, kind, full, pretty),

        Command::Blocks { input, kind, json } => cmd_blocks(&input, kind, json),

        #[cfg(feature = "watch")]
        Command::Watch {
            input,
            kind,
            config,
            clear,
        } => {
            let config = load_config(config.as_deref(), None, None)?;
            cmd_watch(&input, kind, config, clear)
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Treat as inline document text
        Ok(input.to_string())
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Read the optional TOML file, then apply flag overrides on top.
fn load_config(
    path: Option<&str>,
    placement: Option<PlacementArg>,
    theme: Option<ThemeArg>,
) -> Result<AnnotatorConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .context(format!("Failed to read config: {path}"))?;
            toml::from_str::<AnnotatorConfig>(&text)
                .context(format!("Failed to parse config: {path}"))?
        }
        None => AnnotatorConfig::default(),
    };

    if let Some(placement) = placement {
        config.placement = placement.into();
    }
    if let Some(theme) = theme {
        config.theme = theme.into();
    }
    config.validate().context("Invalid configuration")?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn resolve_kind(kind: KindArg, input: &str, source: &str) -> DocumentKind {
    match kind {
        KindArg::Markdown => DocumentKind::Markdown,
        KindArg::Mermaid => DocumentKind::Mermaid,
        KindArg::Auto => {
            let from_extension = (input != "-")
                .then(|| DocumentKind::from_path(Path::new(input)))
                .flatten();
            let resolved = from_extension.unwrap_or_else(|| detect_document_kind(source));
            debug!(kind = resolved.as_str(), "resolved document kind");
            resolved
        }
    }
}

// =============================================================================
// Command: annotate
// =============================================================================

fn cmd_annotate(
    input: &str,
    kind: KindArg,
    config: &AnnotatorConfig,
    no_color: bool,
    gutter: bool,
    output: Option<&str>,
) -> Result<()> {
    let source = load_input(input)?;
    let kind = resolve_kind(kind, input, &source);

    if !config.allows_document(&source) {
        warn!(
            max_lines = config.max_lines,
            "Document exceeds max-lines; printing it unannotated"
        );
        return write_output(output, &source);
    }

    let annotations = annotate(&source, kind);
    let use_colors = !no_color && output.is_none() && io::stdout().is_terminal();
    let mode = if gutter {
        LabelMode::Gutter
    } else {
        LabelMode::Inline
    };
    let render_config = TermRenderConfig::from_annotator(config)
        .with_mode(mode)
        .with_colors(use_colors);
    let result = render_term_with_config(&source, &annotations, &render_config);

    info!(
        kind = kind.as_str(),
        labels = result.labels_drawn,
        lines = result.line_count,
        "Annotated document"
    );
    if result.labels_dropped > 0 {
        warn!(
            "{} labels pointed past the end of the document",
            result.labels_dropped
        );
    }

    write_output(output, &result.output)
}

// =============================================================================
// Command: scan
// =============================================================================

fn cmd_scan(input: &str, kind: KindArg, full: bool, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    let kind = resolve_kind(kind, input, &source);
    let report = analyze(&source, kind);

    let output = if full {
        if pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        }
    } else if pretty {
        let value: serde_json::Value = serde_json::from_str(&annotation_evidence_json(&report))?;
        serde_json::to_string_pretty(&value)?
    } else {
        annotation_evidence_json(&report)
    };

    println!("{output}");
    Ok(())
}

// =============================================================================
// Command: blocks
// =============================================================================

fn cmd_blocks(input: &str, kind: KindArg, json_output: bool) -> Result<()> {
    let source = load_input(input)?;
    let kind = resolve_kind(kind, input, &source);
    let report = analyze(&source, kind);

    let blocks: Vec<BlockSummary> = report
        .blocks
        .iter()
        .enumerate()
        .map(|(index, block)| BlockSummary {
            index,
            start_line: block.start_line,
            line_count: block.line_count,
            gates: block.gates,
            message_count: block.messages.len(),
            status: gate_status(block.gates),
        })
        .collect();

    if json_output {
        let result = BlocksResult { kind, blocks };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Kind:   {}", kind.as_str());
    println!("Blocks: {}", blocks.len());
    for block in &blocks {
        // Editors count lines from 1.
        println!(
            "  #{} line {:>4}  {:>3} lines  {:>3} messages  {}",
            block.index,
            block.start_line + 1,
            block.line_count,
            block.message_count,
            block.status
        );
    }
    Ok(())
}

fn gate_status(gates: DiagramGates) -> &'static str {
    match (gates.has_header, gates.autonumber) {
        (true, true) => "numbered",
        (true, false) => "no autonumber",
        (false, _) => "not a sequence diagram",
    }
}

// =============================================================================
// Command: watch (optional feature)
// =============================================================================

#[cfg(feature = "watch")]
struct TerminalSink {
    text: String,
    clear: bool,
}

#[cfg(feature = "watch")]
impl TerminalSink {
    fn print(&self, body: &str) {
        if self.clear {
            print!("\x1B[2J\x1B[H"); // Clear screen and move cursor to top-left
        }
        println!("{body}");
    }
}

#[cfg(feature = "watch")]
impl sq_host::AnnotationSink for TerminalSink {
    fn replace(
        &mut self,
        _uri: &str,
        annotations: &[sq_core::Annotation],
        config: &AnnotatorConfig,
    ) {
        let render_config =
            TermRenderConfig::from_annotator(config).with_colors(io::stdout().is_terminal());
        let result = render_term_with_config(&self.text, annotations, &render_config);
        self.print(&result.output);
    }

    fn clear(&mut self, _uri: &str) {
        self.print(&self.text);
    }
}

#[cfg(feature = "watch")]
fn cmd_watch(input: &str, kind: KindArg, config: AnnotatorConfig, clear: bool) -> Result<()> {
    use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
    use sq_host::{AnnotationSession, DocumentSnapshot, HostEvent, render_diff_summary};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    let path = Path::new(input);
    if !path.exists() {
        anyhow::bail!("File not found: {input}");
    }

    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;

    println!("Watching {input} for changes... (Ctrl+C to stop)");

    let mut session = AnnotationSession::new(config)?;
    let mut sink = TerminalSink {
        text: String::new(),
        clear,
    };
    let mut refresh = |opened: bool, sink: &mut TerminalSink| -> Result<()> {
        let text = load_input(input)?;
        let snapshot = DocumentSnapshot::new(input, resolve_kind(kind, input, &text), &text);
        sink.text = text;
        let event = if opened {
            HostEvent::Opened(snapshot)
        } else {
            HostEvent::Changed(snapshot)
        };
        for update in session.dispatch(event, sink)? {
            if let sq_host::AnnotationUpdate::Replace { diff, .. } = update {
                info!("{}", render_diff_summary(&diff, false).trim_end());
            }
        }
        Ok(())
    };

    // Initial annotation
    if let Err(e) = refresh(true, &mut sink) {
        eprintln!("Initial annotation failed: {e}");
    }

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(Ok(_event)) => {
                // Debounce rapid events
                std::thread::sleep(Duration::from_millis(100));
                while rx.try_recv().is_ok() {}

                if let Err(e) = refresh(false, &mut sink) {
                    eprintln!("Annotation error: {e}");
                }
            }
            Ok(Err(e)) => {
                eprintln!("Watch error: {e}");
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // Continue waiting
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}
