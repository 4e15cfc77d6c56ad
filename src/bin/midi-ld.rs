use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use midi_ld::{
    Document, EncodeOptions, Graph, GraphDecoder, GraphEncoder, ProjectOptions, TempoMode,
    TempoRollProjector,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "midi-ld", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a MIDI file (or event-stream JSON) into an entity graph.
    Encode(EncodeArgs),
    /// Decode one piece of an entity graph into a MIDI file (or event-stream JSON).
    Decode(DecodeArgs),
    /// Project one piece of an entity graph onto a piano roll in seconds.
    Roll(RollArgs),
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Input `.mid` file or event-stream JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output graph JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Document URL entity ids are derived from.
    #[arg(long)]
    base_url: Option<String>,

    /// Piece name inside the document.
    #[arg(long)]
    piece_name: Option<String>,

    /// Annotate notes with CRM time-span bounds.
    #[arg(long, default_value_t = false)]
    time_spans: bool,

    /// Half-width of the time-span intervals, in ticks.
    #[arg(long)]
    imprecision: Option<u64>,
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Input graph JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Id of the piece entity to decode.
    #[arg(long)]
    piece: String,

    /// Output path; `.mid`/`.midi` writes a Standard MIDI File, anything else JSON.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RollArgs {
    /// Input graph JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Id of the piece entity to project.
    #[arg(long)]
    piece: String,

    /// Integrate tempo changes over the whole piece.
    #[arg(long, default_value_t = false)]
    integrated: bool,

    /// Output JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Encode(args) => cmd_encode(args),
        Command::Decode(args) => cmd_decode(args),
        Command::Roll(args) => cmd_roll(args),
    }
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;

    let mut opts = EncodeOptions {
        time_spans: args.time_spans,
        ..EncodeOptions::default()
    };
    if let Some(base_url) = args.base_url {
        opts.base_url = base_url;
    }
    if let Some(piece_name) = args.piece_name {
        opts.piece_name = piece_name;
    }
    if let Some(imprecision) = args.imprecision {
        opts.imprecision_ticks = imprecision;
    }

    let encoded = GraphEncoder::encode(&doc, &opts);
    let json = serde_json::to_vec_pretty(&encoded.graph).context("serialize graph")?;
    write_output(&args.out, &json)?;

    println!("{}", encoded.piece);
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_decode(args: DecodeArgs) -> anyhow::Result<()> {
    let graph = read_graph(&args.in_path)?;
    let doc = GraphDecoder::decode(&graph, &args.piece)
        .with_context(|| format!("decode piece '{}'", args.piece))?;

    let bytes = if is_smf(&args.out) {
        doc.to_smf_bytes()?
    } else {
        serde_json::to_vec_pretty(&doc).context("serialize document")?
    };
    write_output(&args.out, &bytes)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_roll(args: RollArgs) -> anyhow::Result<()> {
    let graph = read_graph(&args.in_path)?;
    let opts = ProjectOptions {
        tempo: if args.integrated {
            TempoMode::Integrated
        } else {
            TempoMode::Current
        },
        ..ProjectOptions::default()
    };
    let roll = TempoRollProjector::project(&graph, &args.piece, &opts)
        .with_context(|| format!("project piece '{}'", args.piece))?;
    let json = serde_json::to_vec_pretty(&roll).context("serialize piano roll")?;

    match args.out {
        Some(out) => {
            write_output(&out, &json)?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{}", String::from_utf8_lossy(&json)),
    }
    Ok(())
}

fn is_smf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    if is_smf(path) {
        Document::from_smf_bytes(&bytes)
            .with_context(|| format!("parse midi file '{}'", path.display()))
    } else {
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse document json '{}'", path.display()))
    }
}

fn read_graph(path: &Path) -> anyhow::Result<Graph> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse graph json '{}'", path.display()))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
