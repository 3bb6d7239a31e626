//! md-annotate - Convert markdown documents into speech-ready annotated text

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use md_annotate::{
    AnnotateConfig, AnnotationEngine, LlmRewriter, PandocParser, create_transducer,
    math::StructuralParser, parser, rewrite::Rewriter, split_chapters, validate,
};

#[derive(Parser, Debug)]
#[command(name = "md-annotate")]
#[command(about = "Convert markdown documents into speech-ready annotated text", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the markdown file
    input: PathBuf,

    /// Write the annotated buffer to a file instead of summarizing
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a per-chapter segmentation summary
    #[arg(long)]
    segments: bool,

    /// Path to a configuration file (default: ~/.config/cli-programs/md-annotate.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the generative rewrite pass over the finished buffer
    #[arg(long)]
    rewrite: bool,

    /// Rewrite-client preset to use with --rewrite
    #[arg(long)]
    preset: Option<String>,

    /// Force the pattern-only math backend even if pandoc is installed
    #[arg(long)]
    no_pandoc: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.debug { "debug" } else { "warn" }),
    )
    .init();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let config = match &args.config {
        Some(path) => AnnotateConfig::load_from(path).context("Failed to load configuration")?,
        None => AnnotateConfig::load().context("Failed to load configuration")?,
    };

    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    eprintln!("Parsing: {}", args.input.display());
    let doc = parser::parse_markdown(&text);
    eprintln!("Document: \"{}\", {} top-level sections", doc.title, doc.nodes.len());

    let (doc_ok, doc_issues) = parser::validate_document(&doc);
    if !doc_ok {
        for issue in &doc_issues {
            eprintln!("  warning: {}", issue);
        }
    }

    // Pick the math backend from what's actually available
    let structural_parser: Option<Box<dyn StructuralParser>> =
        if !args.no_pandoc && PandocParser::available() {
            Some(Box::new(PandocParser::new()))
        } else {
            None
        };
    let transducer = create_transducer(structural_parser);
    eprintln!("Math backend: {}", transducer.name());

    let rewriter: Option<Box<dyn Rewriter>> = if args.rewrite || config.rewrite.enabled {
        let preset = args.preset.as_deref().or(config.rewrite.preset.as_deref());
        match LlmRewriter::from_config(preset) {
            Ok(rewriter) => Some(Box::new(rewriter)),
            Err(e) => {
                eprintln!("  warning: rewrite pass unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let engine = AnnotationEngine::new(config, transducer, rewriter)
        .context("Failed to build annotation engine")?;

    let enhanced = engine.enhance(&doc).context("Failed to enhance document")?;

    eprintln!(
        "Annotated: {} chars, {} voice spans, {} pauses, {} chapters{}",
        enhanced.content.len(),
        enhanced.voice_spans.len(),
        enhanced.pause_markers.len(),
        enhanced.chapter_breaks.len(),
        if enhanced.offsets_exact {
            ""
        } else {
            " (offsets approximate after rewrite)"
        }
    );

    let (ok, issues) = validate(&enhanced);
    if ok {
        eprintln!("Validation: clean");
    } else {
        eprintln!("Validation: {} issue(s)", issues.len());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
    }

    if args.segments {
        eprintln!("\nChapters:");
        for (i, chapter) in split_chapters(&enhanced).iter().enumerate() {
            eprintln!(
                "  {:>3}. \"{}\" ({} chars, {} voice spans)",
                i + 1,
                chapter.title,
                chapter.text.len(),
                chapter.voice_spans.len()
            );
        }
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &enhanced.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Output: {}", path.display());
        }
        None => {
            println!("{}", enhanced.content);
        }
    }

    Ok(())
}
