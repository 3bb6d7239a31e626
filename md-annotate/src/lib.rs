//! Speech-ready annotation of parsed documents.
//!
//! Converts a document tree (headings, LaTeX math, academic citations) into
//! one annotated text buffer plus positional metadata — voice spans, pause
//! markers, chapter breaks — consumed by downstream audio synthesis. The
//! engine keeps byte-offset bookkeeping correct across every
//! content-length-changing transform, then the segmenter re-bases those
//! offsets per chapter.

pub mod citation;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod math;
pub mod optimize;
pub mod parser;
pub mod pronounce;
pub mod rewrite;
pub mod segment;
pub mod wrap;

pub use config::AnnotateConfig;
pub use document::{Citation, Document, DocumentNode, MathExpression};
pub use engine::{AnnotationEngine, EnhancedText, PauseMarker, VoiceRole, VoiceSpan, validate};
pub use error::{EnhanceError, Result};
pub use math::{MathTransducer, PandocParser, create_transducer};
pub use rewrite::{LlmRewriter, RewriteOutcome, Rewriter};
pub use segment::{ChapterSegment, split_chapters};
