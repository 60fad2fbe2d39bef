//! Pipeline stages for PDF-to-artifact generation.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! the others and the two external collaborators (pdfium, the LLM provider)
//! sit behind traits.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ request ──▶ llm ──▶ parse
//! (pdfium)    (prompt)    (LLM)   (typed artifact)
//! ```
//!
//! 1. [`extract`] — PDF bytes to plain text + page count; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`request`] — reject empty text, truncate to the character limit,
//!    render the kind-specific prompt
//! 3. [`llm`]     — one model call; the only stage with network I/O
//! 4. [`parse`]   — strict JSON, top-level shape check, fail-closed decode

pub mod extract;
pub mod llm;
pub mod parse;
pub mod request;
