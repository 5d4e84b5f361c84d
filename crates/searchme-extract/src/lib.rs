//! # searchme-extract
//!
//! Reads a file's filesystem facts and, for the formats it knows, the
//! format-specific metadata and text that go into a [`MetadataRecord`].
//!
//! | MIME / extension | probe | fields |
//! |---|---|---|
//! | `text/*` | [`text`] | content |
//! | `application/pdf` | [`pdf`] | page count, title, content |
//! | `.docx` | [`docx`] | paragraph count, content |
//! | `audio/*` | [`audio`] | artist, title, duration |
//! | `image/*` | [`image`] | dimensions |
//!
//! Every other type gets the basic facts only.
//!
//! [`MetadataRecord`]: searchme_types::MetadataRecord

pub mod audio;
pub mod docx;
pub mod error;
pub mod extractor;
pub mod image;
pub mod pdf;
pub mod text;

pub use error::ExtractError;
pub use extractor::{FileExtractor, MetadataExtractor, FALLBACK_MIME};
