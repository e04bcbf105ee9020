use thiserror::Error;

use zis_introspect::{Introspector, Target};

use crate::render::{Renderer, Styles};

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error(transparent)]
    Introspect(#[from] zis_introspect::Error),
    #[error("cannot serialise snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Describes a single word in the requested format
pub fn describe_word<T: Target>(
    introspector: &Introspector<T>,
    word: u64,
    format: OutputFormat,
    depth: usize,
) -> Result<String, DescribeError> {
    let description = introspector.describe(word)?;

    Ok(match format {
        OutputFormat::Text => {
            Renderer::new(introspector, Styles::plain()).render(&description, depth)
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&description.snapshot())?;
            json.push('\n');
            json
        }
    })
}

/// Describes each word to stdout
///
/// Returns false if any word could not be described.
pub fn describe_words<T: Target>(
    introspector: &Introspector<T>,
    words: &[u64],
    format: OutputFormat,
    depth: usize,
) -> bool {
    let mut all_succeeded = true;

    for word in words {
        match describe_word(introspector, *word, format, depth) {
            Ok(output) => print!("{}", output),
            Err(err) => {
                eprintln!("{:#x}: {}", word, err);
                all_succeeded = false;
            }
        }
    }

    all_succeeded
}
