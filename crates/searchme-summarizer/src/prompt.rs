//! Prompt construction and the plain listing used when no model answers.

use searchme_retrieval::SearchHit;
use searchme_types::{content_preview, MetadataRecord, CONTENT_PREVIEW_CHARS};

/// Characters of content shown per hit in the plain listing.
pub const LISTING_PREVIEW_CHARS: usize = 100;

/// Text printed for an empty result list.
pub const NO_MATCHES: &str = "No matching files found.";

/// Build the generate prompt for `query` over `hits`.
pub fn build_prompt(query: &str, hits: &[SearchHit]) -> String {
    let results_text = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| describe_hit(i + 1, &hit.record))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful assistant analyzing search results from a file system.
The user's query is: "{query}"

Here are the most relevant files and their details:
{results_text}

Please provide a clear and concise response that:
1. Directly answers the user's query using the available information
2. Cites specific files and their content when relevant
3. Highlights exact matches or relevant excerpts
4. Mentions if the requested information isn't found in the results

Response format:
- Start with a direct answer to the query
- List relevant files with their key information
- Include specific quotes or data points that support the answer
- End with any necessary caveats or additional context

Keep your response focused and relevant to the query."#
    )
}

fn describe_hit(rank: usize, record: &MetadataRecord) -> String {
    let mut lines = vec![format!("\n{}. File: {}", rank, record.path.display())];

    if let Some(title) = &record.title {
        lines.push(format!("Title: {}", title));
    }
    if let Some(artist) = &record.artist {
        lines.push(format!("Artist: {}", artist));
    }
    if let Some(duration) = record.duration_seconds {
        lines.push(format!("Duration: {:.2} seconds", duration));
    }
    if let Some(dimensions) = record.dimensions {
        lines.push(format!("Dimensions: {}", dimensions));
    }
    if let Some(pages) = record.page_count {
        lines.push(format!("Pages: {}", pages));
    }
    if let Some(content) = record
        .content
        .as_deref()
        .and_then(|c| content_preview(c, CONTENT_PREVIEW_CHARS))
    {
        lines.push(format!("Content: {}", content));
    }

    lines.join("\n")
}

/// Human-readable results without a language model.
pub fn fallback_listing(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_MATCHES.to_string();
    }

    let mut output = vec!["Search Results".to_string(), "─".repeat(14)];

    for (i, hit) in hits.iter().enumerate() {
        let record = &hit.record;
        output.push(format!("\n{}. {}", i + 1, record.path.display()));

        let mut details = Vec::new();
        if record.size_bytes > 0 {
            details.push(format!("Size: {}", compact_size(record.size_bytes)));
        }

        let mut media = Vec::new();
        if let Some(title) = &record.title {
            media.push(format!("Title: {}", title));
        }
        if let Some(artist) = &record.artist {
            media.push(format!("Artist: {}", artist));
        }
        if let Some(duration) = record.duration_seconds {
            media.push(format!("Duration: {:.1}s", duration));
        }
        if let Some(dimensions) = record.dimensions {
            media.push(format!("Dim: {}", dimensions));
        }
        if let Some(pages) = record.page_count {
            media.push(format!("Pages: {}", pages));
        }
        if !media.is_empty() {
            details.push(media.join(" | "));
        }

        if let Some(preview) = record
            .content
            .as_deref()
            .and_then(|c| content_preview(c, LISTING_PREVIEW_CHARS))
        {
            details.push(format!("Preview: \"{}...\"", preview));
        }

        output.extend(details.into_iter().map(|d| format!("  • {}", d)));
    }

    output.join("\n")
}

/// Size with one decimal, stopping at GB.
fn compact_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    for unit in &UNITS[..UNITS.len() - 1] {
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}{}", size, UNITS[UNITS.len() - 1])
}
