use regex::Regex;
use std::sync::LazyLock;

/// Root element every provider request must be wrapped in
pub const ROOT_OPEN: &str = "<speak>";
pub const ROOT_CLOSE: &str = "</speak>";

static OPEN_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*<speak(?:\s[^>]*)?>").expect("valid regex"));

static CLOSE_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</speak>\s*$").expect("valid regex"));

// `<p` must be followed by whitespace or `>` so <phoneme> and <prosody> never open a block
static PARAGRAPH_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>.*?</p>").expect("valid regex"));

/// Remove the outer `<speak>` wrapper, keeping everything inside it untouched.
///
/// Leading/trailing whitespace around the wrapper is tolerated, as are attributes
/// on the opening tag. When neither tag is present the text is returned trimmed
/// and a warning is logged; segmentation then treats it as bare content.
pub fn strip_root(text: &str) -> String {
    let trimmed = text.trim();

    let open = OPEN_ROOT.find(trimmed);
    let close = CLOSE_ROOT.find(trimmed);

    if open.is_none() && close.is_none() {
        tracing::warn!(
            text_length = text.len(),
            "No <speak> root found, treating whole text as unwrapped content"
        );
        return trimmed.to_string();
    }

    let start = open.map(|m| m.end()).unwrap_or(0);
    let end = close.map(|m| m.start()).unwrap_or(trimmed.len());

    trimmed.get(start..end).unwrap_or_default().trim().to_string()
}

/// Split bare SSML content into chunks along `<p>` boundaries.
///
/// Paragraph blocks are packed greedily, left to right, while the wrapped chunk
/// stays within `max_size` bytes. A paragraph that is too large on its own is
/// emitted as its own chunk rather than cut. Content without any `<p>` block is
/// returned as a single chunk.
pub fn split_into_chunks(content: &str, max_size: usize) -> Vec<String> {
    let blocks: Vec<&str> = PARAGRAPH_BLOCK.find_iter(content).map(|m| m.as_str()).collect();

    if blocks.is_empty() {
        tracing::warn!(
            content_length = content.len(),
            "No <p> blocks found, using the whole content as one chunk"
        );
        return vec![content.to_string()];
    }

    tracing::debug!(paragraph_count = blocks.len(), "Paragraph blocks extracted");

    let mut chunks = Vec::new();
    let mut current = String::new();

    for (index, block) in blocks.iter().enumerate() {
        if wrapped_len(current.len() + block.len()) <= max_size {
            current.push_str(block);
            continue;
        }

        if wrapped_len(block.len()) > max_size {
            tracing::warn!(
                paragraph_index = index,
                paragraph_bytes = block.len(),
                max_size,
                "Paragraph exceeds the chunk limit on its own, emitting it as an oversized chunk"
            );
        }

        if current.is_empty() {
            chunks.push(block.to_string());
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(block);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Wrap a bare chunk so it can be submitted to a provider on its own
pub fn wrap(chunk: &str) -> String {
    let mut wrapped = String::with_capacity(wrapped_len(chunk.len()));
    wrapped.push_str(ROOT_OPEN);
    wrapped.push_str(chunk);
    wrapped.push_str(ROOT_CLOSE);
    wrapped
}

fn wrapped_len(content_len: usize) -> usize {
    ROOT_OPEN.len() + content_len + ROOT_CLOSE.len()
}
