//! Identity and metadata derived from a node's name and source text.
//!
//! Everything here is a pure function of its inputs so two independent builds
//! of the same tree can be joined node-by-node on `sid`.

use crate::types::{Node, NodeDraft, NodeId, NodeKind};
use sha2::{Digest, Sha256};

/// Hex length of a stable id
pub const SID_LEN: usize = 16;

/// Upper bound on summary length, in characters
pub const SUMMARY_MAX_CHARS: usize = 400;

/// Stable id over the best available key: qualified name, name, raw id
pub fn stable_id(qualified_name: Option<&str>, name: Option<&str>, id: NodeId) -> String {
    let key = match (non_empty(qualified_name), non_empty(name)) {
        (Some(q), _) => q.to_string(),
        (None, Some(n)) => n.to_string(),
        (None, None) => id.to_string(),
    };
    let mut hex = sha256_hex(key.as_bytes());
    hex.truncate(SID_LEN);
    hex
}

/// SHA-256 over the exact snippet; `None` without code
pub fn code_sha(code: Option<&str>) -> Option<String> {
    non_empty(code).map(|c| sha256_hex(c.as_bytes()))
}

/// First two and last two lines of the trimmed snippet
pub fn summary(code: Option<&str>) -> Option<String> {
    let code = non_empty(code)?.trim();
    let lines: Vec<&str> = code.lines().collect();
    if lines.is_empty() {
        return None;
    }

    let snippet = if lines.len() <= 4 {
        lines.join("\n")
    } else {
        let mut parts = Vec::with_capacity(5);
        parts.extend_from_slice(&lines[..2]);
        parts.push("...");
        parts.extend_from_slice(&lines[lines.len() - 2..]);
        parts.join("\n")
    };

    Some(truncate_chars(&snippet, SUMMARY_MAX_CHARS))
}

/// Line count of the snippet
pub fn sloc(code: Option<&str>) -> usize {
    code.map_or(0, |c| c.lines().count())
}

/// Stamp a draft with its id and identity metadata
pub(crate) fn materialize(id: NodeId, kind: NodeKind, draft: NodeDraft) -> Node {
    let sid = stable_id(draft.qualified_name.as_deref(), draft.name.as_deref(), id);
    let code = draft.code.as_deref();

    Node {
        id,
        kind,
        sid,
        code_sha: code_sha(code),
        summary: summary(code),
        sloc: sloc(code),
        module: draft.path.clone(),
        path: draft.path,
        name: draft.name,
        qualified_name: draft.qualified_name,
        signature: draft.signature,
        docstring: draft.docstring,
        start_line: draft.start_line,
        end_line: draft.end_line,
        code: draft.code,
        parent_id: None,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
