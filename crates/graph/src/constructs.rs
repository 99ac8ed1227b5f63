//! Recognizers and extractors for the Python constructs the graph records.

use crate::syntax::SyntaxTree;

/// Construct recognized at a tree position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    Class,
    Function,
    If,
    For,
    While,
    Try,
    With,
    Assignment,
    Decorator,
    Docstring,
    Import,
    Call,
}

/// Classify a tree node; `None` for constructs that are only descended into
pub fn classify(tree: &SyntaxTree, idx: usize, source: &[u8]) -> Option<Construct> {
    let construct = match tree.kind(idx) {
        "class_definition" => Construct::Class,
        "function_definition" => Construct::Function,
        "if_statement" => Construct::If,
        "for_statement" => Construct::For,
        "while_statement" => Construct::While,
        "try_statement" => Construct::Try,
        "with_statement" => Construct::With,
        "assignment" | "augmented_assignment" => Construct::Assignment,
        "decorator" => Construct::Decorator,
        "import_statement" | "import_from_statement" => Construct::Import,
        "call" => Construct::Call,
        "string" if is_docstring(tree, idx, source) => Construct::Docstring,
        _ => return None,
    };
    Some(construct)
}

/// Triple-quoted string leading its block or statement
fn is_docstring(tree: &SyntaxTree, idx: usize, source: &[u8]) -> bool {
    let text = tree.text(idx, source);
    let text = text.trim();
    if !(text.starts_with("\"\"\"") || text.starts_with("'''")) {
        return false;
    }

    let Some(parent) = tree.parent(idx) else {
        return false;
    };
    if tree.children(parent).first() == Some(&idx) {
        return true;
    }

    if tree.kind(parent) == "expression_statement" {
        if let Some(grandparent) = tree.parent(parent) {
            return tree.children(grandparent).first() == Some(&parent);
        }
    }
    false
}

/// First identifier child, empty when missing
pub fn name(tree: &SyntaxTree, idx: usize, source: &[u8]) -> String {
    tree.children(idx)
        .iter()
        .find(|&&child| tree.kind(child) == "identifier")
        .map(|&child| tree.text(child, source))
        .unwrap_or_default()
}

/// `name(params)` for definitions with a parameter list
pub fn signature(tree: &SyntaxTree, idx: usize, source: &[u8]) -> Option<String> {
    let name = name(tree, idx, source);
    match tree.child_by_field(idx, "parameters") {
        Some(params) => Some(format!("{name}{}", tree.text(params, source))),
        None if !name.is_empty() => Some(name),
        None => None,
    }
}

/// Leading string literal of the definition body
pub fn docstring(tree: &SyntaxTree, idx: usize, source: &[u8]) -> Option<String> {
    let block = tree
        .children(idx)
        .iter()
        .copied()
        .find(|&child| tree.kind(child) == "block")?;
    let first = *tree.children(block).first()?;

    let literal = match tree.kind(first) {
        "expression_statement" => tree
            .children(first)
            .first()
            .copied()
            .filter(|&s| tree.kind(s) == "string")?,
        "string" => first,
        _ => return None,
    };
    Some(tree.text(literal, source).trim().to_string())
}

/// Dotted callee name (`obj.method.attr`) for a call node
pub fn called_name(tree: &SyntaxTree, call: usize, source: &[u8]) -> Option<String> {
    let function = tree.child_by_field(call, "function")?;
    let mut parts = Vec::new();
    collect_callee_parts(tree, function, source, &mut parts);

    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(parts.join(".")),
    }
}

fn collect_callee_parts(tree: &SyntaxTree, idx: usize, source: &[u8], parts: &mut Vec<String>) {
    match tree.kind(idx) {
        "identifier" => parts.push(tree.text(idx, source)),
        "attribute" => {
            if let Some(object) = tree.child_by_field(idx, "object") {
                collect_callee_parts(tree, object, source, parts);
            }
            if let Some(attr) = tree.child_by_field(idx, "attribute") {
                if tree.kind(attr) == "identifier" {
                    parts.push(tree.text(attr, source));
                }
            }
        }
        "dotted_name" => parts.push(tree.text(idx, source)),
        // Arguments of an inner call are not part of the callee path
        "argument_list" => {}
        _ => {
            for &child in tree.children(idx) {
                collect_callee_parts(tree, child, source, parts);
            }
        }
    }
}

/// Callee for resolution: dotted name, else call text up to the first `(`
pub fn callee(tree: &SyntaxTree, call: usize, source: &[u8]) -> String {
    called_name(tree, call, source).unwrap_or_else(|| {
        let text = tree.text(call, source);
        let text = text.trim();
        text.split('(').next().unwrap_or_default().trim().to_string()
    })
}
