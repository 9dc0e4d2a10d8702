use regex::Regex;

use super::types::CodeBlock;

/// Extract all fenced code blocks from a model response.
///
/// Matches triple-backtick fences with an optional language tag. The
/// surrounding commentary the model tends to produce is discarded; only the
/// fenced content survives.
pub fn extract_code_blocks(markdown: &str) -> Vec<CodeBlock> {
    let pattern = Regex::new(r"```(?:[ \t]*([\w+-]+))?\n([\s\S]*?)```").unwrap();

    pattern
        .captures_iter(markdown)
        .map(|caps| CodeBlock {
            language: caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            code: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
        .collect()
}

/// Remove stray fence characters and a leading "python" tag from generated
/// code. Models occasionally wrap code in a second fence or prefix it as if
/// answering in a terminal.
pub fn sanitize_code(code: &str) -> String {
    let leading = Regex::new(r"^(\s|`)*(?i:python)?\s*").unwrap();
    let trailing = Regex::new(r"(\s|`)*$").unwrap();

    let out = leading.replace(code, "");
    trailing.replace(&out, "").to_string()
}
