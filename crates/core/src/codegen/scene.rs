use regex::Regex;

/// Find the name of the scene class in generated manim code.
///
/// Manim renders a named scene class, so the first `class` definition in
/// the generated file decides both the module filename and the render
/// target. Returns `None` when the code defines no class at all.
pub fn scene_name(code: &str) -> Option<String> {
    let pattern = Regex::new(r"class\s+(\w+)").unwrap();
    pattern
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
