pub mod extract;
pub mod prompt;
pub mod scene;
pub mod types;

pub use extract::{extract_code_blocks, sanitize_code};
pub use prompt::{build_generation_prompt, build_path_prompt};
pub use scene::scene_name;
pub use types::CodeBlock;
