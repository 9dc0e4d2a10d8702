/// A code block extracted from a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// The code inside the fence, without the fence markers.
    pub code: String,
    /// The language tag on the opening fence, empty when absent.
    pub language: String,
}
