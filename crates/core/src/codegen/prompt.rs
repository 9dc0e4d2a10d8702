/// Build the chat prompt asking the model for manim source code.
///
/// The migration hints are carried deliberately: hosted models still emit
/// pre-1.0 manim idioms (`ShowCreation`, `Scene.play` with Mobject methods)
/// that fail at render time.
pub fn build_generation_prompt(question: &str) -> String {
    format!(
        "You're a Computer Scientist specializing in AI. You're asked to provide \
         detailed and eloquent answers to AI questions.\n\
         Create python code to generate a video with manim that explains the \
         following question:\n\
         {question}\n\
         Remember ShowCreation() is deprecated, replace it with Create()\n\
         Passing Mobject methods to Scene.play is no longer supported. \
         Use Mobject.animate instead\n\n\
         Respond only with the code in a markdown block"
    )
}

/// Build the follow-up prompt that asks the model to name the rendered
/// video path, given the raw execution output. Used only when the path
/// cannot be found in the output directly.
pub fn build_path_prompt(execution_output: &str) -> String {
    format!(
        "respond only the file path when it is ready:\n{execution_output}\n"
    )
}
