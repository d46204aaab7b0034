use colored::*;

/// Turns failed-task console output into a one-paragraph hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Missing header (clang: "'x.h' file not found", gcc: "No such file or directory")
        if output.contains("fatal error: ")
            && (output.contains("file not found") || output.contains("No such file or directory"))
        {
            return Some(format!(
                "It looks like a {} error.\nPass the directory holding your headers with {}.\nOnly {} files in that directory are sent to the compiler.",
                "Missing Header".bold().red(),
                "--headers <dir>".bold().green(),
                ".h".bold().yellow()
            ));
        }

        // 2. Implicit declaration (usually a missing hook API include)
        if output.contains("implicit declaration of function") {
            return Some(format!(
                "A function is used before it is declared.\nMake sure {} (or the header declaring it) is included.",
                "hookapi.h".bold().yellow()
            ));
        }

        // 3. Undefined symbol (wasm-ld)
        if output.contains("undefined symbol") || output.contains("undefined reference to") {
            return Some(format!(
                "It looks like a {} error.\nThe module imports a function the host does not provide, or a definition lives in a file that is built separately.\nEach {} file is compiled on its own.",
                "Linker".bold().red(),
                ".c".bold().yellow()
            ));
        }

        None
    }
}
