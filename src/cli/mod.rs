pub mod banner;
pub mod color;
pub mod companion;
pub mod completer;
pub mod highlighter;
pub mod humor;
pub mod prompt;
