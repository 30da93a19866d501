//! Document parser implementations

mod command;
mod registry;
mod text_file;

pub use command::{CommandParser, CommandParserConfig, INPUT_PLACEHOLDER};
pub use registry::ParserRegistry;
pub use text_file::{TextFileParser, FORM_FEED};
