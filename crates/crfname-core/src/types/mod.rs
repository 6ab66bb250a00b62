pub mod columns;
pub mod result;

pub use columns::ParsedNameColumns;
pub use result::{LabeledComponent, ParseResult};
