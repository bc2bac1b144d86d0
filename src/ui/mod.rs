//! Terminal output for the CLI and the plain host: colored notices, error
//! blocks, tables and a shutdown spinner.

pub mod plain_renderer;
pub mod renderer;
pub mod table;
pub mod theme;
pub mod widgets;

pub use plain_renderer::PlainRenderer;
pub use renderer::{Renderer, SpinnerHandle, UiError, UiResult};
pub use theme::OutputMode;
pub use widgets::{KeyValue, MessageBlock, NoticeLevel, TableSpec};
