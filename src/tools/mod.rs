//! Local tools answering run function calls.
//!
//! - [`ToolRegistry`]: function name → [`NativeTool`] handler
//! - [`ToolDispatcher`]: executes the pending calls of a run and submits the outputs
//! - [`GetNewsTool`]: the `getNews` function

pub mod dispatcher;
pub mod news;
pub mod registry;

pub use dispatcher::ToolDispatcher;
pub use news::{GET_NEWS, GetNewsTool};
pub use registry::{NativeTool, ToolRegistry};
