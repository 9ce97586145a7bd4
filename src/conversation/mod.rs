//! Assistant conversation management.
//!
//! # Architecture
//!
//! - [`ConversationManager`]: assistant/thread bookkeeping for one turn
//! - [`RunPoller`]: bounded, cancellable wait for run completion
//! - [`SessionStore`]: the reused assistant/thread identifiers
//!
//! # Example
//!
//! ```rust,ignore
//! use news_summarizer::conversation::{ConversationManager, ConversationSettings, SessionIds};
//!
//! let mut manager =
//!     ConversationManager::create(api, tools.clone(), ConversationSettings::default(), SessionIds::default())
//!         .await?;
//! manager.create_assistant("News Summarizer", instructions, tools.assistant_tools()).await?;
//! manager.create_thread().await?;
//! manager.add_message(MessageRole::User, "summarize the news on bitcoin").await?;
//! manager.run_assistant("Please call the getNews function").await?;
//! manager.wait_for_run_completion(&cancel).await?;
//! manager.process_message().await?;
//! println!("{}", manager.summary());
//! ```

mod manager;
mod poller;
mod session;

pub use manager::{ConversationManager, ConversationSettings, DEFAULT_MODEL};
pub use poller::{DEFAULT_POLL_INTERVAL, DEFAULT_RUN_TIMEOUT, PollPolicy, RunPoller};
pub use session::{SessionIds, SessionStore};
