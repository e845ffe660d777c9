//! Host-side logic for the Arbius task explorer
//!
//! Reads engine state over JSON-RPC, votes from the indexing service, and
//! composes both into a render-ready task view.

pub mod composer;
pub mod config;
pub mod error;
pub mod reader;
pub mod render;
pub mod rpc;
pub mod session;
pub mod subscriber;
pub mod templates;
pub mod votes;

#[cfg(test)]
pub(crate) mod mock;

pub use composer::{Field, Links, Section, SolutionOutput, TaskView, ViewComposer, VotesView};
pub use config::Config;
pub use error::HostError;
pub use reader::EngineReader;
pub use render::{render_html, render_text};
pub use rpc::{ChainClient, JsonRpcClient, LogFilter};
pub use session::{SessionState, TaskSession, Viewer};
pub use subscriber::{EventSubscriber, Subscription};
pub use templates::{OutputKind, Template, TemplateRegistry};
pub use votes::{GraphQlVoteReader, VoteSource};
