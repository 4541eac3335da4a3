//! Natural-language front door for the integrations.
//!
//! A request travels through three stages:
//! 1. **Parsing** (`parser`): the language model turns free text into an
//!    `Instruction` naming a service, an action and parameters.
//! 2. **Routing** (`router`): the instruction is checked against the closed
//!    `actions` catalog and the configured clients, then executed under the
//!    retry policy.
//! 3. **Enveloping**: every outcome, failures included, is returned as a
//!    `ResultEnvelope`.
//!
//! The model only translates. It never decides which operations exist or
//! whether a request is valid; the action table does.

pub mod actions;
pub mod llm;
pub mod parser;
pub mod router;
pub mod runtime;

pub use actions::{ActionArgs, ActionSpec, ActionTable, CatalogEntry};
pub use llm::{LlmClient, OpenAiCompatClient};
pub use parser::InstructionParser;
pub use router::Router;
pub use runtime::AgentRuntime;
