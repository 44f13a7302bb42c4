//! Remote side of Cortex Assist: the warehouse session, the agent endpoint and
//! the Cortex functions, plus parsing of what they return.

pub mod agent;
pub mod error;
pub mod escape;
pub mod executor;
pub mod extract;
pub mod functions;
pub mod session;
pub mod sse;

pub use agent::{AgentClient, AgentReply, AgentService, ToolChoice};
pub use error::RemoteError;
pub use executor::{QueryExecutor, SqlRunner};
pub use extract::extract;
pub use functions::{CortexFunctions, TextFunctions};
pub use session::{Credentials, Session};
pub use sse::{parse_sse, parse_sse_opt, MalformedLine, SseStream};
