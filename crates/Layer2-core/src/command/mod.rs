//! Command System - 플러그인이 노출하는 명령어
//!
//! ## 구조
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              CommandRegistry               │
//! │  ┌────────────────┐  ┌──────────────────┐  │
//! │  │ name → Command │  │ usage / duration │  │
//! │  └────────────────┘  └──────────────────┘  │
//! └──────────────────────┬─────────────────────┘
//!                        │ execute_command(name, ctx)
//!                        ▼
//!   Command = CommandMetadata + [CommandArgument] + CommandExecutor
//! ```
//!
//! ## 사용 예시
//!
//! ```ignore
//! let registry = CommandRegistry::new();
//!
//! let echo = Command::from_fn(
//!     CommandMetadata::new("echo", "Print arguments").with_usage("echo <msg>"),
//!     |ctx| Ok(CommandResult::success(ctx.args.join(" "))),
//! )
//! .with_argument(CommandArgument::required("msg", "Message"));
//!
//! registry.register_command(echo, Some("kiln.echo")).await?;
//! let result = registry.execute_line("echo hello world", ".").await?;
//! ```

pub mod registry;
pub mod traits;

pub use registry::{CommandRegistry, CommandStatistics};
pub use traits::{
    validate_arguments, Command, CommandArgument, CommandContext, CommandExecutor, CommandMetadata,
    CommandResult, DEFAULT_CATEGORY,
};
