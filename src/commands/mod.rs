//! External command implementations.
//!
//! Each command is a thin stream transformer over its stdin and the
//! virtual filesystem, registered by name in the `CommandRegistry`.

pub mod base64_cmd;
pub mod basename_cmd;
pub mod cat;
pub mod cp;
pub mod curl;
pub mod cut;
pub mod date;
pub mod dirname_cmd;
pub mod echo_cmd;
pub mod env_cmd;
pub mod find;
pub mod flags;
pub mod grep;
pub mod head;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod registry;
pub mod rev_cmd;
pub mod rm;
pub mod rmdir_cmd;
pub mod seq;
pub mod sleep_cmd;
pub mod sort;
pub mod tac_cmd;
pub mod tail;
pub mod tee;
pub mod touch;
pub mod tr;
pub mod types;
pub mod uniq;
pub mod utils;
pub mod wc;
pub mod which_cmd;
pub mod xargs;

pub use registry::CommandRegistry;
pub use types::{Command, CommandContext, CommandResult};

/// Build the registry with every bundled command.
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Box::new(base64_cmd::Base64Command));
    registry.register(Box::new(basename_cmd::BasenameCommand));
    registry.register(Box::new(cat::CatCommand));
    registry.register(Box::new(cp::CpCommand));
    registry.register(Box::new(curl::CurlCommand));
    registry.register(Box::new(cut::CutCommand));
    registry.register(Box::new(date::DateCommand));
    registry.register(Box::new(dirname_cmd::DirnameCommand));
    registry.register(Box::new(echo_cmd::EchoCommand));
    registry.register(Box::new(env_cmd::EnvCommand));
    registry.register(Box::new(find::FindCommand));
    registry.register(Box::new(grep::GrepCommand));
    registry.register(Box::new(head::HeadCommand));
    registry.register(Box::new(ls::LsCommand));
    registry.register(Box::new(mkdir::MkdirCommand));
    registry.register(Box::new(mv::MvCommand));
    registry.register(Box::new(rev_cmd::RevCommand));
    registry.register(Box::new(rm::RmCommand));
    registry.register(Box::new(rmdir_cmd::RmdirCommand));
    registry.register(Box::new(seq::SeqCommand));
    registry.register(Box::new(sleep_cmd::SleepCommand));
    registry.register(Box::new(sort::SortCommand));
    registry.register(Box::new(tac_cmd::TacCommand));
    registry.register(Box::new(tail::TailCommand));
    registry.register(Box::new(tee::TeeCommand));
    registry.register(Box::new(touch::TouchCommand));
    registry.register(Box::new(tr::TrCommand));
    registry.register(Box::new(uniq::UniqCommand));
    registry.register(Box::new(wc::WcCommand));
    registry.register(Box::new(which_cmd::WhichCommand));
    registry.register(Box::new(xargs::XargsCommand));
    registry
}
