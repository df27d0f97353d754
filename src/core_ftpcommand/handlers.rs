use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::{cwd, list, other, pass, pwd, quit, rest, retr, size, stor, user};
use crate::core_network::reactor::ServerContext;
use crate::core_network::{pasv, port};
use crate::helpers::split_command_line;
use crate::session::Session;
use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// What the session loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlow {
    Continue,
    Close,
}

/// Handlers only fail when the control connection is unusable.
pub type CommandResult = Result<CommandFlow, FtpError>;

pub type CommandFuture = Pin<Box<dyn Future<Output = CommandResult> + Send>>;

pub type CommandHandler = Box<dyn Fn(CommandContext) -> CommandFuture + Send + Sync>;

pub type CommandTable = HashMap<FtpCommand, Arc<CommandHandler>>;

/// Everything a handler can reach: its own session and the shared server state.
#[derive(Clone)]
pub struct CommandContext {
    pub session: Arc<Session>,
    pub server: Arc<ServerContext>,
}

impl CommandContext {
    pub fn new(session: Arc<Session>, server: Arc<ServerContext>) -> Self {
        Self { session, server }
    }

    /// Argument of the command being handled.
    pub async fn argument(&self) -> String {
        self.session.state.lock().await.pending_argument.clone()
    }

    pub async fn working_directory(&self) -> String {
        self.session.state.lock().await.working_directory.clone()
    }

    pub async fn reply(&self, message: &str) -> CommandResult {
        self.session.reply(message).await?;
        Ok(CommandFlow::Continue)
    }
}

fn handler<F, Fut>(f: F) -> Arc<CommandHandler>
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    Arc::new(Box::new(move |ctx: CommandContext| -> CommandFuture { Box::pin(f(ctx)) }))
}

pub fn initialize_command_handlers() -> CommandTable {
    let mut handlers: CommandTable = HashMap::new();

    handlers.insert(FtpCommand::USER, handler(user::handle_user_command));
    handlers.insert(FtpCommand::PASS, handler(pass::handle_pass_command));
    handlers.insert(FtpCommand::PASV, handler(pasv::handle_pasv_command));
    handlers.insert(FtpCommand::PORT, handler(port::handle_port_command));
    handlers.insert(FtpCommand::LIST, handler(list::handle_list_command));
    handlers.insert(FtpCommand::PWD, handler(pwd::handle_pwd_command));
    handlers.insert(FtpCommand::CWD, handler(cwd::handle_cwd_command));
    handlers.insert(FtpCommand::QUIT, handler(quit::handle_quit_command));
    handlers.insert(FtpCommand::RETR, handler(retr::handle_retr_command));
    handlers.insert(FtpCommand::STOR, handler(stor::handle_stor_command));
    handlers.insert(FtpCommand::SIZE, handler(size::handle_size_command));
    handlers.insert(FtpCommand::REST, handler(rest::handle_rest_command));

    handlers
}

/// Splits one control line, records its argument in the session and runs the verb's handler.
pub async fn dispatch(ctx: CommandContext, line: String) -> CommandResult {
    let (verb, argument) = split_command_line(&line);
    debug!("Session {} received {} {:?}", ctx.session.id(), verb, argument);
    ctx.session.state.lock().await.pending_argument = argument.to_string();

    let handler = FtpCommand::from_str(verb).and_then(|cmd| ctx.server.commands.get(&cmd).cloned());
    match handler {
        Some(handler) => handler(ctx).await,
        None => other::handle_other_command(ctx).await,
    }
}
