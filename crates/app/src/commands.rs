//! Host commands
//!
//! Each command returns the lines to print so the binary stays a thin shell.

use std::fmt;

use banklink_domain::{BankLinkError, Result};
use tracing::info;

use crate::context::AppContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate and register a keypair if none is stored
    Install,
    /// Print the browser URL for granting access
    AuthorizeUrl,
    /// Exchange an authorization code and store the access token
    Authorize { code: String },
    /// Register the device and list the users the grant covers
    Pair,
    /// Poll balances until interrupted
    Poll,
    /// Forget keypair, installation and OAuth token
    Reset,
}

impl Command {
    /// Parse the arguments following the program name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|arg| arg.as_ref().to_string()).collect();
        match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["install"] => Ok(Self::Install),
            ["authorize-url"] => Ok(Self::AuthorizeUrl),
            ["authorize", code] => Ok(Self::Authorize { code: (*code).to_string() }),
            ["pair"] => Ok(Self::Pair),
            ["poll"] => Ok(Self::Poll),
            ["reset"] => Ok(Self::Reset),
            _ => Err(BankLinkError::Config(format!("usage: {USAGE}"))),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Install => "install",
            Self::AuthorizeUrl => "authorize-url",
            Self::Authorize { .. } => "authorize",
            Self::Pair => "pair",
            Self::Poll => "poll",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}

pub const USAGE: &str = "banklink <install | authorize-url | authorize <code> | pair | poll | reset>";

/// Run a one-shot command.
///
/// `poll` is long-running and handled by [`run_poller`].
pub async fn run(ctx: &AppContext, command: &Command) -> Result<Vec<String>> {
    info!(%command, "running command");
    match command {
        Command::Install => {
            let bundle = ctx.keys.ensure_key_pair().await?;
            Ok(vec![bundle.key_pair.public_key_pem])
        }
        Command::AuthorizeUrl => {
            let state = uuid::Uuid::new_v4().to_string();
            Ok(vec![ctx.oauth.authorization_url(&state)?.to_string()])
        }
        Command::Authorize { code } => {
            let tokens = ctx.oauth.exchange_code(code).await?;
            ctx.access.store_tokens(&tokens).await?;
            Ok(vec!["authorized".to_string()])
        }
        Command::Pair => {
            ctx.keys.ensure_key_pair().await?;
            let users = ctx.client.pair().await?;
            Ok(users
                .into_iter()
                .map(|user| match user.display_name {
                    Some(name) => format!("{}\t{}\t{}", user.id, user.kind, name),
                    None => format!("{}\t{}", user.id, user.kind),
                })
                .collect())
        }
        Command::Reset => {
            ctx.client.session().invalidate().await;
            ctx.keys.reset_credentials().await?;
            ctx.access.clear().await?;
            Ok(vec!["reset".to_string()])
        }
        Command::Poll => Err(BankLinkError::Internal("poll is a long-running command".into())),
    }
}

/// Run the poller until `shutdown` resolves.
pub async fn run_poller<F>(ctx: &AppContext, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()>,
{
    ctx.keys.ensure_key_pair().await?;
    let mut poller = ctx.poller()?;
    poller.start().await?;
    shutdown.await;
    info!("shutting down poller");
    poller.stop().await
}
