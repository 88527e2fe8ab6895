/// Why a channel reference could not be turned into a channel id.
///
/// Messenger adapters map their platform errors into these kinds; the resolver
/// branches on them instead of matching adapter-specific error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("already a participant")]
    AlreadyMember,

    #[error("invalid invite")]
    InviteInvalid,

    #[error("invite expired")]
    InviteExpired,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),
}

/// Core error type.
///
/// Every variant except `Config`/`Io` is expected at the command boundary and
/// turned into a reply via [`Error::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolveError),

    #[error("already present: {0}")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Human-readable reply text for the requesting user (plain text, not escaped).
    pub fn user_message(&self) -> String {
        match self {
            Error::Resolution(ResolveError::InviteInvalid) => {
                "Invalid or unsupported invite link.".to_string()
            }
            Error::Resolution(ResolveError::InviteExpired) => "Invite link has expired.".to_string(),
            Error::Resolution(ResolveError::NotFound(what)) => {
                format!("Channel not found: {what}")
            }
            Error::Resolution(e) => format!("Could not resolve channel: {e}"),
            Error::Duplicate(msg) | Error::NotFound(msg) | Error::Validation(msg) => msg.clone(),
            other => format!("Error: {other}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
