use dmirror_lib::context_trait;

use crate::drive::DriveError;
use crate::notify::NotifyError;

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Config,
    Drive,
    Notify,
    Sync,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Kind::Config => "config",
            Kind::Drive => "drive",
            Kind::Notify => "notify",
            Kind::Sync => "sync",
        })
    }
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    msg: Option<String>,
    src: Option<BoxDynError>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            kind,
            msg: None,
            src: None,
        }
    }

    pub fn config<M>(msg: M) -> Error
    where
        M: Into<String>
    {
        Error::new(Kind::Config).message(msg)
    }

    pub fn message<M>(mut self, msg: M) -> Error
    where
        M: Into<String>
    {
        self.msg = Some(msg.into());
        self
    }

    pub fn source<S>(mut self, src: S) -> Error
    where
        S: Into<BoxDynError>
    {
        self.src = Some(src.into());
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error", self.kind)?;

        if let Some(msg) = &self.msg {
            write!(f, ": {msg}")?;
        }

        if let Some(err) = &self.src {
            write!(f, "\n{err}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.src.as_ref().map(|v| & **v as _)
    }
}

impl From<DriveError> for Error {
    fn from(err: DriveError) -> Self {
        Error::new(Kind::Drive).source(err)
    }
}

impl From<NotifyError> for Error {
    fn from(err: NotifyError) -> Self {
        Error::new(Kind::Notify).source(err)
    }
}

context_trait!(Error);

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<BoxDynError>
{
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>
    {
        self.map_err(|err| Error::config(cxt).source(err))
    }
}

impl<T> Context<T, ()> for std::option::Option<T> {
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>
    {
        self.ok_or_else(|| Error::config(cxt))
    }
}
