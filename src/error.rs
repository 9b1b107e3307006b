use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("cannot load configuration")]
    Config,
    #[display("cannot open cache store")]
    Store,
    #[display("build failed")]
    Build,
    #[display("check failed")]
    Check,
}
