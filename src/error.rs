use derive_more::{Display, Error};
use std::net::SocketAddr;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration could not be loaded")]
    Config,
    #[display("no namespace is ready to serve")]
    Startup,
    #[display("could not listen on {_0}")]
    Bind(#[error(not(source))] SocketAddr),
    #[display("server stopped unexpectedly")]
    Serve,
}
