use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Wrapper for [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html):
    /// the socket or the external program could not be reached at all.
    #[error("transport: {0}")]
    Transport(#[from] std::io::Error),

    /// A source completed without producing any payload.
    #[error("empty reply from {source_name}")]
    NoData { source_name: String },

    /// The external program ran but exited with a failure status.
    #[error("{program} exited with {status}")]
    Program {
        program: String,
        status: std::process::ExitStatus,
    },

    /// A reply was received but carried neither a country code nor a
    /// network block.
    #[error("no country code or network block for {resource}")]
    NoRecord { resource: String },

    /// The resource cannot be turned into a query string.
    #[error("invalid resource {resource:?}: {message}")]
    InvalidResource { resource: String, message: String },

    /// Every configured source failed or none was configured.
    #[error("no response for {resource}")]
    NoResponse { resource: String },
}
