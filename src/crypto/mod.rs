pub mod password;

pub use password::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Wrong password")]
    WrongPassword,

    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Iteration count must be positive")]
    InvalidIterations,
}
