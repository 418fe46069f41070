use std::result;

use serenity::prelude::SerenityError;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("The requested giveaway was not found.")]
    NotFound,
    #[error("The giveaway is no longer open for entries.")]
    NotOpen,
    #[error("You have already entered this giveaway.")]
    AlreadyEntered,
    #[error("You don't have any of the roles required for this giveaway.")]
    Ineligible,
    #[error("The giveaway hasn't ended yet.")]
    NotEnded,
    #[error("{0}")]
    Serenity(String),
}

impl From<SerenityError> for Error {
    fn from(err: SerenityError) -> Error {
        let description = err.to_string();
        Error::Serenity(description)
    }
}
