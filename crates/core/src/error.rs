use thiserror::Error;

use crate::model::SetNameError;
use crate::model::UserIdError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    SetName(#[from] SetNameError),
    #[error(transparent)]
    UserId(#[from] UserIdError),
}
