use thiserror::Error;

/// Outcomes a caller has to branch on. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum DietError {
    /// One or more submitted fields failed validation; each entry is a user-facing message.
    #[error("invalid input: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    #[error("invalid birth date '{0}'")]
    InvalidBirthDate(String),

    #[error("invalid gender '{0}'")]
    InvalidGender(String),

    /// The operation needs a stored profile and the user has none yet.
    #[error("profile has not been set up")]
    ProfileMissing,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DietError {
    /// Field-level messages suitable for showing to the user, if this is a validation failure.
    #[must_use]
    pub fn user_messages(&self) -> Option<Vec<String>> {
        match self {
            Self::InvalidInput(errors) => Some(errors.clone()),
            Self::InvalidBirthDate(_) => Some(vec![crate::models::BIRTH_DATE_MESSAGE.to_string()]),
            Self::InvalidGender(_) => Some(vec![crate::models::GENDER_MESSAGE.to_string()]),
            Self::ProfileMissing | Self::Storage(_) => None,
        }
    }
}
