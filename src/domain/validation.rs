use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Caller input rejected before anything reaches the messaging client.
pub enum ValidationError {
    /// A required field was absent or empty; `field` is its JSON name.
    Empty { field: &'static str },
    /// `input` does not normalize to `62` followed by 9 to 12 digits.
    InvalidPhoneNumber { input: String },
}

impl ValidationError {
    /// JSON name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } => *field,
            Self::InvalidPhoneNumber { .. } => super::PhoneNumber::FIELD,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "`{field}` is required"),
            Self::InvalidPhoneNumber { input } => write!(
                f,
                "`{}` is not an Indonesian phone number: {input:?}",
                self.field()
            ),
        }
    }
}

impl std::error::Error for ValidationError {}
