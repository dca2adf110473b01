use crate::domain::validation::ValidationError;
use crate::domain::value::{MessageText, PhoneNumber};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A validated send request: canonical recipient plus message body.
///
/// Only ever built from caller input and handed to the dispatch gateway; it is
/// never persisted.
pub struct DispatchRequest {
    number: PhoneNumber,
    message: MessageText,
}

impl DispatchRequest {
    /// Validate raw caller input.
    ///
    /// The number is normalized through [`PhoneNumber::parse`], the message must
    /// pass [`MessageText::new`].
    pub fn new(
        number: impl AsRef<str>,
        message: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            number: PhoneNumber::parse(number)?,
            message: MessageText::new(message)?,
        })
    }

    pub fn number(&self) -> &PhoneNumber {
        &self.number
    }

    pub fn message(&self) -> &MessageText {
        &self.message
    }

    pub fn into_parts(self) -> (PhoneNumber, MessageText) {
        (self.number, self.message)
    }
}
