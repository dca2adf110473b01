use serde::Serialize;

use crate::domain::value::{MessageText, PhoneNumber};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Echo of a message handed to the messaging client.
///
/// The client reports no delivery receipt, so this only confirms what was sent.
pub struct DispatchResult {
    pub number: PhoneNumber,
    pub message: MessageText,
}
