//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod state;
mod validation;
mod value;

pub use request::DispatchRequest;
pub use response::DispatchResult;
pub use state::ClientState;
pub use validation::ValidationError;
pub use value::{CHAT_ID_SUFFIX, COUNTRY_CODE, ChatId, MessageText, PhoneNumber};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_result_serializes_as_plain_strings() {
        let result = DispatchResult {
            number: PhoneNumber::parse("081234567890").unwrap(),
            message: MessageText::new("halo").unwrap(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "number": "6281234567890", "message": "halo" })
        );
    }

    #[test]
    fn only_ready_state_accepts_sends() {
        assert!(ClientState::Ready.is_ready());
        assert!(!ClientState::Uninitialized.is_ready());
        assert!(!ClientState::Initializing.is_ready());
        assert!(!ClientState::Disconnected.is_ready());
        assert_eq!(ClientState::default(), ClientState::Uninitialized);
        assert_eq!(ClientState::Disconnected.to_string(), "disconnected");
    }
}
