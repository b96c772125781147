//! Property-based tests for the wire envelope
//!
//! Decoding must never panic, and valid frames must keep what the client sent.

use proptest::prelude::*;
use serde_json::json;
use xfchat::shared::envelope::parse_command;
use xfchat::shared::{Command, Envelope, EnvelopeType, UserId};

fn user_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.@:-]{1,32}"
}

proptest! {
    #[test]
    fn test_parse_never_panics(text in ".*") {
        let _ = parse_command(&text);
    }

    #[test]
    fn test_message_frame_keeps_receiver_and_content(
        receiver in user_id(),
        content in ".{0,256}",
        claimed_sender in user_id(),
    ) {
        let frame = json!({
            "type": "message",
            "sender_id": claimed_sender,
            "receiver_id": receiver,
            "content": content,
        });
        let command = parse_command(&frame.to_string()).unwrap();
        prop_assert_eq!(
            command,
            Command::Message { receiver_id: UserId::parse(receiver).unwrap(), content }
        );
    }

    #[test]
    fn test_invalid_receiver_is_refused(receiver in ".*[^a-zA-Z0-9_.@:-].*") {
        let frame = json!({"type": "typing", "receiver_id": receiver, "is_typing": true});
        prop_assert!(parse_command(&frame.to_string()).is_err());
    }

    #[test]
    fn test_unknown_types_are_refused(kind in "[a-z]{1,12}") {
        prop_assume!(!["message", "typing", "read", "auth"].contains(&kind.as_str()));
        let frame = json!({"type": kind, "receiver_id": "u1"});
        prop_assert!(parse_command(&frame.to_string()).is_err());
    }

    #[test]
    fn test_typing_envelope_wire_shape(sender in user_id(), receiver in user_id(), is_typing in any::<bool>()) {
        let envelope = Envelope::typing(
            UserId::parse(sender.clone()).unwrap(),
            UserId::parse(receiver.clone()).unwrap(),
            is_typing,
        );
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        prop_assert_eq!(&value["type"], "typing");
        prop_assert_eq!(&value["sender_id"], sender.as_str());
        prop_assert_eq!(&value["receiver_id"], receiver.as_str());
        prop_assert_eq!(&value["is_typing"], is_typing);
        prop_assert!(value.get("content").is_none());
        prop_assert_eq!(envelope.kind, EnvelopeType::Typing);
    }
}
