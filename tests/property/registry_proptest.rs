//! Property-based tests for the connection registry
//!
//! Random connect, disconnect and send sequences checked against a model map.

use proptest::prelude::*;
use std::collections::HashMap;
use xfchat::backend::realtime::{Connection, ConnectionId, ConnectionRegistry, Delivery, Mailbox};
use xfchat::shared::{Envelope, Principal, UserId};

#[derive(Debug, Clone)]
enum Op {
    Connect(u8),
    Disconnect(u8),
    StaleDisconnect(u8),
    Send(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Connect),
        (0u8..6).prop_map(Op::Disconnect),
        (0u8..6).prop_map(Op::StaleDisconnect),
        (0u8..6).prop_map(Op::Send),
    ]
}

fn user(n: u8) -> UserId {
    UserId::parse(format!("user-{}", n)).unwrap()
}

proptest! {
    #[test]
    fn test_registry_matches_model(ops in prop::collection::vec(op(), 1..60)) {
        let registry = ConnectionRegistry::new();
        let mut model: HashMap<UserId, ConnectionId> = HashMap::new();
        let mut retired: HashMap<UserId, ConnectionId> = HashMap::new();
        let mut mailboxes: Vec<Mailbox> = Vec::new();

        for op in ops {
            match op {
                Op::Connect(n) => {
                    let (connection, mailbox) = Connection::open(Principal::new(user(n), "p"), 128);
                    let id = connection.id();
                    mailboxes.push(mailbox);
                    let replaced = registry.register(connection);
                    prop_assert_eq!(replaced, model.get(&user(n)).copied());
                    if let Some(old) = model.insert(user(n), id) {
                        retired.insert(user(n), old);
                    }
                }
                Op::Disconnect(n) => {
                    let expected = model.remove(&user(n));
                    let removed = expected.map_or(false, |id| registry.unregister(&user(n), id));
                    prop_assert_eq!(removed, expected.is_some());
                    if let Some(id) = expected {
                        retired.insert(user(n), id);
                    }
                }
                Op::StaleDisconnect(n) => {
                    if let Some(&old) = retired.get(&user(n)) {
                        prop_assert!(!registry.unregister(&user(n), old));
                    }
                }
                Op::Send(n) => {
                    let delivery = registry.send_to_user(&user(n), Envelope::error("ping"));
                    let expected = if model.contains_key(&user(n)) { Delivery::Queued } else { Delivery::Offline };
                    prop_assert_eq!(delivery, expected);
                }
            }

            prop_assert_eq!(registry.connected_count(), model.len());
            let mut online: Vec<UserId> = model.keys().cloned().collect();
            online.sort();
            prop_assert_eq!(registry.online_users(), online);
            for (user_id, id) in &model {
                prop_assert_eq!(registry.connection_id(user_id), Some(*id));
            }
        }
    }
}
