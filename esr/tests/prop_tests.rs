use proptest::prelude::*;

use pangea_esr::{RequestBody, SigningRequest};
use pangea_types::{Action, AntelopeChainId, AntelopeName, PermissionLevel};

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[1-5a-z]([.1-5a-z]{0,10}[1-5a-z])?").unwrap()
}

fn chain_id_strategy() -> impl Strategy<Value = AntelopeChainId> {
    prop::array::uniform32(0u8..).prop_map(AntelopeChainId)
}

fn action_strategy() -> impl Strategy<Value = Action> {
    (
        name_strategy(),
        name_strategy(),
        name_strategy(),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(account, name, actor, data)| {
            let actor: AntelopeName = actor.parse().unwrap();
            Action::new(
                account.parse().unwrap(),
                name.parse().unwrap(),
                vec![PermissionLevel::active(actor)],
                data,
            )
        })
}

proptest! {
    /// Any buildable request survives the URI round trip intact.
    #[test]
    fn uri_roundtrip(
        chain_id in chain_id_strategy(),
        actions in prop::collection::vec(action_strategy(), 1..4),
        callback in prop::option::of("[a-z]{1,12}"),
        background in any::<bool>(),
        broadcast in any::<bool>(),
    ) {
        let mut request = SigningRequest::from_actions(chain_id, actions)
            .with_broadcast(broadcast);
        if let Some(cb) = callback {
            request = request.with_callback(&format!("https://{cb}.example/cb"), background);
        }
        let uri = request.encode().unwrap();
        let decoded = SigningRequest::decode(&uri).unwrap();
        prop_assert_eq!(decoded, request);
    }

    /// Single-action and transaction bodies round trip too.
    #[test]
    fn body_variants_roundtrip(
        chain_id in chain_id_strategy(),
        action in action_strategy(),
    ) {
        let single = SigningRequest::from_action(chain_id, action.clone());
        let uri = single.encode().unwrap();
        let decoded = SigningRequest::decode(&uri).unwrap();
        match decoded.body() {
            RequestBody::Action(a) => prop_assert_eq!(a, &action),
            other => prop_assert!(false, "unexpected body {:?}", other),
        }
    }

    /// Arbitrary payload bytes never panic the decoder.
    #[test]
    fn decoder_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = SigningRequest::decode_payload(&bytes);
    }
}
