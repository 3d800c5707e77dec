//! Property tests for the token layer.

use frond_core::{ArrayPolicy, HmacTokenSigner, TokenSigner, Variable, VariableCodec};
use proptest::prelude::*;

fn signer() -> HmacTokenSigner {
    HmacTokenSigner::new(*b"property-test-secret")
}

/// Generates scalar variables of every encodable kind.
fn arb_scalar() -> impl Strategy<Value = Variable> {
    prop_oneof![
        Just(Variable::Null),
        any::<bool>().prop_map(Variable::Bool),
        any::<i64>().prop_map(Variable::Int),
        "[^\\x00]{0,64}".prop_map(Variable::String),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: sign/unsign round-trips every payload exactly.
    #[test]
    fn prop_sign_unsign_roundtrip(payload in "\\PC{0,128}") {
        let signer = signer();
        let token = signer.sign(&payload);
        prop_assert_eq!(signer.unsign(&token).unwrap(), payload);
    }

    /// Property: tokens from a different key never verify.
    #[test]
    fn prop_foreign_tokens_fail_closed(payload in "\\PC{0,64}") {
        let signer = signer();
        let attacker = HmacTokenSigner::new(*b"some-other-secret!!!");
        let forged = attacker.sign(&payload);
        prop_assert!(signer.unsign(&forged).is_err());
    }

    /// Property: decode followed by re-encode is stable for scalars.
    #[test]
    fn prop_decode_reencode_is_stable(value in arb_scalar()) {
        let signer = signer();
        let codec = VariableCodec::new(&signer, ArrayPolicy::Lenient);

        let token = codec.encode("v", &value).unwrap();
        let decoded = codec.decode(&token).unwrap();
        let token_again = codec.encode("v", &Variable::String(decoded.clone())).unwrap();
        prop_assert_eq!(codec.decode(&token_again).unwrap(), decoded);
    }

    /// Property: arrays of scalars always encode under the lenient policy
    /// and never encode under the strict policy.
    #[test]
    fn prop_array_policy_split(items in prop::collection::vec(arb_scalar(), 0..8)) {
        let signer = signer();
        let value = Variable::Array(items);

        let lenient = VariableCodec::new(&signer, ArrayPolicy::Lenient);
        prop_assert!(lenient.encode("items", &value).is_ok());

        let strict = VariableCodec::new(&signer, ArrayPolicy::Strict);
        prop_assert!(strict.encode("items", &value).is_err());
    }
}
