//! # Arrival Order Properties
//!
//! For any arrival order of the listed signers under a k-of-n threshold,
//! the attestation agrees on exactly the k-th signature, the agreement
//! holds the first k arrivals, and every later signer is refused.

mod common;

use common::{key, Harness};
use daosign_protocol::ErrorKind;
use daosign_schema::SignatoryPolicy;
use daosign_state::AttestationState;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn threshold_agrees_on_first_k_arrivals(
        order in Just((0u8..4).collect::<Vec<_>>()).prop_shuffle(),
        required in 1u32..=4,
    ) {
        let h = Harness::new();
        let keys: Vec<_> = (0u8..4).map(|i| key(10 + i)).collect();
        let sid = h.register(SignatoryPolicy::threshold(
            required,
            keys.iter().map(|k| k.identity()),
        ));
        let id = h.attest(sid);

        for (n, &i) in order.iter().enumerate() {
            let signer = &keys[i as usize];
            let result = h.sign(id, signer);
            if n < required as usize {
                let view = result.unwrap();
                let expected = if n + 1 == required as usize {
                    AttestationState::Agreed
                } else {
                    AttestationState::Pending
                };
                prop_assert_eq!(view.state, expected);
            } else {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::AlreadyFinalized);
            }
        }

        let first_k: Vec<_> = order[..required as usize]
            .iter()
            .map(|&i| keys[i as usize].identity())
            .collect();
        let view = h.service.get_attestation(id).unwrap();
        prop_assert_eq!(view.agreement.unwrap().signers(), first_k);
    }
}
