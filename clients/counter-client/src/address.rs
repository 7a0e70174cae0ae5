//! Counter record address derivation.

use solana_sdk::pubkey::Pubkey;

use crate::constants::COUNTER_SEED;

/// Program-derived address and bump of the counter record owned by `identity`.
pub fn find_counter_address(identity: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COUNTER_SEED, identity.as_ref()], program_id)
}

pub fn derive_counter_address(identity: &Pubkey, program_id: &Pubkey) -> Pubkey {
    find_counter_address(identity, program_id).0
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_matches_seed_layout() {
        let identity = Pubkey::new_unique();
        let (address, bump) = find_counter_address(&identity, &crate::ID);

        let recreated =
            Pubkey::create_program_address(&[COUNTER_SEED, identity.as_ref(), &[bump]], &crate::ID)
                .unwrap();
        assert_eq!(address, recreated);
    }

    #[test]
    fn test_program_id_changes_address() {
        let identity = Pubkey::new_unique();
        let other_program = Pubkey::new_unique();

        assert_ne!(
            derive_counter_address(&identity, &crate::ID),
            derive_counter_address(&identity, &other_program)
        );
    }

    #[test]
    fn test_no_collisions_across_random_identities() {
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let identity = Pubkey::new_from_array(rand::random());
            let address = derive_counter_address(&identity, &crate::ID);
            assert!(seen.insert(address), "collision for {identity}");
        }
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(bytes in any::<[u8; 32]>()) {
            let identity = Pubkey::new_from_array(bytes);
            let first = derive_counter_address(&identity, &crate::ID);
            let second = derive_counter_address(&identity, &crate::ID);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn distinct_identities_get_distinct_addresses(
            a in any::<[u8; 32]>(),
            b in any::<[u8; 32]>(),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(
                derive_counter_address(&Pubkey::new_from_array(a), &crate::ID),
                derive_counter_address(&Pubkey::new_from_array(b), &crate::ID)
            );
        }
    }
}
