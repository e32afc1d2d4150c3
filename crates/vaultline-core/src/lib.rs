// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vaultline vault client.
//!
//! Provides the error type with its stable numeric codes, the domain types
//! shared between storage, API and session crates, and the collaborator
//! traits the session engine is written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{VaultlineError, error_message};
pub use traits::{LocalStorage, SecretStore};
pub use types::{AuthMethod, DeviceConfig, TransactionAction, TransactionRow, TransactionTypes};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn error_codes_are_unique() {
        let codes: HashSet<u32> = VaultlineError::iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), VaultlineError::iter().count());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn error_code_families() {
        assert_eq!(VaultlineError::RequireMasterPassword.code(), 100);
        assert_eq!(VaultlineError::RequireEmailToken.code(), 102);
        assert_eq!(VaultlineError::MissingOrInvalidAppKeys.code(), 202);
        assert_eq!(VaultlineError::InvalidMasterPassword.code(), 302);
        assert_eq!(VaultlineError::DeviceNotRegistered.code(), 401);
        assert_eq!(VaultlineError::InternalDecryptFailure.code(), 507);
        assert_eq!(VaultlineError::ApiEndpointError.code(), 514);
    }

    #[test]
    fn from_code_inverts_code() {
        for error in VaultlineError::iter() {
            assert_eq!(VaultlineError::from_code(error.code()), Some(error));
        }
        assert_eq!(VaultlineError::from_code(0), None);
        assert_eq!(VaultlineError::from_code(999), None);
    }

    #[test]
    fn continuation_and_invalid_input_classes() {
        let continuations: Vec<_> = VaultlineError::iter()
            .filter(|e| e.is_continuation())
            .collect();
        assert_eq!(continuations.len(), 3);
        assert!(continuations.iter().all(|e| (100..200).contains(&e.code())));

        assert!(VaultlineError::Invalid2FACode.is_invalid_input());
        assert!(!VaultlineError::AuthenticationFailed.is_invalid_input());
    }

    #[test]
    fn error_message_covers_success_and_unknown() {
        assert_eq!(error_message(0), "function executed successfully");
        assert_eq!(error_message(12345), "unknown error code");
        assert_eq!(
            error_message(302),
            "the master password provided is invalid"
        );
    }

    #[test]
    fn transaction_action_wire_names() {
        assert_eq!(TransactionAction::BackupEdit.to_string(), "BACKUP_EDIT");
        assert_eq!(
            TransactionAction::from_str("BACKUP_REMOVE").unwrap(),
            TransactionAction::BackupRemove
        );
        assert!(TransactionAction::from_str("backup_edit").is_err());
    }

    #[test]
    fn transaction_types_tags_follow_bit_order() {
        let mask = TransactionTypes::SECURE_NOTE | TransactionTypes::AUTHENTIFIANT;
        assert_eq!(mask.tags(), vec!["AUTHENTIFIANT", "SECURENOTE"]);
        assert_eq!(mask.bits(), 0b1_0000_0001);
        assert!(TransactionTypes::empty().tags().is_empty());
        assert_eq!(TransactionTypes::all().tags().len(), 10);
    }

    #[test]
    fn transaction_types_rejects_unknown_bits() {
        assert!(TransactionTypes::from_bits(1 << 10).is_none());
        assert_eq!(
            TransactionTypes::from_bits(1),
            Some(TransactionTypes::AUTHENTIFIANT)
        );
        assert_eq!(
            TransactionTypes::from_tag("PAYMENTMEANS_CREDITCARD"),
            Some(TransactionTypes::PAYMENT_MEANS_CREDIT_CARD)
        );
        assert_eq!(TransactionTypes::from_tag("authentifiant"), None);
    }

    #[test]
    fn auth_method_uses_snake_case() {
        assert_eq!(AuthMethod::DashlaneAuthenticator.to_string(), "dashlane_authenticator");
        assert_eq!(AuthMethod::from_str("duo_push").unwrap(), AuthMethod::DuoPush);
    }

    #[test]
    fn device_config_debug_redacts_secrets() {
        let mut config = DeviceConfig::new("alice@example.com");
        config.secret_key_encrypted = "c2VjcmV0".into();
        config.master_password_encrypted = Some("bWFzdGVy".into());
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("c2VjcmV0"));
        assert!(!debug.contains("bWFzdGVy"));
    }

    #[test]
    fn device_config_defaults() {
        let config = DeviceConfig::new("bob@example.com");
        assert!(!config.should_save_master_password());
        assert!(!config.auto_sync);
        assert!(!config.is_registered());
    }

    proptest::proptest! {
        #[test]
        fn tags_name_every_set_bit(bits in 0u32..1024) {
            let mask = TransactionTypes::from_bits(bits).unwrap();
            let rebuilt = mask
                .tags()
                .into_iter()
                .filter_map(TransactionTypes::from_tag)
                .fold(TransactionTypes::empty(), |acc, flag| acc | flag);
            proptest::prop_assert_eq!(rebuilt, mask);
            proptest::prop_assert_eq!(mask.tags().len(), bits.count_ones() as usize);
        }
    }
}
