use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Beacon-chain validator status, as returned by `getValidators`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    PendingInitialized,
    PendingQueued,
    ActiveOngoing,
    ActiveExiting,
    ActiveSlashed,
    ExitedUnslashed,
    ExitedSlashed,
    WithdrawalPossible,
    WithdrawalDone,
}

impl ValidatorStatus {
    /// `true` for statuses whose rewards are permanently settled; these
    /// validators are never included in an `getAttestationRewards` request
    /// (spec §4.4 "Attestation rewards").
    pub fn is_final(self) -> bool {
        matches!(
            self,
            ValidatorStatus::ExitedUnslashed
                | ValidatorStatus::ExitedSlashed
                | ValidatorStatus::WithdrawalDone
                | ValidatorStatus::WithdrawalPossible
        )
    }

}

/// Decides whether a validator should be included in an `getAttestationRewards`
/// request, per spec §4.4: only `active_ongoing`, `active_exiting`, and
/// validators with no stored status yet (`None`, freshly discovered) are
/// requested; every other status — including the four "final" ones and the
/// pending/slashed statuses — is excluded.
pub fn is_reward_eligible(status: Option<ValidatorStatus>) -> bool {
    match status {
        None => true,
        Some(ValidatorStatus::ActiveOngoing) | Some(ValidatorStatus::ActiveExiting) => true,
        Some(_) => false,
    }
}

impl fmt::Display for ValidatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidatorStatus::PendingInitialized => "pending_initialized",
            ValidatorStatus::PendingQueued => "pending_queued",
            ValidatorStatus::ActiveOngoing => "active_ongoing",
            ValidatorStatus::ActiveExiting => "active_exiting",
            ValidatorStatus::ActiveSlashed => "active_slashed",
            ValidatorStatus::ExitedUnslashed => "exited_unslashed",
            ValidatorStatus::ExitedSlashed => "exited_slashed",
            ValidatorStatus::WithdrawalPossible => "withdrawal_possible",
            ValidatorStatus::WithdrawalDone => "withdrawal_done",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ValidatorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending_initialized" => ValidatorStatus::PendingInitialized,
            "pending_queued" => ValidatorStatus::PendingQueued,
            "active_ongoing" => ValidatorStatus::ActiveOngoing,
            "active_exiting" => ValidatorStatus::ActiveExiting,
            "active_slashed" => ValidatorStatus::ActiveSlashed,
            "exited_unslashed" => ValidatorStatus::ExitedUnslashed,
            "exited_slashed" => ValidatorStatus::ExitedSlashed,
            "withdrawal_possible" => ValidatorStatus::WithdrawalPossible,
            "withdrawal_done" => ValidatorStatus::WithdrawalDone,
            other => return Err(format!("unknown validator status {other}")),
        })
    }
}

/// The durable per-validator row. `withdrawal_address` is `None` for BLS
/// (0x00) withdrawal credentials that have not yet been set to an execution
/// address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub id: u64,
    pub status: ValidatorStatus,
    pub balance: u64,
    pub effective_balance: u64,
    pub withdrawal_address: Option<String>,
}

/// One entry of a `getValidators`/`getValidatorsBalances` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorApiEntry {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub index: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub balance: u64,
    pub status: ValidatorStatus,
    pub validator: ValidatorApiDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorApiDetail {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub effective_balance: u64,
    pub withdrawal_credentials: String,
}

impl ValidatorApiDetail {
    /// Execution withdrawal credentials (`0x01`/`0x02` prefix) carry an
    /// address in the low 20 bytes; BLS credentials (`0x00`) carry none.
    pub fn withdrawal_address(&self) -> Option<String> {
        let creds = self.withdrawal_credentials.trim_start_matches("0x");
        if creds.len() != 64 {
            return None;
        }
        let prefix = &creds[0..2];
        if prefix == "01" || prefix == "02" {
            Some(format!("0x{}", &creds[24..]))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_statuses_are_excluded_from_rewards() {
        assert!(ValidatorStatus::ExitedUnslashed.is_final());
        assert!(ValidatorStatus::ExitedSlashed.is_final());
        assert!(ValidatorStatus::WithdrawalDone.is_final());
        assert!(ValidatorStatus::WithdrawalPossible.is_final());
        assert!(!ValidatorStatus::ActiveOngoing.is_final());
    }

    #[test]
    fn reward_eligibility_matches_spec_categories() {
        assert!(is_reward_eligible(None));
        assert!(is_reward_eligible(Some(ValidatorStatus::ActiveOngoing)));
        assert!(is_reward_eligible(Some(ValidatorStatus::ActiveExiting)));
        assert!(!is_reward_eligible(Some(ValidatorStatus::ExitedUnslashed)));
        assert!(!is_reward_eligible(Some(ValidatorStatus::WithdrawalPossible)));
        assert!(!is_reward_eligible(Some(ValidatorStatus::PendingQueued)));
    }

    #[test]
    fn withdrawal_address_decoded_only_for_execution_credentials() {
        let bls = ValidatorApiDetail {
            effective_balance: 32_000_000_000,
            withdrawal_credentials: format!("0x00{}", "11".repeat(31)),
        };
        assert_eq!(bls.withdrawal_address(), None);

        let exec = ValidatorApiDetail {
            effective_balance: 32_000_000_000,
            withdrawal_credentials: format!(
                "0x01000000000000000000000000{}",
                "ab".repeat(20)
            ),
        };
        assert_eq!(
            exec.withdrawal_address(),
            Some(format!("0x{}", "ab".repeat(20)))
        );
    }
}
