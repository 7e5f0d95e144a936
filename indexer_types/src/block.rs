use serde::{Deserialize, Serialize};

/// The subset of a beacon block's JSON shape the indexer actually reads.
/// Deliberately not a full SSZ-typed `BeaconBlock` — this is a follower,
/// not a consensus client (spec §1 Non-goals), so untyped-but-validated
/// JSON fields are enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconBlockEnvelope {
    pub data: SignedBeaconBlockJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedBeaconBlockJson {
    pub message: BeaconBlockJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconBlockJson {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub proposer_index: u64,
    pub body: BeaconBlockBodyJson,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeaconBlockBodyJson {
    #[serde(default)]
    pub attestations: Vec<AttestationJson>,
    #[serde(default)]
    pub voluntary_exits: Vec<SignedVoluntaryExitJson>,
    #[serde(default)]
    pub deposits: Vec<DepositJson>,
    #[serde(default)]
    pub execution_payload: Option<ExecutionPayloadJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationJson {
    pub aggregation_bits: String,
    pub data: AttestationDataJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationDataJson {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedVoluntaryExitJson {
    pub message: VoluntaryExitJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoluntaryExitJson {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub epoch: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub validator_index: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositJson {
    pub data: DepositDataJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositDataJson {
    pub pubkey: String,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionPayloadJson {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub block_number: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub timestamp: u64,
    pub fee_recipient: String,
    #[serde(default)]
    pub withdrawals: Vec<WithdrawalJson>,
    #[serde(default)]
    pub deposit_requests: Vec<DepositRequestJson>,
    #[serde(default)]
    pub withdrawal_requests: Vec<WithdrawalRequestJson>,
    #[serde(default)]
    pub consolidation_requests: Vec<ConsolidationRequestJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalJson {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub validator_index: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRequestJson {
    pub pubkey: String,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequestJson {
    pub source_address: String,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationRequestJson {
    pub source_address: String,
    pub target_pubkey: String,
}

/// `"validatorIndex:amount"` formatting used for the slot row's withdrawal
/// and deposit summary columns (spec §4.5.5 "each extracts the matching
/// array from the block, formats it").
pub fn format_withdrawals(withdrawals: &[WithdrawalJson]) -> String {
    withdrawals
        .iter()
        .map(|w| format!("{}:{}", w.validator_index, w.amount))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_voluntary_exits(exits: &[SignedVoluntaryExitJson]) -> String {
    exits
        .iter()
        .map(|e| format!("{}:{}", e.message.validator_index, e.message.epoch))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_deposits(deposits: &[DepositJson]) -> String {
    deposits
        .iter()
        .map(|d| format!("{}:{}", d.data.pubkey, d.data.amount))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_el_withdrawals(reqs: &[WithdrawalRequestJson]) -> String {
    reqs.iter()
        .map(|r| format!("{}:{}", r.source_address, r.amount))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_el_deposits(reqs: &[DepositRequestJson]) -> String {
    reqs.iter()
        .map(|r| format!("{}:{}", r.pubkey, r.amount))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_el_consolidations(reqs: &[ConsolidationRequestJson]) -> String {
    reqs.iter()
        .map(|r| format!("{}:{}", r.source_address, r.target_pubkey))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_withdrawals_as_index_amount_pairs() {
        let withdrawals = vec![
            WithdrawalJson { validator_index: 1, amount: 100 },
            WithdrawalJson { validator_index: 2, amount: 200 },
        ];
        assert_eq!(format_withdrawals(&withdrawals), "1:100,2:200");
    }

    #[test]
    fn formats_empty_list_as_empty_string() {
        assert_eq!(format_withdrawals(&[]), "");
    }
}
