use crate::client::{missed_on_404, ReliableRequestClient};
use crate::error::Error;
use crate::memo::{TtlCache, MEMO_TTL};
use crate::pool::{is_indexer_delayed, resolve_pool_kind, PoolKind};
use beacon_time::{Epoch, Slot};
use indexer_types::{
    AttestationRewardsResponse, BeaconBlockEnvelope, BlockRewardsData, CommitteeApiEntry,
    MaybeMissed, SyncCommitteeApiResponse, SyncCommitteeRewardEntry, ValidatorApiEntry,
    ValidatorStatus,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use slog::Logger;
use std::sync::Arc;

/// Typed operations over the Reliable Request Client for every beacon-API
/// endpoint the indexer consumes (spec §4.3, §6).
pub struct BeaconApiClient {
    rrc: ReliableRequestClient,
    http: Client,
    block_rewards_memo: Arc<TtlCache<u64, MaybeMissed<BlockRewardsData>>>,
    sync_rewards_memo: Arc<TtlCache<u64, MaybeMissed<Vec<SyncCommitteeRewardEntry>>>>,
    #[allow(dead_code)]
    log: Logger,
}

async fn get_json<T: DeserializeOwned>(http: &Client, url: Url) -> Result<T, Error> {
    let resp = http.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(Error::UnexpectedStatus(resp.status()));
    }
    Ok(resp.json::<T>().await?)
}

async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    http: &Client,
    url: Url,
    body: &B,
) -> Result<T, Error> {
    let resp = http.post(url).json(body).send().await?;
    if !resp.status().is_success() {
        return Err(Error::UnexpectedStatus(resp.status()));
    }
    Ok(resp.json::<T>().await?)
}

impl BeaconApiClient {
    pub fn new(rrc: ReliableRequestClient, log: Logger) -> Self {
        Self {
            rrc,
            http: Client::new(),
            block_rewards_memo: Arc::new(TtlCache::new(MEMO_TTL)),
            sync_rewards_memo: Arc::new(TtlCache::new(MEMO_TTL)),
            log,
        }
    }

    fn pool_kind(&self, preferred: PoolKind, current: u64, value: u64) -> PoolKind {
        resolve_pool_kind(preferred, is_indexer_delayed(current, value))
    }

    /// `GET /eth/v1/beacon/states/{epoch}/committees?epoch=E`.
    pub async fn get_committees(&self, epoch: Epoch, current_epoch: Epoch) -> Result<Vec<CommitteeApiEntry>, Error> {
        let kind = self.pool_kind(PoolKind::Archive, current_epoch.as_u64(), epoch.as_u64());
        let http = self.http.clone();
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<CommitteeApiEntry>,
        }
        let epoch_val = epoch.as_u64();
        self.rrc
            .do_call::<Vec<CommitteeApiEntry>, _, _, fn(Error) -> Result<Vec<CommitteeApiEntry>, Error>>(
                kind,
                move |base| {
                    let http = http.clone();
                    async move {
                        let url = base.join(&format!(
                            "eth/v1/beacon/states/head/committees?epoch={epoch_val}"
                        ))?;
                        get_json::<Envelope>(&http, url).await.map(|e| e.data)
                    }
                },
                None,
            )
            .await
    }

    /// `GET /eth/v1/beacon/states/{slot}/sync_committees?epoch=E`, queried
    /// at the first slot of `epoch` (spec §4.3).
    pub async fn get_sync_committees(&self, epoch: Epoch, first_slot: Slot) -> Result<SyncCommitteeApiResponse, Error> {
        let http = self.http.clone();
        let epoch_val = epoch.as_u64();
        let slot_val = first_slot.as_u64();
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: SyncCommitteeApiResponse,
        }
        self.rrc
            .do_call::<SyncCommitteeApiResponse, _, _, fn(Error) -> Result<SyncCommitteeApiResponse, Error>>(
                PoolKind::Archive,
                move |base| {
                    let http = http.clone();
                    async move {
                        let url = base.join(&format!(
                            "eth/v1/beacon/states/{slot_val}/sync_committees?epoch={epoch_val}"
                        ))?;
                        get_json::<Envelope>(&http, url).await.map(|e| e.data)
                    }
                },
                None,
            )
            .await
    }

    /// `GET /eth/v2/beacon/blocks/{slot}`; 404 maps to `SLOT_MISSED`.
    pub async fn get_block(&self, slot: Slot) -> Result<MaybeMissed<BeaconBlockEnvelope>, Error> {
        let http = self.http.clone();
        let slot_val = slot.as_u64();
        self.rrc
            .do_call(
                PoolKind::Archive,
                move |base| {
                    let http = http.clone();
                    async move {
                        let url = base.join(&format!("eth/v2/beacon/blocks/{slot_val}"))?;
                        get_json::<BeaconBlockEnvelope>(&http, url).await.map(MaybeMissed::Present)
                    }
                },
                Some(missed_on_404(MaybeMissed::Missed)),
            )
            .await
    }

    /// `GET /eth/v1/beacon/blocks/{slot}/attestations`.
    pub async fn get_block_attestations(&self, slot: Slot) -> Result<Vec<indexer_types::AttestationJson>, Error> {
        let http = self.http.clone();
        let slot_val = slot.as_u64();
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<indexer_types::AttestationJson>,
        }
        self.rrc
            .do_call::<Vec<indexer_types::AttestationJson>, _, _, fn(Error) -> Result<Vec<indexer_types::AttestationJson>, Error>>(
                PoolKind::Archive,
                move |base| {
                    let http = http.clone();
                    async move {
                        let url = base.join(&format!("eth/v1/beacon/blocks/{slot_val}/attestations"))?;
                        get_json::<Envelope>(&http, url).await.map(|e| e.data)
                    }
                },
                None,
            )
            .await
    }

    /// `POST /eth/v1/beacon/states/{stateId}/validator_balances`.
    pub async fn get_validators_balances(
        &self,
        state_id: &str,
        ids: &[u64],
        pool: PoolKind,
    ) -> Result<Vec<ValidatorApiEntry>, Error> {
        let http = self.http.clone();
        let state_id = state_id.to_string();
        let body: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<ValidatorApiEntry>,
        }
        self.rrc
            .do_call::<Vec<ValidatorApiEntry>, _, _, fn(Error) -> Result<Vec<ValidatorApiEntry>, Error>>(
                pool,
                move |base| {
                    let http = http.clone();
                    let body = body.clone();
                    let state_id = state_id.clone();
                    async move {
                        let url = base.join(&format!("eth/v1/beacon/states/{state_id}/validator_balances"))?;
                        post_json::<Vec<String>, Envelope>(&http, url, &body).await.map(|e| e.data)
                    }
                },
                None,
            )
            .await
    }

    /// `POST /eth/v1/beacon/states/{stateId}/validators` with an optional
    /// status filter.
    pub async fn get_validators(
        &self,
        state_id: &str,
        ids: &[u64],
        statuses: &[ValidatorStatus],
        pool: PoolKind,
    ) -> Result<Vec<ValidatorApiEntry>, Error> {
        let http = self.http.clone();
        let state_id = state_id.to_string();
        #[derive(serde::Serialize)]
        struct Body {
            ids: Vec<String>,
            statuses: Vec<String>,
        }
        let body = Body {
            ids: ids.iter().map(|i| i.to_string()).collect(),
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
        };
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<ValidatorApiEntry>,
        }
        self.rrc
            .do_call::<Vec<ValidatorApiEntry>, _, _, fn(Error) -> Result<Vec<ValidatorApiEntry>, Error>>(
                pool,
                move |base| {
                    let http = http.clone();
                    let body = Body { ids: body.ids.clone(), statuses: body.statuses.clone() };
                    let state_id = state_id.clone();
                    async move {
                        let url = base.join(&format!("eth/v1/beacon/states/{state_id}/validators"))?;
                        post_json::<Body, Envelope>(&http, url, &body).await.map(|e| e.data)
                    }
                },
                None,
            )
            .await
    }

    /// `POST /eth/v1/beacon/rewards/attestations/{epoch}`.
    pub async fn get_attestation_rewards(
        &self,
        epoch: Epoch,
        validator_ids: &[u64],
    ) -> Result<AttestationRewardsResponse, Error> {
        let http = self.http.clone();
        let epoch_val = epoch.as_u64();
        let body: Vec<String> = validator_ids.iter().map(|i| i.to_string()).collect();
        self.rrc
            .do_call::<AttestationRewardsResponse, _, _, fn(Error) -> Result<AttestationRewardsResponse, Error>>(
                PoolKind::Full,
                move |base| {
                    let http = http.clone();
                    let body = body.clone();
                    async move {
                        let url = base.join(&format!("eth/v1/beacon/rewards/attestations/{epoch_val}"))?;
                        post_json(&http, url, &body).await
                    }
                },
                None,
            )
            .await
    }

    /// `GET /eth/v1/beacon/rewards/blocks/{slot}`, memoized 10 minutes,
    /// 404/"NOT_FOUND: beacon block" mapped to `SLOT_MISSED`.
    pub async fn get_block_rewards(
        &self,
        slot: Slot,
        current_slot: Slot,
    ) -> Result<MaybeMissed<BlockRewardsData>, Error> {
        let memo = self.block_rewards_memo.clone();
        let slot_val = slot.as_u64();
        let kind = self.pool_kind(PoolKind::Full, current_slot.as_u64(), slot_val);
        let http = self.http.clone();
        let rrc = self.rrc.clone();
        memo.get_or_compute(slot_val, move || async move {
            rrc.do_call(
                kind,
                move |base| {
                    let http = http.clone();
                    async move {
                        let url = base.join(&format!("eth/v1/beacon/rewards/blocks/{slot_val}"))?;
                        get_json::<BlockRewardsData>(&http, url).await.map(MaybeMissed::Present)
                    }
                },
                Some(missed_on_404(MaybeMissed::Missed)),
            )
            .await
        })
        .await
    }

    /// `POST /eth/v1/beacon/rewards/sync_committee/{slot}`, memoized 10
    /// minutes. Per §9, callers must always pass the full sync-committee set
    /// of the enclosing epoch — the memo key is the slot alone.
    pub async fn get_sync_committee_rewards(
        &self,
        slot: Slot,
        validator_ids: &[u64],
    ) -> Result<MaybeMissed<Vec<SyncCommitteeRewardEntry>>, Error> {
        debug_assert!(!validator_ids.is_empty(), "sync committee validator set must be the full epoch set");
        let memo = self.sync_rewards_memo.clone();
        let slot_val = slot.as_u64();
        let http = self.http.clone();
        let rrc = self.rrc.clone();
        let body: Vec<String> = validator_ids.iter().map(|i| i.to_string()).collect();
        memo.get_or_compute(slot_val, move || async move {
            rrc.do_call(
                PoolKind::Full,
                move |base| {
                    let http = http.clone();
                    let body = body.clone();
                    async move {
                        let url = base.join(&format!("eth/v1/beacon/rewards/sync_committee/{slot_val}"))?;
                        post_json::<Vec<String>, Vec<SyncCommitteeRewardEntry>>(&http, url, &body)
                            .await
                            .map(MaybeMissed::Present)
                    }
                },
                Some(missed_on_404(MaybeMissed::Missed)),
            )
            .await
        })
        .await
    }
}
