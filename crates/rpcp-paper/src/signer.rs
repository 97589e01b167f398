//! Deterministic wallet signer double. `tx_ref`s are derived from the
//! sending address and a per-address monotonic counter rather than a
//! random nonce or wall-clock timestamp, so a replayed scenario produces
//! byte-identical refs. Confirmation is immediate: there is no chain to
//! wait on.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rpcp_collab::{CollabResult, ConfirmationStatus, Receipt, SignHandle, TxRequest, WalletSigner};

#[derive(Debug, Default)]
pub struct PaperSigner {
    next_nonce: Mutex<BTreeMap<String, u64>>,
}

impl PaperSigner {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_tx_ref(&self, from: &str) -> String {
        let mut nonces = self.next_nonce.lock().unwrap();
        let nonce = nonces.entry(from.to_string()).or_insert(0);
        let tx_ref = format!("paper:tx:{from}:{nonce}");
        *nonce += 1;
        tx_ref
    }
}

#[async_trait]
impl WalletSigner for PaperSigner {
    async fn sign_and_send(&self, from: &str, _tx: TxRequest) -> CollabResult<SignHandle> {
        Ok(SignHandle {
            tx_ref: self.next_tx_ref(from),
        })
    }

    async fn wait_for_confirmation(&self, handle: &SignHandle, _timeout_secs: u64) -> CollabResult<Receipt> {
        Ok(Receipt {
            tx_ref: handle.tx_ref.clone(),
            status: ConfirmationStatus::Confirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_schemas::Micros;

    fn tx() -> TxRequest {
        TxRequest {
            to: "0xdead".into(),
            asset: "ETH".into(),
            amount: Micros::from_units(1),
            memo: None,
        }
    }

    #[tokio::test]
    async fn tx_refs_are_sequential_per_address() {
        let signer = PaperSigner::new();
        let h1 = signer.sign_and_send("0xhot", tx()).await.unwrap();
        let h2 = signer.sign_and_send("0xhot", tx()).await.unwrap();
        assert_eq!(h1.tx_ref, "paper:tx:0xhot:0");
        assert_eq!(h2.tx_ref, "paper:tx:0xhot:1");
    }

    #[tokio::test]
    async fn tx_ref_counters_are_independent_per_address() {
        let signer = PaperSigner::new();
        let h1 = signer.sign_and_send("0xa", tx()).await.unwrap();
        let h2 = signer.sign_and_send("0xb", tx()).await.unwrap();
        assert_eq!(h1.tx_ref, "paper:tx:0xa:0");
        assert_eq!(h2.tx_ref, "paper:tx:0xb:0");
    }

    #[tokio::test]
    async fn confirmation_is_immediate() {
        let signer = PaperSigner::new();
        let handle = signer.sign_and_send("0xhot", tx()).await.unwrap();
        let receipt = signer.wait_for_confirmation(&handle, 30).await.unwrap();
        assert_eq!(receipt.status, ConfirmationStatus::Confirmed);
        assert_eq!(receipt.tx_ref, handle.tx_ref);
    }
}
