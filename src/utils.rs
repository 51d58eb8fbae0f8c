use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::path::Path;

/// Anchor discriminator: first 8 bytes of `sha256("<namespace>:<name>")`.
pub fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

pub fn sol_to_lamports(sol: f64) -> Result<u64> {
    if !sol.is_finite() || sol < 0.0 {
        return Err(anyhow!("Invalid SOL amount {}", sol));
    }
    let lamports = (sol * LAMPORTS_PER_SOL as f64).round();
    if lamports > u64::MAX as f64 {
        return Err(anyhow!("SOL amount {} out of range", sol));
    }
    Ok(lamports as u64)
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Loads a keypair stored as a JSON array of the 64 secret key bytes.
pub fn load_keypair(path: &Path) -> Result<Keypair> {
    read_keypair_file(path)
        .map_err(|e| anyhow!("Failed to read keypair from {}: {}", path.display(), e))
}

/// Program logs attached to a failed RPC call, if the node returned any.
pub fn transaction_logs(err: &anyhow::Error) -> Option<Vec<String>> {
    let client_err = err.chain().find_map(|e| e.downcast_ref::<ClientError>())?;
    match client_err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
            ..
        }) => result.logs.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use solana_client::rpc_response::RpcSimulateTransactionResult;
    use solana_sdk::signature::{write_keypair_file, Signer};

    #[test]
    fn test_discriminator() {
        let expected = Sha256::digest(b"account:Multisig");
        assert_eq!(&discriminator("account", "Multisig")[..], &expected[..8]);
        assert_ne!(
            discriminator("global", "proposal_create"),
            discriminator("global", "proposal_approve")
        );
    }

    #[test]
    fn test_sol_conversion() {
        assert_eq!(sol_to_lamports(0.1).unwrap(), 100_000_000);
        assert_eq!(sol_to_lamports(1.5).unwrap(), 1_500_000_000);
        assert_eq!(sol_to_lamports(0.0).unwrap(), 0);
        assert!(sol_to_lamports(-1.0).is_err());
        assert!(sol_to_lamports(f64::NAN).is_err());
        assert_eq!(lamports_to_sol(250_000_000), 0.25);
    }

    #[test]
    fn test_load_keypair() {
        let keypair = Keypair::new();
        let path = std::env::temp_dir().join(format!("squads-keypair-{}.json", keypair.pubkey()));
        write_keypair_file(&keypair, &path).unwrap();

        let loaded = load_keypair(&path).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());

        std::fs::remove_file(&path).unwrap();
        let err = load_keypair(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read keypair"));
    }

    #[test]
    fn test_transaction_logs_absent() {
        assert!(transaction_logs(&anyhow!("plain error")).is_none());
        let client_err = ClientError::from(ClientErrorKind::Custom("boom".to_string()));
        assert!(transaction_logs(&anyhow::Error::from(client_err)).is_none());
    }

    #[test]
    fn test_transaction_logs_from_preflight_failure() {
        let logs = vec![
            "Program SQDS4ep65T869zMMBKyuUq6aD6EgTu8psMjkvj52pCf invoke [1]".to_string(),
            "Program log: AnchorError occurred. Error Code: NotAMember.".to_string(),
        ];
        let result: RpcSimulateTransactionResult =
            serde_json::from_value(serde_json::json!({ "logs": logs })).unwrap();
        let client_err = ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code: -32002,
            message: "Transaction simulation failed".to_string(),
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
        }));

        let err = Err::<(), _>(client_err)
            .context("Step 1: Creating vault transaction failed")
            .unwrap_err();
        assert_eq!(transaction_logs(&err), Some(logs));
    }
}
