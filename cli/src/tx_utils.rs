use anyhow::Result;
use solana_sdk::signature::Signature;
use squads_multisig_sdk::utils::transaction_logs;
use std::future::Future;

/// Runs one pipeline step, narrating it before and after confirmation.
pub async fn step<F>(title: &str, done: &str, submit: F) -> Result<Signature>
where
    F: Future<Output = Result<Signature>>,
{
    println!("\n{title}...");
    let signature = submit.await?;
    println!("{done}: {signature}");
    Ok(signature)
}

/// Prints an error with its causes and any program logs the node attached.
pub fn report_error(err: &anyhow::Error) {
    eprintln!("\nError: {err:#}");
    if let Some(logs) = transaction_logs(err) {
        eprintln!("Logs:");
        for line in logs {
            eprintln!("  {line}");
        }
    }
}
