pub mod info;
pub mod withdraw;

/// Multisig queried when no address is given on the command line.
pub const DEFAULT_MULTISIG: &str = "5cSM7kjqnKcSvYkhzNiLx65RvX3oi3VYKuZ4pwqSjBHk";
