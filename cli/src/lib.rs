pub mod commands;
pub mod tx_utils;
