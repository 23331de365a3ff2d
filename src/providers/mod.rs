pub mod alidns;

pub use alidns::AliDnsClient;
