//! Typed wrappers over [crate::contract::ContractClient], one per deployed contract
pub mod option;
pub mod oracle;

pub use option::{
    option_type, Listing, MarkToMarket, OptionContract, OptionDef, Side, TimeBound,
    TimeBoundKind, TradeOrder,
};
pub use oracle::{OracleContract, PriceUpdate};
