//! Emitter chain identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source chain identifier as carried in the VAA body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u16);

impl ChainId {
    pub const UNSET: ChainId = ChainId(0);
    pub const SOLANA: ChainId = ChainId(1);
    pub const ETHEREUM: ChainId = ChainId(2);
    pub const TERRA: ChainId = ChainId(3);
    pub const BSC: ChainId = ChainId(4);
    pub const POLYGON: ChainId = ChainId(5);
    pub const AVALANCHE: ChainId = ChainId(6);
    pub const OASIS: ChainId = ChainId(7);
    pub const ALGORAND: ChainId = ChainId(8);
    pub const AURORA: ChainId = ChainId(9);
    pub const FANTOM: ChainId = ChainId(10);

    /// Well-known name, if any.
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            ChainId::UNSET => "unset",
            ChainId::SOLANA => "solana",
            ChainId::ETHEREUM => "ethereum",
            ChainId::TERRA => "terra",
            ChainId::BSC => "bsc",
            ChainId::POLYGON => "polygon",
            ChainId::AVALANCHE => "avalanche",
            ChainId::OASIS => "oasis",
            ChainId::ALGORAND => "algorand",
            ChainId::AURORA => "aurora",
            ChainId::FANTOM => "fantom",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown chain ID: {}", self.0),
        }
    }
}

impl From<u16> for ChainId {
    fn from(id: u16) -> Self {
        ChainId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(ChainId::SOLANA.to_string(), "solana");
        assert_eq!(ChainId::from(2).to_string(), "ethereum");
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(ChainId(4242).name(), None);
        assert_eq!(ChainId(4242).to_string(), "unknown chain ID: 4242");
    }
}
