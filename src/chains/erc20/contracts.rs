use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::chains::evm::WsProvider;
use crate::error::Result;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function totalSupply() external view returns (uint256);
    }
}

pub use IERC20::{Approval, Transfer};

pub fn event_name(topic0: &B256) -> Option<&'static str> {
    let name = match *topic0 {
        t if t == Transfer::SIGNATURE_HASH => "Transfer",
        t if t == Approval::SIGNATURE_HASH => "Approval",
        _ => return None,
    };
    Some(name)
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Erc20Api: Send + Sync {
    async fn total_supply(&self, token: Address) -> Result<U256>;
}

pub struct Erc20Contracts {
    provider: Arc<WsProvider>,
}

impl Erc20Contracts {
    pub fn new(provider: Arc<WsProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Erc20Api for Erc20Contracts {
    async fn total_supply(&self, token: Address) -> Result<U256> {
        let erc20 = IERC20::new(token, self.provider.clone());
        Ok(erc20.totalSupply().call().await?._0)
    }
}
