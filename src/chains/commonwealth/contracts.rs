use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::chains::evm::{to_u64, WsProvider};
use crate::error::{ChainEventsError, Result};

sol! {
    #[sol(rpc)]
    interface IProjectFactory {
        event ProjectCreated(uint256 index, address project);

        function numProjects() external view returns (uint32);
        function projects(uint32 index) external view returns (address);
    }

    #[sol(rpc)]
    interface ICuratedProject {
        event Back(address indexed sender, address indexed token, uint256 amount);
        event Curate(address indexed sender, address indexed token, uint256 amount);
        event Succeeded(uint256 timestamp, uint256 amount);
        event Failed();
        event Withdraw(address indexed sender, address indexed token, uint256 amount, bytes32 withdrawalType);

        function metaData() external view returns (bytes32 name, bytes32 ipfsHash, bytes32 url, address creator);
        function projectData() external view returns (uint256 threshold, uint256 deadline, address beneficiary, address acceptedToken);
        function curatorFee() external view returns (uint256);
        function totalFunding() external view returns (uint256);
        function funded() external view returns (bool);
    }
}

pub use ICuratedProject::{Back, Curate, Failed, Succeeded, Withdraw};
pub use IProjectFactory::ProjectCreated;

pub fn event_name(topic0: &B256) -> Option<&'static str> {
    let name = match *topic0 {
        t if t == ProjectCreated::SIGNATURE_HASH => "ProjectCreated",
        t if t == Back::SIGNATURE_HASH => "Back",
        t if t == Curate::SIGNATURE_HASH => "Curate",
        t if t == Succeeded::SIGNATURE_HASH => "Succeeded",
        t if t == Failed::SIGNATURE_HASH => "Failed",
        t if t == Withdraw::SIGNATURE_HASH => "Withdraw",
        _ => return None,
    };
    Some(name)
}

/// Zero-padded `bytes32` text, as written by `formatBytes32String`.
pub fn bytes32_string(value: &B256) -> String {
    let end = value.iter().position(|b| *b == 0).unwrap_or(32);
    String::from_utf8_lossy(&value[..end]).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub ipfs_hash: String,
    pub cw_url: String,
    pub creator: Address,
    pub beneficiary: Address,
    pub accepted_token: Address,
    pub curator_fee: U256,
    pub threshold: U256,
    pub deadline: u64,
    pub total_funding: U256,
    pub funded: bool,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommonwealthApi: Send + Sync {
    async fn project_count(&self) -> Result<u64>;

    async fn project_address(&self, index: u64) -> Result<Address>;

    async fn project(&self, address: Address) -> Result<ProjectInfo>;
}

pub struct CommonwealthContracts {
    factory: Address,
    provider: Arc<WsProvider>,
}

impl CommonwealthContracts {
    pub fn new(factory: Address, provider: Arc<WsProvider>) -> Self {
        Self { factory, provider }
    }
}

#[async_trait]
impl CommonwealthApi for CommonwealthContracts {
    async fn project_count(&self) -> Result<u64> {
        let factory = IProjectFactory::new(self.factory, self.provider.clone());
        Ok(u64::from(factory.numProjects().call().await?._0))
    }

    async fn project_address(&self, index: u64) -> Result<Address> {
        let factory = IProjectFactory::new(self.factory, self.provider.clone());
        let index = u32::try_from(index)
            .map_err(|_| ChainEventsError::decode(format!("project index {index} out of range")))?;
        Ok(factory.projects(index).call().await?._0)
    }

    async fn project(&self, address: Address) -> Result<ProjectInfo> {
        let project = ICuratedProject::new(address, self.provider.clone());
        let meta = project.metaData().call().await?;
        let data = project.projectData().call().await?;
        let curator_fee = project.curatorFee().call().await?._0;
        let total_funding = project.totalFunding().call().await?._0;
        let funded = project.funded().call().await?._0;
        Ok(ProjectInfo {
            name: bytes32_string(&meta.name),
            ipfs_hash: bytes32_string(&meta.ipfsHash),
            cw_url: bytes32_string(&meta.url),
            creator: meta.creator,
            beneficiary: data.beneficiary,
            accepted_token: data.acceptedToken,
            curator_fee,
            threshold: data.threshold,
            deadline: to_u64(data.deadline, "deadline")?,
            total_funding,
            funded,
        })
    }
}
