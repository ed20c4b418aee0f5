//! Pallets and storage entries that moved between runtime versions, resolved in one place.

use super::block::RuntimeSpec;

/// A spec-name and version window. `chains: None` matches chains not named by any other rule.
struct SpecRule {
    chains: Option<&'static [&'static str]>,
    min: u32,
    max: u32,
}

const KNOWN_CHAINS: &[&str] = &["polkadot", "kusama", "edgeware"];

const fn rule(chains: &'static [&'static str], min: u32, max: u32) -> SpecRule {
    SpecRule {
        chains: Some(chains),
        min,
        max,
    }
}

const OTHER_CHAINS: SpecRule = SpecRule {
    chains: None,
    min: 0,
    max: u32::MAX,
};

impl SpecRule {
    fn matches(&self, spec: &RuntimeSpec) -> bool {
        let chain_matches = match self.chains {
            Some(chains) => chains.contains(&spec.name.as_str()),
            None => !KNOWN_CHAINS.contains(&spec.name.as_str()),
        };
        chain_matches && spec.version >= self.min && spec.version < self.max
    }
}

/// Candidate pallets for the phragmen elections module, tried in order.
const ELECTIONS: &[(&str, &[SpecRule])] = &[
    (
        "PhragmenElection",
        &[rule(&["polkadot", "kusama"], 9090, u32::MAX), OTHER_CHAINS],
    ),
    (
        "ElectionsPhragmen",
        &[
            rule(&["edgeware"], 0, u32::MAX),
            rule(&["polkadot", "kusama"], 0, 9090),
            OTHER_CHAINS,
        ],
    ),
    ("Elections", &[rule(KNOWN_CHAINS, 0, u32::MAX), OTHER_CHAINS]),
];

const ERAS_STAKERS: &[SpecRule] = &[
    rule(&["polkadot", "kusama"], 1050, u32::MAX),
    rule(&["edgeware"], 31, u32::MAX),
];

const TREASURY_MINTING_V2: &[SpecRule] = &[rule(&["edgeware"], 34, u32::MAX)];

/// Where validator exposures live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureStorage {
    /// `Staking.ErasStakers(era, validator)`
    ErasStakers,
    /// `Staking.Stakers(validator)`
    Stakers,
}

/// Version-dependent pallet and storage paths for one runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub spec: RuntimeSpec,
    pub elections: Option<String>,
    pub exposures: ExposureStorage,
    pub treasury_minting_v2: bool,
    pub tips: String,
    pub bounties: String,
}

impl RuntimePaths {
    /// `has_pallet` and `has_storage` probe the runtime metadata.
    pub fn resolve(
        spec: &RuntimeSpec,
        has_pallet: impl Fn(&str) -> bool,
        has_storage: impl Fn(&str, &str) -> bool,
    ) -> Self {
        let elections = ELECTIONS
            .iter()
            .find(|(pallet, rules)| rules.iter().any(|r| r.matches(spec)) && has_pallet(pallet))
            .map(|(pallet, _)| pallet.to_string());

        let eras_stakers = if KNOWN_CHAINS.contains(&spec.name.as_str()) {
            ERAS_STAKERS.iter().any(|r| r.matches(spec))
        } else {
            has_storage("Staking", "ErasStakers")
        };

        let fallback = |pallet: &str| {
            if has_pallet(pallet) {
                pallet.to_string()
            } else {
                "Treasury".to_string()
            }
        };

        Self {
            spec: spec.clone(),
            elections,
            exposures: if eras_stakers {
                ExposureStorage::ErasStakers
            } else {
                ExposureStorage::Stakers
            },
            treasury_minting_v2: TREASURY_MINTING_V2.iter().any(|r| r.matches(spec)),
            tips: fallback("Tips"),
            bounties: fallback("Bounties"),
        }
    }

    pub fn is_elections(&self, section: &str) -> bool {
        self.elections.as_deref() == Some(section)
    }

    pub fn is_tips(&self, section: &str) -> bool {
        self.tips == section
    }

    pub fn is_bounties(&self, section: &str) -> bool {
        self.bounties == section
    }
}
