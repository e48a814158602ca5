use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unknown {family} category {token:?}; extend the alias table or the {family} enum")]
    UnknownCategory {
        token: String,
        family: CategoryFamily,
    },
    #[error("invalid datecreated value {value:?}; expected MM/DD/YYYY HH:MM AM|PM")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CategoryFamily {
    Blockchain,
    Web3,
    Topic,
    ImpactArea,
}

impl CategoryFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blockchain => "Blockchain",
            Self::Web3 => "Web3",
            Self::Topic => "Topic",
            Self::ImpactArea => "ImpactArea",
        }
    }
}

impl fmt::Display for CategoryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares a closed categorical family. Variants serialize under their
/// canonical label, which is also the only spelling accepted by `from_name`.
macro_rules! category_enum {
    ($name:ident, $family:expr, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            #[cfg(test)]
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Category for $name {
            const FAMILY: CategoryFamily = $family;

            fn from_name(name: &str) -> Option<Self> {
                $name::from_name(name)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub trait Category: Copy + Ord {
    const FAMILY: CategoryFamily;

    fn from_name(name: &str) -> Option<Self>;
}

category_enum!(Blockchain, CategoryFamily::Blockchain, {
    Ethereum => "Ethereum",
    Polygon => "Polygon",
    Celo => "Celo",
    Cosmos => "Cosmos",
    Near => "Near",
    Hedera => "Hedera",
    Tezos => "Tezos",
    Cardano => "Cardano",
    Solana => "Solana",
    BinanceSmartChain => "BinanceSmartChain",
    Algorand => "Algorand",
    Bitcoin => "Bitcoin",
    RegenNetwork => "RegenNetwork",
    EnergyWebChain => "EnergyWebChain",
    Chia => "Chia",
    Polkadot => "Polkadot",
    Kusama => "Kusama",
    HyperledgerFabric => "HyperledgerFabric",
    Stellar => "Stellar",
    Gnosis => "Gnosis",
    Ixo => "ixo",
    Juno => "Juno",
    Avalanche => "Avalanche",
    Optimism => "Optimism",
    Powerledger => "Powerledger",
    Eos => "EOS",
    VeChain => "VeChain",
    Fantom => "Fantom",
    Harmony => "Harmony",
    Arbitrum => "Arbitrum",
    Stargaze => "Stargaze",
    Iota => "IOTA",
    Chainlink => "Chainlink",
    EverGreen => "EverGreen",
    Nano => "NANO",
    Other => "Other",
    Telos => "Telos",
    Xels => "XELS",
    ZeroCarbon => "ZeroCarbon",
    Topl => "Topl",
    Hbar => "HBAR",
});

category_enum!(Web3, CategoryFamily::Web3, {
    Blockchain => "Blockchain",
    DApp => "dApp",
    Token => "Token",
    Nft => "NFT",
    Dao => "DAO",
    Wallet => "Wallet",
    Exchange => "Exchange",
    Metaverse => "Metaverse",
    Oracle => "Oracle",
    Infrastructure => "Infrastructure",
    Education => "Education",
    Stablecoin => "Stablecoin",
    Identity => "Identity",
    Validator => "Validator",
    Community => "Community",
    Solutions => "Solutions",
    DeFi => "DeFi",
    Marketplace => "Marketplace",
    Bridge => "Bridge",
    Dex => "DEX",
    Other => "Other",
});

category_enum!(ImpactArea, CategoryFamily::ImpactArea, {
    SocialJustice => "SocialJustice",
    Carbon => "Carbon",
    Energy => "Energy",
    Nature => "Nature",
    Investing => "Investing",
    Industry => "Industry",
    SocialJusticeLegacy => "Social_Justice",
    Social => "Social",
    Infrastructure => "Infrastructure",
    FoodAg => "FoodAg",
    PoliticsActivism => "Politicsactivism",
    Innovation => "Innovation",
    Education => "Education",
    Health => "Health",
    Other => "Other",
});

category_enum!(Topic, CategoryFamily::Topic, {
    Gaming => "Gaming",
    Marketplace => "Marketplace",
    Art => "Art",
    Initiative => "Initiative",
    Fundraising => "Fundraising",
    Legal => "Legal",
    Media => "Media",
    Charity => "Charity",
    Identity => "Identity",
    Currency => "Currency",
    Local => "Local",
    Biodiversity => "Biodiversity",
    Water => "Water",
    Ocean => "Ocean",
    Land => "Land",
    Renewables => "Renewables",
    Mrv => "MRV",
    Finance => "Finance",
    Offsetting => "Offsetting",
    Accounting => "Accounting",
    Data => "Data",
    Commodities => "Commodities",
    Payments => "Payments",
    Vc => "VC",
    Mining => "Mining",
    MoveToEarn => "Movetoearn",
    Recycling => "Recycling",
    Governance => "Governance",
    Women => "Women",
    Work => "Work",
    Space => "Space",
    Traceability => "Traceability",
    Affordability => "Affordability",
    Reforestation => "Reforestation",
    DeSci => "DeSci",
    FinancialInclusion => "Financial_Inclusion",
    Investing => "Investing",
    Ai => "AI",
    Community => "Community",
    Consulting => "Consulting",
    Reward => "Reward",
    InclusionEquality => "inclusionequality",
    CircularEconomy => "CircularEconomy",
    SupplyChain => "SupplyChain",
    Trading => "Trading",
    Animals => "Animals",
    Forestry => "Forestry",
    FoodForests => "FoodForests",
    Agriculture => "Agriculture",
    Staking => "Staking",
    Fitness => "Fitness",
    Waste => "waste",
    Medicine => "Medicine",
    Loneliness => "Loneliness",
    Ubi => "UBI",
    Energy => "Energy",
    Meteorology => "Meteorology",
    Other => "Other",
    IoT => "IoT",
    EcoLiving => "EcoLiving",
});

/// What a raw label means for one family before exact-name lookup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AliasTarget<T> {
    Member(T),
    /// Stops parsing of the rest of the cell. Rows carrying "Not applicable"
    /// historically lost every blockchain listed after it; kept until the data
    /// owner confirms the intent.
    AbortRemaining,
}

const BLOCKCHAIN_ALIASES: &[(&str, AliasTarget<Blockchain>)] = &[
    ("Binance Smart Chain", AliasTarget::Member(Blockchain::BinanceSmartChain)),
    ("Regen Network", AliasTarget::Member(Blockchain::RegenNetwork)),
    ("Energy Web Chain", AliasTarget::Member(Blockchain::EnergyWebChain)),
    ("Hyperledger Fabric", AliasTarget::Member(Blockchain::HyperledgerFabric)),
    ("Zero Carbon", AliasTarget::Member(Blockchain::ZeroCarbon)),
    ("IXO", AliasTarget::Member(Blockchain::Ixo)),
    ("Not found", AliasTarget::Member(Blockchain::Other)),
    ("Not sure / still deciding", AliasTarget::Member(Blockchain::Other)),
    ("Not applicable", AliasTarget::AbortRemaining),
];

// "Blockchain (L1" is what survives quote stripping of a truncated
// "Blockchain (L1,DAO" cell.
const WEB3_ALIASES: &[(&str, AliasTarget<Web3>)] = &[
    ("Blockchain (L1, L2)", AliasTarget::Member(Web3::Blockchain)),
    ("Blockchain (L1,L2)", AliasTarget::Member(Web3::Blockchain)),
    ("Blockchain (L1", AliasTarget::Member(Web3::Blockchain)),
];

// "Invest" and "Politics & activism" are crossed in the historical table and
// existing stored data depends on it.
const IMPACT_AREA_ALIASES: &[(&str, AliasTarget<ImpactArea>)] = &[
    ("Social justice", AliasTarget::Member(ImpactArea::SocialJustice)),
    ("Food & Agriculture", AliasTarget::Member(ImpactArea::FoodAg)),
    ("Food & Ag.", AliasTarget::Member(ImpactArea::FoodAg)),
    ("Invest", AliasTarget::Member(ImpactArea::PoliticsActivism)),
    ("Politics & activism", AliasTarget::Member(ImpactArea::Investing)),
    ("Innovate", AliasTarget::Member(ImpactArea::Innovation)),
];

const TOPIC_ALIASES: &[(&str, AliasTarget<Topic>)] = &[
    ("inclusion and equality", AliasTarget::Member(Topic::InclusionEquality)),
    ("Circular Economy", AliasTarget::Member(Topic::CircularEconomy)),
    ("Financial Inclusion", AliasTarget::Member(Topic::FinancialInclusion)),
    ("origin & trace", AliasTarget::Member(Topic::Traceability)),
    ("Supply Chain", AliasTarget::Member(Topic::SupplyChain)),
    ("Move-to-earn", AliasTarget::Member(Topic::MoveToEarn)),
    ("Work & Business", AliasTarget::Member(Topic::Work)),
    ("Food Forests", AliasTarget::Member(Topic::FoodForests)),
    ("Eco-Living", AliasTarget::Member(Topic::EcoLiving)),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SplitRule {
    EveryComma,
    /// A comma followed by a `)` before any `(` belongs to a parenthesized label.
    OutsideParentheses,
}

/// Per-family resolution rules: an alias table and how the cell is split.
pub trait Resolvable: Category + 'static {
    const ALIASES: &'static [(&'static str, AliasTarget<Self>)];
    const SPLIT_RULE: SplitRule;
}

impl Resolvable for Blockchain {
    const ALIASES: &'static [(&'static str, AliasTarget<Self>)] = BLOCKCHAIN_ALIASES;
    const SPLIT_RULE: SplitRule = SplitRule::EveryComma;
}

impl Resolvable for Web3 {
    const ALIASES: &'static [(&'static str, AliasTarget<Self>)] = WEB3_ALIASES;
    const SPLIT_RULE: SplitRule = SplitRule::OutsideParentheses;
}

impl Resolvable for ImpactArea {
    const ALIASES: &'static [(&'static str, AliasTarget<Self>)] = IMPACT_AREA_ALIASES;
    const SPLIT_RULE: SplitRule = SplitRule::EveryComma;
}

impl Resolvable for Topic {
    const ALIASES: &'static [(&'static str, AliasTarget<Self>)] = TOPIC_ALIASES;
    const SPLIT_RULE: SplitRule = SplitRule::EveryComma;
}

/// Resolves one raw cell such as `{"Food & Ag.",Carbon}` into canonical members.
///
/// The result may be empty; callers decide whether an empty set is stored.
pub fn resolve_cell<T: Resolvable>(raw: &str) -> Result<BTreeSet<T>, NormalizeError> {
    let mut members = BTreeSet::new();
    let body = raw.trim_matches(['{', '}']);

    for token in split_cell(body, T::SPLIT_RULE) {
        let token = clean_token(token);
        if token.is_empty() {
            continue;
        }

        match lookup_alias::<T>(token) {
            Some(AliasTarget::Member(member)) => {
                members.insert(member);
            }
            Some(AliasTarget::AbortRemaining) => break,
            None => {
                let member = T::from_name(token).ok_or_else(|| NormalizeError::UnknownCategory {
                    token: token.to_string(),
                    family: T::FAMILY,
                })?;
                members.insert(member);
            }
        }
    }

    Ok(members)
}

fn lookup_alias<T: Resolvable>(token: &str) -> Option<AliasTarget<T>> {
    T::ALIASES
        .iter()
        .find(|(label, _)| *label == token)
        .map(|(_, target)| *target)
}

fn clean_token(token: &str) -> &str {
    let token = token.trim();
    let token = token.strip_prefix('"').unwrap_or(token);
    token.strip_suffix('"').unwrap_or(token)
}

fn split_cell(body: &str, rule: SplitRule) -> Vec<&str> {
    match rule {
        SplitRule::EveryComma => body.split(',').collect(),
        SplitRule::OutsideParentheses => split_outside_parentheses(body),
    }
}

fn split_outside_parentheses(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (idx, ch) in body.char_indices() {
        if ch != ',' {
            continue;
        }
        if closes_before_opening(&body[idx + 1..]) {
            continue;
        }
        parts.push(&body[start..idx]);
        start = idx + 1;
    }

    parts.push(&body[start..]);
    parts
}

fn closes_before_opening(rest: &str) -> bool {
    for ch in rest.chars() {
        match ch {
            '(' => return false,
            ')' => return true,
            _ => {}
        }
    }
    false
}
