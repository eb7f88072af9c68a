//! The closed set of registered schema names
//!
//! `SchemaName` mirrors `generated/manifest.json` entry for entry and in the same
//! order. The embedded catalog refuses to load if the two ever diverge, so a
//! schema added to `schemas/` needs a regenerated manifest and a variant here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

macro_rules! schema_names {
    ($($variant:ident),+ $(,)?) => {
        /// A schema registered in the embedded catalog
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum SchemaName {
            $($variant,)+
        }

        impl SchemaName {
            /// Every registered name, in registry order
            pub const ALL: &'static [SchemaName] = &[$(SchemaName::$variant,)+];

            /// The registry key
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(SchemaName::$variant => stringify!($variant),)+
                }
            }
        }

        impl FromStr for SchemaName {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(SchemaName::$variant),)+
                    _ => Err(CatalogError::not_found(s)),
                }
            }
        }
    };
}

schema_names! {
    // credentials
    ContentAuthenticityCredential,
    MembershipCredential,
    ProofOfPersonhood,
    TrustScore,
    VerifiableCredential,
    // governance
    DataSharingAgreement,
    GovernanceProposal,
    GovernanceVote,
    RevenueDistributionAgreement,
    VaultGovernanceAgreement,
    // nodes
    ClusterDeclaration,
    NodeCapabilities,
    NodeDeclaration,
    NodeHeartbeat,
    // roles
    Admin,
    Developer,
    Moderator,
    Publisher,
    // tooling
    EditorConfig,
    PluginManifest,
    WorkspaceSettings,
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_round_trip_through_str() {
        for name in SchemaName::ALL {
            assert_eq!(name.as_str().parse::<SchemaName>().unwrap(), *name);
        }
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let err = "NotARealSchema".parse::<SchemaName>().unwrap_err();
        assert!(err.is_not_found());
        assert!("admin".parse::<SchemaName>().is_err());
    }

    #[test]
    fn test_names_are_unique() {
        let unique: HashSet<_> = SchemaName::ALL.iter().map(|n| n.as_str()).collect();
        assert_eq!(unique.len(), SchemaName::ALL.len());
    }

    #[test]
    fn test_serde_uses_plain_name() {
        assert_eq!(serde_json::to_string(&SchemaName::TrustScore).unwrap(), "\"TrustScore\"");
        let name: SchemaName = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(name, SchemaName::Admin);
    }
}
