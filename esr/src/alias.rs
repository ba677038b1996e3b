//! Well-known chain aliases.
//!
//! Signing requests may name their chain by a one-byte alias instead of
//! the full 32-byte checksum. The table below mirrors the alias registry
//! shipped with the signing-request protocol; alias 0 is reserved.

use pangea_types::AntelopeChainId;

use crate::error::EsrError;

/// Alias number to chain id, as registered by the protocol.
pub const CHAIN_ALIASES: &[(u8, &str)] = &[
    (1, "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906"), // EOS
    (2, "4667b205c6838ef70ff7988f6e8257e8be0e1284a2f59699054a018f743b1d11"), // Telos
    (3, "e70aaab8997e1dfce58fbfac80cbbb8fecec7b99cf982a9444273cbc64c41473"), // Jungle
    (4, "5fff1dae8dc8e2fc4d5b23b2c7665c97f9e9d8edf2b6485a86ba311c25639191"), // Kylin
    (5, "73647cde120091e0a4b85bced2f3cfdb3041e266cbbe95cee59b73235a1b3b6f"), // WORBLI
    (6, "d5a3d18fbb3c084e3b1f3fa98c21014b5f3db536cc15d08f9f6479517c6a3d86"), // BOS
    (7, "cfe6486a83bad4962f232d48003b1824ab5665c36778141034d75e57b956e422"), // MEET.ONE
    (8, "b042025541e25a472bffde2d62edd457b7e70cee943412b1ea0f044f88591664"), // Insights
    (9, "b912d19a6abd2b1b05611ae5be473355d64d95aeff0c09bedc8c166cd6468fe4"), // BEOS
    (10, "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4"), // WAX
    (11, "384da888112027f0321850a169f737c33e53b388aad48b5adace4bab97f437e0"), // Proton
    (12, "21dcae42c0182200e93f954a074011f9048a7624c6fe81d3c9541a614a88bd1c"), // FIO
];

/// Resolve an alias to its chain id.
pub fn chain_id_for_alias(alias: u8) -> Result<AntelopeChainId, EsrError> {
    let (_, hex_id) = CHAIN_ALIASES
        .iter()
        .find(|(a, _)| *a == alias)
        .ok_or(EsrError::UnknownChainAlias(alias))?;
    Ok(hex_id.parse()?)
}

/// The alias for a chain id, when it has one.
pub fn alias_for_chain_id(id: &AntelopeChainId) -> Option<u8> {
    let hex_id = id.to_string();
    CHAIN_ALIASES
        .iter()
        .find(|(_, h)| *h == hex_id)
        .map(|(a, _)| *a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_resolve() {
        let eos = chain_id_for_alias(1).unwrap();
        assert_eq!(
            eos.to_string(),
            "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906"
        );
        assert_eq!(alias_for_chain_id(&eos), Some(1));

        let wax = chain_id_for_alias(10).unwrap();
        assert_eq!(alias_for_chain_id(&wax), Some(10));
    }

    #[test]
    fn reserved_and_unknown_aliases_are_errors() {
        assert!(matches!(
            chain_id_for_alias(0),
            Err(EsrError::UnknownChainAlias(0))
        ));
        assert!(matches!(
            chain_id_for_alias(200),
            Err(EsrError::UnknownChainAlias(200))
        ));
    }

    #[test]
    fn unlisted_chain_has_no_alias() {
        let pangea: AntelopeChainId =
            "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
                .parse()
                .unwrap();
        assert_eq!(alias_for_chain_id(&pangea), None);
    }
}
