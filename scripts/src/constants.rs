//! Constants used in the deploy scripts

/// The chain ID of Ethereum mainnet
pub const MAINNET_CHAIN_ID: u64 = 1;

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The dispatcher contract key in the `deployments.json` file
pub const DISPATCHER_KEY: &str = "Dispatcher";

/// The fund deployer contract key in the `deployments.json` file
pub const FUND_DEPLOYER_KEY: &str = "FundDeployer";

/// The external position factory contract key in the `deployments.json` file
pub const EXTERNAL_POSITION_FACTORY_KEY: &str = "ExternalPositionFactory";

/// The external position manager contract key in the `deployments.json` file
pub const EXTERNAL_POSITION_MANAGER_KEY: &str = "ExternalPositionManager";

/// The Compound debt position library contract key in the `deployments.json` file
pub const COMPOUND_DEBT_POSITION_LIB_KEY: &str = "CompoundDebtPositionLib";

/// The Compound debt position parser contract key in the `deployments.json` file
pub const COMPOUND_DEBT_POSITION_PARSER_KEY: &str = "CompoundDebtPositionParser";

/// The Uniswap V3 liquidity position library contract key in the `deployments.json` file
pub const UNISWAP_V3_LIQUIDITY_POSITION_LIB_KEY: &str = "UniswapV3LiquidityPositionLib";

/// The Uniswap V3 liquidity position parser contract key in the `deployments.json` file
pub const UNISWAP_V3_LIQUIDITY_POSITION_PARSER_KEY: &str = "UniswapV3LiquidityPositionParser";

/// The name of the wiring step that publishes the release
pub const PUBLISH_RELEASE_STEP: &str = "PublishRelease";

/// The position type label for Compound debt positions
pub const COMPOUND_DEBT_LABEL: &str = "COMPOUND_DEBT";

/// The position type label for Uniswap V3 liquidity positions
pub const UNISWAP_V3_LIQUIDITY_LABEL: &str = "UNISWAP_V3_LIQUIDITY";

/// A declared external position type: a stable label together with the
/// step names of its library and parser contracts.
///
/// Declaration order here fixes the order in which present types are
/// registered on the factory; the assigned type IDs are nonetheless
/// always looked up by label afterwards, never assumed from position.
#[derive(Clone, Copy, Debug)]
pub struct PositionTypeDescriptor {
    /// The stable position type label registered on the factory
    pub label: &'static str,
    /// The step name of the position's library contract
    pub lib_step: &'static str,
    /// The step name of the position's parser contract
    pub parser_step: &'static str,
}

/// The external position types declared for this release, in
/// registration order
pub const DECLARED_POSITION_TYPES: [PositionTypeDescriptor; 2] = [
    PositionTypeDescriptor {
        label: COMPOUND_DEBT_LABEL,
        lib_step: COMPOUND_DEBT_POSITION_LIB_KEY,
        parser_step: COMPOUND_DEBT_POSITION_PARSER_KEY,
    },
    PositionTypeDescriptor {
        label: UNISWAP_V3_LIQUIDITY_LABEL,
        lib_step: UNISWAP_V3_LIQUIDITY_POSITION_LIB_KEY,
        parser_step: UNISWAP_V3_LIQUIDITY_POSITION_PARSER_KEY,
    },
];

/// The file extension of a compilation artifact
pub const ARTIFACT_EXTENSION: &str = "json";
