//! Definitions of Solidity functions called while publishing a release

use alloy_sol_types::sol;

sol! {
    // FundDeployer
    function setReleaseLive() external;
    function getReleaseIsLive() external view returns (bool isLive);

    // ExternalPositionFactory
    function addPositionDeployers(address[] memory accounts) external;
    function addNewPositionTypes(string[] memory labels) external;
    function getPositionTypeCounter() external view returns (uint256 counter);
    function getLabelForPositionType(uint256 typeId) external view returns (string memory label);

    // ExternalPositionManager
    function updateExternalPositionTypesInfo(uint256[] memory typeIds, address[] memory libs, address[] memory parsers) external;

    // Dispatcher
    function setCurrentFundDeployer(address nextFundDeployer) external;
}
