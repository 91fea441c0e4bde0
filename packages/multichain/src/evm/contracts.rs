//! EVM contract ABI definitions.
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the CCTP
//! TokenMessenger entry point and the minimal ERC-20 surface the bridge
//! needs (allowance management on the burn token).

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    /// Circle CCTP v1 TokenMessenger interface (burn leg only).
    #[sol(rpc)]
    contract TokenMessenger {
        /// Burns `amount` of `burnToken` and emits a message minting to
        /// `mintRecipient` on `destinationDomain`.
        function depositForBurn(
            uint256 amount,
            uint32 destinationDomain,
            bytes32 mintRecipient,
            address burnToken
        ) external returns (uint64 nonce);
    }

    /// Minimal ERC-20 surface for allowance management.
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);

        function approve(address spender, uint256 amount) external returns (bool);

        function balanceOf(address account) external view returns (uint256);
    }
}
