//! Arbitrum bridge contract ABI definitions
//!
//! Only the entry points needed to build deposits, withdrawals and
//! approvals, and to answer the token gateway queries.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    /// Delayed inbox on the parent chain
    #[sol(rpc)]
    contract IInbox {
        function depositEth() external payable returns (uint256);

        function createRetryableTicket(
            address to,
            uint256 l2CallValue,
            uint256 maxSubmissionCost,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes data
        ) external payable returns (uint256);

        /// `baseFee == 0` means use the current block base fee
        function calculateRetryableSubmissionFee(uint256 dataLength, uint256 baseFee) external view returns (uint256);
    }
}

sol! {
    /// ArbSys precompile on the child chain
    #[sol(rpc)]
    contract IArbSys {
        function withdrawEth(address destination) external payable returns (uint256);
    }
}

sol! {
    /// NodeInterface virtual contract on the child chain; only usable via eth_estimateGas
    #[sol(rpc)]
    contract INodeInterface {
        function estimateRetryableTicket(
            address sender,
            uint256 deposit,
            address to,
            uint256 l2CallValue,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            bytes data
        ) external;
    }
}

sol! {
    #[sol(rpc)]
    contract IL1GatewayRouter {
        function getGateway(address token) external view returns (address);

        /// Explicit per-token assignment; `address(1)` marks a disabled token
        function l1TokenToGateway(address token) external view returns (address);

        function calculateL2TokenAddress(address l1Token) external view returns (address);

        function outboundTransferCustomRefund(
            address token,
            address refundTo,
            address to,
            uint256 amount,
            uint256 maxGas,
            uint256 gasPriceBid,
            bytes data
        ) external payable returns (bytes);
    }
}

sol! {
    #[sol(rpc)]
    contract IL1Gateway {
        function counterpartGateway() external view returns (address);

        function getOutboundCalldata(
            address token,
            address from,
            address to,
            uint256 amount,
            bytes data
        ) external view returns (bytes);
    }
}

sol! {
    #[sol(rpc)]
    contract IL2GatewayRouter {
        function getGateway(address token) external view returns (address);

        function outboundTransfer(address l1Token, address to, uint256 amount, bytes data) external payable returns (bytes);
    }
}

sol! {
    #[sol(rpc)]
    contract IL2Gateway {
        function calculateL2TokenAddress(address l1Token) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    contract IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
