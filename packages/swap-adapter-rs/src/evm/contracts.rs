//! Swap adapter and ERC20 ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings.

use alloy::sol;

sol! {
    /// Uniform adapter interface shared by every pool-specific adapter
    #[sol(rpc)]
    contract IAdapter {
        // ========================================================================
        // Pool Registration
        // ========================================================================

        /// Underlying pool the adapter routes through
        function pool() external view returns (address);

        /// Whether `token` is one of the pool's tokens
        function isPoolToken(address token) external view returns (bool);

        /// Position of `token` inside the pool
        function tokenIndex(address token) external view returns (uint256);

        // ========================================================================
        // Swaps
        // ========================================================================

        /// Address the input tokens must be sent to before `swap`
        function depositAddress(address tokenIn, address tokenOut) external view returns (address);

        /// Estimated output for `amountIn`, computed without mutating state
        function query(uint256 amountIn, address tokenIn, address tokenOut) external view returns (uint256);

        /// Swap previously deposited `amountIn` and send the output to `to`
        function swap(uint256 amountIn, address tokenIn, address tokenOut, address to) external returns (uint256);

        // ========================================================================
        // Recovery (owner only)
        // ========================================================================

        function recoverERC20(address token, uint256 amount) external;

        function recoverGAS(uint256 amount) external;
    }

    /// Minimal ERC20 surface used by the harness
    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}
