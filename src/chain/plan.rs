//! Universal Router plans
//!
//! A plan is an ordered list of router commands executed atomically in one
//! transaction. Only the three commands the agent needs are modelled.

use alloy::primitives::{address, Address, Bytes, U256};
use alloy::sol_types::SolValue;

/// Router command bytes
pub mod commands {
    pub const V2_SWAP_EXACT_IN: u8 = 0x08;
    pub const WRAP_ETH: u8 = 0x0b;
    pub const UNWRAP_WETH: u8 = 0x0c;
}

/// Sentinel recipients understood by the router
pub mod recipients {
    use super::*;

    /// The account that called `execute`
    pub const MSG_SENDER: Address = address!("0000000000000000000000000000000000000001");
    /// The router itself (intermediate balance for chained steps)
    pub const ADDRESS_THIS: Address = address!("0000000000000000000000000000000000000002");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    WrapEth {
        recipient: Address,
        amount_min: U256,
    },
    V2SwapExactIn {
        recipient: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        payer_is_user: bool,
    },
    UnwrapWeth {
        recipient: Address,
        amount_min: U256,
    },
}

impl PlanStep {
    fn command(&self) -> u8 {
        match self {
            PlanStep::WrapEth { .. } => commands::WRAP_ETH,
            PlanStep::V2SwapExactIn { .. } => commands::V2_SWAP_EXACT_IN,
            PlanStep::UnwrapWeth { .. } => commands::UNWRAP_WETH,
        }
    }

    fn encode_input(&self) -> Bytes {
        match self {
            PlanStep::WrapEth {
                recipient,
                amount_min,
            }
            | PlanStep::UnwrapWeth {
                recipient,
                amount_min,
            } => (*recipient, *amount_min).abi_encode_params().into(),
            PlanStep::V2SwapExactIn {
                recipient,
                amount_in,
                amount_out_min,
                path,
                payer_is_user,
            } => (
                *recipient,
                *amount_in,
                *amount_out_min,
                path.clone(),
                *payer_is_user,
            )
                .abi_encode_params()
                .into(),
        }
    }
}

/// Builder for a multi-step router transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap_eth(mut self, recipient: Address, amount_min: U256) -> Self {
        self.steps.push(PlanStep::WrapEth {
            recipient,
            amount_min,
        });
        self
    }

    pub fn v2_swap_exact_in(
        mut self,
        recipient: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        payer_is_user: bool,
    ) -> Self {
        self.steps.push(PlanStep::V2SwapExactIn {
            recipient,
            amount_in,
            amount_out_min,
            path,
            payer_is_user,
        });
        self
    }

    pub fn unwrap_weth(mut self, recipient: Address, amount_min: U256) -> Self {
        self.steps.push(PlanStep::UnwrapWeth {
            recipient,
            amount_min,
        });
        self
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of swap steps in the plan
    pub fn swap_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, PlanStep::V2SwapExactIn { .. }))
            .count()
    }

    /// Encode as `execute(commands, inputs, deadline)` arguments
    pub fn encode(&self) -> (Bytes, Vec<Bytes>) {
        let commands: Vec<u8> = self.steps.iter().map(PlanStep::command).collect();
        let inputs = self.steps.iter().map(PlanStep::encode_input).collect();
        (commands.into(), inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_plan_encoding() {
        let weth = Address::with_last_byte(0xee);
        let token = Address::with_last_byte(0x11);
        let amount = U256::from(1_000u64);

        let plan = Plan::new()
            .wrap_eth(recipients::ADDRESS_THIS, amount)
            .v2_swap_exact_in(
                recipients::MSG_SENDER,
                amount,
                U256::from(990u64),
                vec![weth, token],
                false,
            );

        let (cmds, inputs) = plan.encode();
        assert_eq!(
            cmds.to_vec(),
            vec![commands::WRAP_ETH, commands::V2_SWAP_EXACT_IN]
        );
        assert_eq!(inputs.len(), 2);

        let (recipient, wrapped) = <(Address, U256)>::abi_decode_params(&inputs[0]).unwrap();
        assert_eq!(recipient, recipients::ADDRESS_THIS);
        assert_eq!(wrapped, amount);

        let (to, amount_in, min_out, path, payer_is_user) =
            <(Address, U256, U256, Vec<Address>, bool)>::abi_decode_params(&inputs[1]).unwrap();
        assert_eq!(to, recipients::MSG_SENDER);
        assert_eq!(amount_in, amount);
        assert_eq!(min_out, U256::from(990u64));
        assert_eq!(path, vec![weth, token]);
        assert!(!payer_is_user);
    }

    #[test]
    fn test_swap_count_ignores_wrap_steps() {
        let plan = Plan::new()
            .v2_swap_exact_in(
                recipients::ADDRESS_THIS,
                U256::from(1u64),
                U256::ZERO,
                vec![],
                true,
            )
            .unwrap_weth(recipients::MSG_SENDER, U256::ZERO);
        assert_eq!(plan.swap_count(), 1);
        assert_eq!(plan.steps().len(), 2);
        assert!(Plan::new().is_empty());
    }
}
