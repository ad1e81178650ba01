use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fee growth recorded on the far side of an initialized tick, scaled by 2^128.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickFeeState {
    pub fee_growth_outside0_x128: U256,
    pub fee_growth_outside1_x128: U256,
}

impl TickFeeState {
    pub fn new(fee_growth_outside0_x128: U256, fee_growth_outside1_x128: U256) -> Self {
        Self {
            fee_growth_outside0_x128,
            fee_growth_outside1_x128,
        }
    }
}

/// Point-in-time fee accounting of a pool.
///
/// Only ticks the pool has recorded activity at carry a state row; a lookup for
/// any other tick returns `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolFeeState {
    pub tick_current: i32,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
    pub ticks: BTreeMap<i32, TickFeeState>,
}

impl PoolFeeState {
    /// Creates a pool fee state with no tick rows.
    #[must_use]
    pub fn new(
        tick_current: i32,
        fee_growth_global0_x128: U256,
        fee_growth_global1_x128: U256,
    ) -> Self {
        Self {
            tick_current,
            fee_growth_global0_x128,
            fee_growth_global1_x128,
            ticks: BTreeMap::new(),
        }
    }

    /// Records the state row of a tick.
    #[must_use]
    pub fn with_tick(mut self, tick: i32, state: TickFeeState) -> Self {
        self.ticks.insert(tick, state);
        self
    }

    pub fn tick(&self, tick: i32) -> Option<&TickFeeState> {
        self.ticks.get(&tick)
    }
}
