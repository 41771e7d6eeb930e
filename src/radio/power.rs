//! # Transmit Power Table
//!
//! The RFM69HCW reaches -2..+20 dBm through three amplifier tiers:
//!
//! ```text
//! dBm      │ PA1 │ PA2 │ boost │ level
//! ─────────┼─────┼─────┼───────┼──────────
//! -2..=13  │ on  │ off │ off   │ dBm + 18
//! 14..=17  │ on  │ on  │ off   │ dBm + 14
//! 18..=20  │ on  │ on  │ on    │ dBm + 11
//! ```
//!
//! Each tier is applied by a fixed sequence of register writes. The order
//! matters: the boosted bias must only be switched on once over-current
//! protection is off, and switched back to normal before protection returns.

use super::registers::*;
use super::Radio;
use crate::error::RadioError;
use crate::hal::Board;

/// Lowest supported output power
pub const MIN_POWER_DBM: i8 = -2;

/// Highest supported output power
pub const MAX_POWER_DBM: i8 = 20;

/// Power used right after Setup
pub const DEFAULT_POWER_DBM: i8 = 13;

/// Register recipe for one output power
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSetting {
    pub dbm: i8,
    /// Value of the 5-bit output power field
    pub level: u8,
    /// Second amplifier stage (PA2) enabled
    pub use_second_stage: bool,
    /// High-power boost bias enabled
    pub use_high_power: bool,
}

/// Amplifier tier a setting belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTier {
    Base,
    SecondStage,
    HighPower,
}

const fn row(dbm: i8, level: u8, use_second_stage: bool, use_high_power: bool) -> PowerSetting {
    PowerSetting {
        dbm,
        level,
        use_second_stage,
        use_high_power,
    }
}

/// Indexed by `dbm - MIN_POWER_DBM`
pub const POWER_TABLE: [PowerSetting; 23] = [
    row(-2, 16, false, false),
    row(-1, 17, false, false),
    row(0, 18, false, false),
    row(1, 19, false, false),
    row(2, 20, false, false),
    row(3, 21, false, false),
    row(4, 22, false, false),
    row(5, 23, false, false),
    row(6, 24, false, false),
    row(7, 25, false, false),
    row(8, 26, false, false),
    row(9, 27, false, false),
    row(10, 28, false, false),
    row(11, 29, false, false),
    row(12, 30, false, false),
    row(13, 31, false, false),
    row(14, 28, true, false),
    row(15, 29, true, false),
    row(16, 30, true, false),
    row(17, 31, true, false),
    row(18, 29, true, true),
    row(19, 30, true, true),
    row(20, 31, true, true),
];

/// Look up the recipe for `dbm`, clamping into -2..=20 first.
pub fn power_setting(dbm: i8) -> PowerSetting {
    let clamped = dbm.clamp(MIN_POWER_DBM, MAX_POWER_DBM);
    POWER_TABLE[(clamped - MIN_POWER_DBM) as usize]
}

impl PowerSetting {
    pub fn tier(&self) -> PowerTier {
        match (self.use_second_stage, self.use_high_power) {
            (_, true) => PowerTier::HighPower,
            (true, false) => PowerTier::SecondStage,
            (false, false) => PowerTier::Base,
        }
    }

    /// REG_PALEVEL value: amplifier enables plus output level
    pub fn pa_level(&self) -> u8 {
        let mut stages = PaLevel::PA1_ON;
        if self.use_second_stage {
            stages |= PaLevel::PA2_ON;
        }
        stages.bits() | (self.level & PALEVEL_OUTPUT_MASK)
    }

    /// Register writes that establish this setting, in the order they must
    /// hit the chip.
    pub fn recipe(&self) -> [(u8, u8); 4] {
        match self.tier() {
            PowerTier::HighPower => [
                (REG_OCP, RF_OCP_OFF),
                (REG_PALEVEL, self.pa_level()),
                (REG_TESTPA1, TESTPA1_BOOST),
                (REG_TESTPA2, TESTPA2_BOOST),
            ],
            PowerTier::SecondStage | PowerTier::Base => [
                (REG_TESTPA1, TESTPA1_NORMAL),
                (REG_TESTPA2, TESTPA2_NORMAL),
                (REG_PALEVEL, self.pa_level()),
                (REG_OCP, RF_OCP_ON),
            ],
        }
    }
}

impl<B: Board> Radio<B> {
    /// Change the configured transmit power and apply it now. Out-of-range
    /// values are clamped; the applied value is returned.
    pub fn set_tx_power(&mut self, dbm: i8) -> Result<i8, RadioError> {
        let setting = power_setting(dbm);
        self.tx_power_dbm = setting.dbm;
        self.apply_power(setting.dbm)?;
        Ok(setting.dbm)
    }

    /// Write the recipe for `dbm` without touching the configured power.
    pub(crate) fn apply_power(&mut self, dbm: i8) -> Result<(), RadioError> {
        let setting = power_setting(dbm);
        for (reg, value) in setting.recipe() {
            self.write_register(reg, value)?;
        }
        Ok(())
    }
}
