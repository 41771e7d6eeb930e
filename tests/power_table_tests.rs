//! # Power Table Tests
//!
//! The 23-row transmit power table, its clamping, and the per-tier register
//! recipes.

use proptest::prelude::*;
use rfm69_link::radio::power::*;
use rfm69_link::radio::registers::*;

/// (dBm, level, PA2, boost) for every supported power
const CANONICAL: [(i8, u8, bool, bool); 23] = [
    (-2, 16, false, false),
    (-1, 17, false, false),
    (0, 18, false, false),
    (1, 19, false, false),
    (2, 20, false, false),
    (3, 21, false, false),
    (4, 22, false, false),
    (5, 23, false, false),
    (6, 24, false, false),
    (7, 25, false, false),
    (8, 26, false, false),
    (9, 27, false, false),
    (10, 28, false, false),
    (11, 29, false, false),
    (12, 30, false, false),
    (13, 31, false, false),
    (14, 28, true, false),
    (15, 29, true, false),
    (16, 30, true, false),
    (17, 31, true, false),
    (18, 29, true, true),
    (19, 30, true, true),
    (20, 31, true, true),
];

#[test]
fn test_table_matches_canonical_rows() {
    for (dbm, level, second_stage, high_power) in CANONICAL {
        let setting = power_setting(dbm);
        assert_eq!(setting.dbm, dbm);
        assert_eq!(setting.level, level, "level at {dbm} dBm");
        assert_eq!(setting.use_second_stage, second_stage, "PA2 at {dbm} dBm");
        assert_eq!(setting.use_high_power, high_power, "boost at {dbm} dBm");
    }
}

#[test]
fn test_out_of_range_clamps_to_edges() {
    assert_eq!(power_setting(-3), power_setting(-2));
    assert_eq!(power_setting(i8::MIN), power_setting(MIN_POWER_DBM));
    assert_eq!(power_setting(21), power_setting(20));
    assert_eq!(power_setting(i8::MAX), power_setting(MAX_POWER_DBM));
}

#[test]
fn test_second_stage_recipe() {
    assert_eq!(
        power_setting(15).recipe(),
        [
            (REG_TESTPA1, TESTPA1_NORMAL),
            (REG_TESTPA2, TESTPA2_NORMAL),
            (REG_PALEVEL, 0x60 | 29),
            (REG_OCP, RF_OCP_ON),
        ]
    );
}

proptest! {
    #[test]
    fn prop_lookup_clamps(dbm in any::<i8>()) {
        let setting = power_setting(dbm);
        prop_assert_eq!(setting.dbm, dbm.clamp(MIN_POWER_DBM, MAX_POWER_DBM));
    }

    #[test]
    fn prop_recipe_matches_tier(dbm in MIN_POWER_DBM..=MAX_POWER_DBM) {
        let setting = power_setting(dbm);
        let recipe = setting.recipe();
        let pa = recipe
            .iter()
            .find(|(reg, _)| *reg == REG_PALEVEL)
            .map(|(_, value)| *value)
            .unwrap();
        prop_assert_eq!(pa & 0x1F, setting.level);
        prop_assert_ne!(pa & PaLevel::PA1_ON.bits(), 0);

        match setting.tier() {
            PowerTier::HighPower => {
                prop_assert!(dbm >= 18);
                prop_assert_eq!(recipe[0], (REG_OCP, RF_OCP_OFF));
                prop_assert_eq!(recipe[3], (REG_TESTPA2, TESTPA2_BOOST));
            }
            PowerTier::SecondStage => {
                prop_assert!((14..=17).contains(&dbm));
                prop_assert_ne!(pa & PaLevel::PA2_ON.bits(), 0);
                prop_assert_eq!(recipe[3], (REG_OCP, RF_OCP_ON));
            }
            PowerTier::Base => {
                prop_assert!(dbm <= 13);
                prop_assert_eq!(pa & PaLevel::PA2_ON.bits(), 0);
                prop_assert_eq!(recipe[0], (REG_TESTPA1, TESTPA1_NORMAL));
            }
        }
    }
}
