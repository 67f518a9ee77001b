//! Property tests for mana costs and pools

use mtg_sim::core::{Color, ManaCost, ManaPool};
use proptest::prelude::*;

fn cost_strategy() -> impl Strategy<Value = ManaCost> {
    (0u8..6, prop::array::uniform5(0u8..3), 0u8..2, prop::array::uniform5(0u8..2)).prop_map(
        |(generic, colored, colorless, phyrexian)| ManaCost {
            generic,
            colored,
            colorless,
            phyrexian,
        },
    )
}

/// Any amounts at all, most of them past what a parsed cost can hold
fn wide_cost_strategy() -> impl Strategy<Value = ManaCost> {
    (
        any::<u8>(),
        prop::array::uniform5(any::<u8>()),
        any::<u8>(),
        prop::array::uniform5(any::<u8>()),
    )
        .prop_map(|(generic, colored, colorless, phyrexian)| ManaCost {
            generic,
            colored,
            colorless,
            phyrexian,
        })
}

/// Large generic amounts with a few colored symbols, straddling 255
fn boundary_cost_strategy() -> impl Strategy<Value = ManaCost> {
    (240u8..=255, prop::array::uniform5(0u8..4), 0u8..3, prop::array::uniform5(0u8..3)).prop_map(
        |(generic, colored, colorless, phyrexian)| ManaCost {
            generic,
            colored,
            colorless,
            phyrexian,
        },
    )
}

fn pool_strategy() -> impl Strategy<Value = ManaPool> {
    prop::array::uniform6(0u8..5).prop_map(|amounts| {
        let mut pool = ManaPool::new();
        for (color, n) in Color::ALL.into_iter().zip(amounts) {
            pool.add(color, n);
        }
        pool
    })
}

proptest! {
    #[test]
    fn test_display_then_parse_is_identity(cost in cost_strategy()) {
        let text = cost.to_string();
        prop_assert_eq!(ManaCost::parse(&text).unwrap(), cost);
    }

    #[test]
    fn test_payment_takes_exactly_the_mana_value(cost in cost_strategy(), pool in pool_strategy()) {
        let mut after = pool;
        match after.pay(&cost) {
            Ok(paid) => {
                prop_assert!(pool.can_pay(&cost));
                prop_assert_eq!(paid.total(), cost.cmc() as u32);
                prop_assert_eq!(after.total() + paid.total(), pool.total());
                for color in Color::ALL {
                    let owed = cost.phyrexian_as_colored().colored_amount(color);
                    prop_assert!(paid.amount(color) >= owed);
                }
                after.refund(&paid);
                prop_assert_eq!(after, pool);
            }
            Err(_) => {
                prop_assert!(!pool.can_pay(&cost));
                prop_assert_eq!(after, pool);
            }
        }
    }

    #[test]
    fn test_formatted_cost_parses_back_or_is_refused(cost in boundary_cost_strategy()) {
        match ManaCost::parse(&cost.to_string()) {
            Ok(parsed) => {
                prop_assert!(cost.mana_value() <= 255);
                prop_assert_eq!(parsed, cost);
                prop_assert_eq!(parsed.cmc() as u32, cost.mana_value());
            }
            Err(_) => prop_assert!(cost.mana_value() > 255),
        }
    }

    #[test]
    fn test_huge_costs_never_panic(cost in wide_cost_strategy(), pool in prop::array::uniform6(any::<u8>())) {
        let mut pool = pool.into_iter().zip(Color::ALL).fold(ManaPool::new(), |mut p, (n, color)| {
            p.add(color, n);
            p
        });
        prop_assert!(cost.cmc() as u32 <= cost.mana_value());
        let before = pool;
        match pool.pay(&cost) {
            Ok(paid) => prop_assert_eq!(paid.total(), cost.mana_value()),
            Err(_) => prop_assert_eq!(pool, before),
        }
    }

    #[test]
    fn test_generic_reduction_only_touches_generic(cost in cost_strategy(), amount in 0u8..8) {
        let reduced = cost.with_generic_reduction(amount);
        prop_assert_eq!(reduced.generic, cost.generic.saturating_sub(amount));
        prop_assert_eq!(reduced.colored, cost.colored);
        prop_assert_eq!(reduced.colorless, cost.colorless);
        prop_assert_eq!(reduced.phyrexian, cost.phyrexian);
        prop_assert!(reduced.cmc() <= cost.cmc());
    }

    #[test]
    fn test_phyrexian_split_preserves_mana_value(cost in cost_strategy()) {
        let as_colored = cost.phyrexian_as_colored();
        prop_assert_eq!(as_colored.cmc(), cost.cmc());
        prop_assert!(!as_colored.has_phyrexian());
        prop_assert_eq!(
            cost.without_phyrexian().cmc() + cost.phyrexian_total(),
            cost.cmc()
        );
    }
}

#[test]
fn test_unbalanced_braces_fail_to_parse() {
    for bad in ["{2", "2}", "{X/P}", "{R}{", "{Q}"] {
        assert!(ManaCost::parse(bad).is_err(), "{bad} parsed");
    }
}
