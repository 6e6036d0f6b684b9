//! Property tests for rule evaluation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use riskgate::domain::{ListFlags, Rule, RuleId, TransactionAttributes, TransactionContext};
use riskgate::rules::{Condition, RuleEvaluator};

fn value_range_rule(id: i64, min: i64, max: i64, points: i32) -> Rule {
    Rule {
        id: RuleId(id),
        name: format!("range-{}", id),
        description: String::new(),
        tx_type: "DEFAULT".to_string(),
        condition: json!({"type": "value_range", "min": min.to_string(), "max": max.to_string()}),
        points,
        active: true,
    }
}

fn list_rule(id: i64, kind: &str, points: i32) -> Rule {
    Rule {
        id: RuleId(id),
        name: format!("list-{}", id),
        description: String::new(),
        tx_type: "DEFAULT".to_string(),
        condition: json!({ "type": kind }),
        points,
        active: true,
    }
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    let kinds = prop_oneof![
        Just("cpf_permissive_list"),
        Just("cpf_restrictive_list"),
        Just("ip_restrictive_list"),
        Just("device_restrictive_list"),
        Just("unknown_kind"),
    ];

    prop_oneof![
        (0i64..10_000, 0i64..10_000, -1000i32..1000)
            .prop_map(|(a, b, p)| value_range_rule(0, a.min(b), a.max(b), p)),
        (kinds, -1000i32..1000).prop_map(|(k, p)| list_rule(0, k, p)),
    ]
}

fn arb_flags() -> impl Strategy<Value = ListFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(a, b, c, d)| {
        ListFlags {
            customer_permissive: a,
            customer_restrictive: b,
            ip_restrictive: c,
            device_restrictive: d,
        }
    })
}

fn context(value_cents: i64, flags: ListFlags) -> TransactionContext {
    TransactionContext::new(
        TransactionAttributes::new("c", "ip", "d", "PIX", Decimal::new(value_cents, 2)),
        flags,
    )
}

proptest! {
    #[test]
    fn score_never_below_floor(
        rules in prop::collection::vec(arb_rule(), 0..20),
        flags in arb_flags(),
        value in 1i64..2_000_000,
    ) {
        let score = RuleEvaluator::default()
            .evaluate(&context(value, flags), &rules)
            .unwrap();
        prop_assert!(score.value() >= 1);
    }

    #[test]
    fn rule_order_does_not_matter(
        (rules, shuffled) in prop::collection::vec(arb_rule(), 0..20)
            .prop_flat_map(|rules| (Just(rules.clone()), Just(rules).prop_shuffle())),
        flags in arb_flags(),
        value in 1i64..2_000_000,
    ) {
        let evaluator = RuleEvaluator::default();
        let ctx = context(value, flags);

        let original = evaluator.evaluate_detailed(&ctx, &rules).unwrap();
        let permuted = evaluator.evaluate_detailed(&ctx, &shuffled).unwrap();
        prop_assert_eq!(original.total, permuted.total);
    }

    #[test]
    fn value_range_is_inclusive_at_both_ends(min in 1i64..100_000, width in 0i64..100_000) {
        let max = min + width;
        let condition = Condition::ValueRange {
            min: Decimal::new(min, 2),
            max: Decimal::new(max, 2),
        };

        prop_assert!(condition.evaluate(&context(min, ListFlags::none())));
        prop_assert!(condition.evaluate(&context(max, ListFlags::none())));
        prop_assert!(!condition.evaluate(&context(max + 1, ListFlags::none())));
        if min > 1 {
            prop_assert!(!condition.evaluate(&context(min - 1, ListFlags::none())));
        }
    }
}
