use crate::genview_core::cost::{
    CostCalculator, ModelPrice, PricingTable, DEFAULT_MODEL_ID, DEFAULT_TASK_NAME,
    USD_TO_KRW_RATE,
};
use crate::genview_core::support::usage;
use crate::genview_core::SdkError;
use crate::genview_types::usage::{ModalityTokenCount, UsageMetadata, UsageRecord};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn missing_metadata_yields_named_zero_record() {
    let calc = CostCalculator::gemini_image_default();
    let rec = calc.from_usage_metadata(None);

    assert_eq!(rec.model_name, DEFAULT_MODEL_ID);
    assert_eq!(rec.task_name, DEFAULT_TASK_NAME);
    assert_eq!(rec.prompt_tokens, 0);
    assert_eq!(rec.candidate_tokens, 0);
    assert_eq!(rec.total_tokens, 0);
    assert_eq!(rec.cached_tokens, 0);
    assert_eq!(rec.thought_tokens, 0);
    assert_eq!(rec.cost_usd, 0.0);
    assert_eq!(rec.cost_local, 0.0);
    assert_eq!(rec, calc.zero());
}

#[test]
fn cost_uses_per_million_prices_and_exchange_rate() {
    let calc = CostCalculator::gemini_image_default();
    let rec = calc.from_usage_metadata(Some(&usage(1000, 1290)));

    // 1000 / 1e6 * 0.35 + 1290 / 1e6 * 30.0
    assert_eq!(rec.prompt_tokens, 1000);
    assert_eq!(rec.candidate_tokens, 1290);
    assert_eq!(rec.total_tokens, 2290);
    assert!(approx(rec.cost_usd, 0.03905), "cost_usd = {}", rec.cost_usd);
    assert!(approx(rec.cost_local, 53.89), "cost_local = {}", rec.cost_local);
}

#[test]
fn missing_sub_fields_count_as_zero() {
    let calc = CostCalculator::gemini_image_default();
    let md = UsageMetadata {
        candidates_token_count: Some(1_000_000),
        prompt_tokens_details: vec![ModalityTokenCount {
            modality: Some("IMAGE".into()),
            token_count: Some(258),
        }],
        ..Default::default()
    };
    let rec = calc.from_usage_metadata(Some(&md));

    assert_eq!(rec.prompt_tokens, 0);
    assert_eq!(rec.total_tokens, 0);
    assert!(approx(rec.cost_usd, 30.0));
    assert!(approx(rec.cost_local, 30.0 * USD_TO_KRW_RATE));
}

#[test]
fn unknown_model_fails_to_build_calculator() {
    let err = CostCalculator::new(&PricingTable::default(), "imagen-9", "virtual_tryon")
        .expect_err("unknown model must be rejected");
    match err {
        SdkError::UnknownModel { model_id } => assert_eq!(model_id, "imagen-9"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn model_lookup_ignores_case_and_models_prefix() {
    let table = PricingTable::default();
    let calc = CostCalculator::new(&table, "models/Gemini-2.5-Flash-Image", "t").unwrap();
    assert_eq!(calc.price(), ModelPrice::new(0.35, 30.0));

    let flash = table.price_for("gemini-2.5-flash").unwrap();
    assert_eq!(flash, ModelPrice::new(0.3, 2.5));
}

#[test]
fn pricing_table_from_json() {
    let raw = r#"{
        "models": {
            "custom-image": { "inputPricePerMillionTokens": 1.0, "outputPricePerMillionTokens": 10.0 }
        },
        "usdToLocalRate": 1000.0,
        "localCurrency": "JPY"
    }"#;
    let table = PricingTable::from_json_str(raw).unwrap();
    assert_eq!(table.local_currency, "JPY");

    let calc = CostCalculator::new(&table, "custom-image", "preview").unwrap();
    let rec = calc.from_usage_metadata(Some(&usage(1_000_000, 100_000)));
    assert!(approx(rec.cost_usd, 2.0));
    assert!(approx(rec.cost_local, 2000.0));

    assert!(CostCalculator::new(&table, DEFAULT_MODEL_ID, "t").is_err());
}

#[test]
fn pricing_table_json_defaults_rate() {
    let table = PricingTable::from_json_str(r#"{"models": {}}"#).unwrap();
    assert_eq!(table.usd_to_local_rate, USD_TO_KRW_RATE);
    assert_eq!(table.local_currency, "KRW");
}

#[test]
fn negative_exchange_rate_is_rejected() {
    let table = PricingTable {
        usd_to_local_rate: -1.0,
        ..PricingTable::default()
    };
    let err = CostCalculator::new(&table, DEFAULT_MODEL_ID, "t").unwrap_err();
    assert!(matches!(err, SdkError::InvalidArgument { .. }));
}

#[test]
fn merge_of_nothing_is_zero_record() {
    let calc = CostCalculator::gemini_image_default();
    assert_eq!(calc.merge(&[]), calc.zero());
}

#[test]
fn merge_is_order_independent() {
    let calc = CostCalculator::gemini_image_default();
    let records: Vec<UsageRecord> = [(1000, 1290), (258, 0), (1, 7), (77_777, 1290), (3, 999)]
        .iter()
        .map(|(p, c)| calc.from_usage_metadata(Some(&usage(*p, *c))))
        .collect();

    let forward = calc.merge(&records);

    let mut reversed = records.clone();
    reversed.reverse();
    let mut rotated = records.clone();
    rotated.rotate_left(2);
    let mut swapped = records.clone();
    swapped.swap(0, 3);

    assert_eq!(calc.merge(&reversed), forward);
    assert_eq!(calc.merge(&rotated), forward);
    assert_eq!(calc.merge(&swapped), forward);

    assert_eq!(forward.prompt_tokens, 1000 + 258 + 1 + 77_777 + 3);
    assert_eq!(forward.candidate_tokens, 1290 + 7 + 1290 + 999);
    assert_eq!(forward.model_name, DEFAULT_MODEL_ID);
}

#[test]
fn merge_is_associative_over_token_fields() {
    let calc = CostCalculator::gemini_image_default();
    let a = calc.from_usage_metadata(Some(&usage(10, 20)));
    let b = calc.from_usage_metadata(Some(&usage(30, 40)));
    let c = calc.from_usage_metadata(Some(&usage(50, 60)));

    let left = calc.merge(&[calc.merge(&[a.clone(), b.clone()]), c.clone()]);
    let right = calc.merge(&[a, calc.merge(&[b, c])]);

    assert_eq!(left.prompt_tokens, right.prompt_tokens);
    assert_eq!(left.candidate_tokens, right.candidate_tokens);
    assert_eq!(left.total_tokens, right.total_tokens);
    assert!(approx(left.cost_usd, right.cost_usd));
}
