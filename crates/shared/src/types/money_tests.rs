use super::money::*;
use rstest::rstest;
use rust_decimal_macros::dec;

#[rstest]
#[case("Rp 1.200.000", dec!(1200000))]
#[case("Rp1.200.000", dec!(1200000))]
#[case("1,200,000", dec!(1200000))]
#[case(" 50000 ", dec!(50000))]
#[case("rp 100.000", dec!(100000))]
fn test_parse_rupiah(#[case] raw: &str, #[case] expected: rust_decimal::Decimal) {
    assert_eq!(parse_rupiah(raw).unwrap(), expected);
}

#[rstest]
#[case("")]
#[case("Rp")]
#[case("  ")]
fn test_parse_rupiah_empty(#[case] raw: &str) {
    assert_eq!(parse_rupiah(raw), Err(MoneyParseError::Empty));
}

#[rstest]
#[case("Rp 12a00")]
#[case("-5000")]
#[case("IDR 5000")]
fn test_parse_rupiah_invalid(#[case] raw: &str) {
    assert!(matches!(parse_rupiah(raw), Err(MoneyParseError::Invalid(_))));
}

#[rstest]
#[case("2,5", Some(dec!(2.5)))]
#[case("2.5", Some(dec!(2.5)))]
#[case("2%", Some(dec!(2)))]
#[case("", None)]
#[case("   ", None)]
fn test_parse_percent(#[case] raw: &str, #[case] expected: Option<rust_decimal::Decimal>) {
    assert_eq!(parse_percent(raw).unwrap(), expected);
}

#[test]
fn test_parse_percent_invalid() {
    assert!(parse_percent("dua").is_err());
}

#[test]
fn test_round_money_is_bankers() {
    assert_eq!(round_money(dec!(10.125)), dec!(10.12));
    assert_eq!(round_money(dec!(10.135)), dec!(10.14));
    assert_eq!(round_money(dec!(10.1251)), dec!(10.13));
}

#[test]
fn test_round_rupiah_is_bankers() {
    assert_eq!(round_rupiah(dec!(24000.5)), dec!(24000));
    assert_eq!(round_rupiah(dec!(24001.5)), dec!(24002));
    assert_eq!(round_rupiah(dec!(30000)), dec!(30000));
}
