use exloop_core::project;
use exloop_core::projector::iob_effect;
use rstest::rstest;

#[test]
fn projection_with_active_insulin() {
    assert_eq!(iob_effect(3.5), 2.75);
    let p = project(146.0, 3.5, 100.0);
    assert_eq!(p.current_bg, 146.0);
    assert_eq!(p.total_change, -34.375);
    assert_eq!(p.projected_bg, 112.0);
}

#[test]
fn zero_energy_changes_nothing() {
    let p = project(146.0, 3.5, 0.0);
    assert_eq!(p.total_change, 0.0);
    assert_eq!(p.projected_bg, 146.0);
}

#[rstest]
// 111.5 rounds away from zero.
#[case(120.0, 0.0, 68.0, 112.0)]
#[case(99.6, 0.0, 0.0, 100.0)]
#[case(180.0, 2.0, 40.0, 170.0)]
fn projected_bg_is_rounded(
    #[case] current: f64,
    #[case] iob: f64,
    #[case] kcal: f64,
    #[case] expected: f64,
) {
    assert_eq!(project(current, iob, kcal).projected_bg, expected);
}

#[test]
fn total_change_keeps_full_precision() {
    // 0.125 * 1.5 * 33 = 6.1875
    let p = project(150.0, 1.0, 33.0);
    assert_eq!(p.total_change, -6.1875);
    assert_eq!(p.projected_bg, 144.0);
}
