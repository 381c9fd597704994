// tests/scoring_scenarios.rs
//
// End-to-end properties of the scoring pipeline through its public entry
// point: determinism, bounds, the population cap, the dispatcher's
// degrade-gracefully gate, and the calm/stressed/subtle reference scenarios.

use rand::Rng;

use voice_stress_analyzer::{calculate_stress_level, MeasurementVector, ProfileKind, StressLevel};

fn calm() -> MeasurementVector {
    MeasurementVector {
        jitter: 0.35,
        shimmer: 2.1,
        pitch_mean: 140.0,
        pitch_range: 38.0,
        speech_rate: 150.0,
        formant1: 520.0,
        formant2: 1550.0,
    }
}

fn stressed() -> MeasurementVector {
    MeasurementVector {
        jitter: 1.8,
        shimmer: 6.2,
        pitch_mean: 205.0,
        pitch_range: 20.0,
        speech_rate: 190.0,
        formant1: 600.0,
        formant2: 1700.0,
    }
}

#[test]
fn calm_first_session_reads_low() {
    let r = calculate_stress_level(&calm(), ProfileKind::Mixed, None, 1.0);
    assert_eq!(r.level, StressLevel::Low);
}

#[test]
fn baseline_comparison_is_more_sensitive_than_population_norms() {
    let with_baseline = calculate_stress_level(&stressed(), ProfileKind::Mixed, Some(&calm()), 1.0);
    let without = calculate_stress_level(&stressed(), ProfileKind::Mixed, None, 1.0);
    assert!(
        with_baseline.score >= without.score + 5.0,
        "baseline {} vs population {}",
        with_baseline.score,
        without.score
    );
}

#[test]
fn subtle_shift_scores_below_pronounced_stress() {
    let subtle = MeasurementVector {
        jitter: 0.6,
        shimmer: 3.2,
        pitch_mean: 150.0,
        pitch_range: 30.0,
        speech_rate: 140.0,
        formant1: 520.0,
        formant2: 1550.0,
    };
    let subtle_score = calculate_stress_level(&subtle, ProfileKind::Mixed, Some(&calm()), 1.0).score;
    let stressed_score =
        calculate_stress_level(&stressed(), ProfileKind::Mixed, Some(&calm()), 1.0).score;
    assert!(
        subtle_score < stressed_score,
        "subtle {subtle_score} should be below pronounced {stressed_score}"
    );
}

#[test]
fn determinism_for_fixed_inputs() {
    for _ in 0..5 {
        let a = calculate_stress_level(&stressed(), ProfileKind::Female, Some(&calm()), 1.15);
        let b = calculate_stress_level(&stressed(), ProfileKind::Female, Some(&calm()), 1.15);
        assert_eq!(a, b);
    }
}

#[test]
fn population_path_never_reaches_high() {
    let mut rng = rand::rng();
    for _ in 0..2000 {
        let v = MeasurementVector {
            jitter: rng.random_range(0.0..30.0),
            shimmer: rng.random_range(0.0..40.0),
            pitch_mean: rng.random_range(40.0..600.0),
            pitch_range: rng.random_range(0.5..400.0),
            speech_rate: rng.random_range(40.0..400.0),
            formant1: rng.random_range(100.0..2000.0),
            formant2: rng.random_range(500.0..4000.0),
        };
        for profile in [ProfileKind::Male, ProfileKind::Female, ProfileKind::Mixed] {
            let r = calculate_stress_level(&v, profile, None, 1.0);
            assert!(r.score <= 59.0, "population cap violated: {}", r.score);
            assert_ne!(r.level, StressLevel::High);
        }
    }
}

#[test]
fn scores_stay_bounded_for_random_finite_inputs() {
    let mut rng = rand::rng();
    let base = calm();
    for _ in 0..2000 {
        let v = MeasurementVector {
            jitter: rng.random_range(-5.0..60.0),
            shimmer: rng.random_range(-5.0..80.0),
            pitch_mean: rng.random_range(-50.0..1200.0),
            pitch_range: rng.random_range(-20.0..600.0),
            speech_rate: rng.random_range(-50.0..600.0),
            formant1: rng.random_range(-100.0..4000.0),
            formant2: rng.random_range(-100.0..6000.0),
        };
        let pop = calculate_stress_level(&v, ProfileKind::Mixed, None, 1.0);
        assert!((0.0..=100.0).contains(&pop.score), "population {}", pop.score);
        let bl = calculate_stress_level(&v, ProfileKind::Mixed, Some(&base), 1.3);
        assert!((0.0..=100.0).contains(&bl.score), "baseline {}", bl.score);
    }
}

#[test]
fn any_invalid_baseline_field_falls_back_to_population() {
    let reference = calculate_stress_level(&stressed(), ProfileKind::Mixed, None, 1.0);
    let corruptions: Vec<Box<dyn Fn(&mut MeasurementVector)>> = vec![
        Box::new(|b| b.jitter = 0.0),
        Box::new(|b| b.shimmer = -1.0),
        Box::new(|b| b.pitch_mean = f64::NAN),
        Box::new(|b| b.pitch_range = f64::NEG_INFINITY),
        Box::new(|b| b.speech_rate = 0.0),
    ];
    for corrupt in corruptions {
        let mut bad = calm();
        corrupt(&mut bad);
        let r = calculate_stress_level(&stressed(), ProfileKind::Mixed, Some(&bad), 1.2);
        assert_eq!(r, reference);
    }
}

#[test]
fn jitter_sub_score_is_zero_below_and_increasing_above_the_ratio_threshold() {
    // Hold everything at baseline, vary only jitter.
    let base = calm();
    let score_at = |ratio: f64| {
        let mut v = base;
        v.jitter = base.jitter * ratio;
        calculate_stress_level(&v, ProfileKind::Mixed, Some(&base), 1.0).score
    };

    // Below the 1.1 dead zone the jitter deviation contributes nothing.
    let at_rest = score_at(1.0);
    assert_eq!(score_at(1.05), at_rest);
    assert_eq!(score_at(1.1), at_rest);

    // Above it the score strictly increases with the ratio.
    let mut prev = score_at(1.15);
    assert!(prev >= at_rest);
    for ratio in [1.3, 1.6, 2.0, 3.0, 5.0] {
        let s = score_at(ratio);
        assert!(s > prev, "score not increasing at ratio {ratio}");
        prev = s;
    }
}
