// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use hifitime::{Duration, Epoch};
use ndarray::prelude::*;

use super::*;
use crate::noise::estimate_mle;
use crate::subtract::difference;
use crate::tests::{synthetic_vis, INT_TIME, T0_GPS};

fn epoch(t: usize) -> Epoch {
    Epoch::from_gpst_seconds(T0_GPS + INT_TIME * t as f64)
}

#[test]
fn test_unflagged_clears_everything() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2, 2);
    vis.mask.fill(true);

    let applied = apply_flags(&mut vis, FlagChoice::Unflagged, MissingCustom::Fail).unwrap();
    assert_eq!(applied, FlagChoiceKind::Unflagged);
    assert_eq!(vis.flag_choice(), Some(FlagChoiceKind::Unflagged));
    assert!(!vis.mask().iter().any(|&m| m));
}

#[test]
fn test_original_round_trips() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2, 1);
    vis.flags[(0, 0, 1, 0)] = true;
    vis.flags[(3, 0, 0, 0)] = true;

    apply_flags(&mut vis, FlagChoice::Original, MissingCustom::Fail).unwrap();
    let first = vis.mask.clone();
    assert_eq!(first, vis.flags);

    apply_flags(&mut vis, FlagChoice::Unflagged, MissingCustom::Fail).unwrap();
    assert!(!vis.mask().iter().any(|&m| m));

    apply_flags(&mut vis, FlagChoice::Original, MissingCustom::Fail).unwrap();
    assert_eq!(vis.mask, first);
    assert_eq!(vis.flag_choice(), Some(FlagChoiceKind::Original));
}

#[test]
fn test_custom_is_copied_and_shape_checked() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2, 1);

    let mut custom = Array4::from_elem((4, 1, 2, 1), false);
    custom[(2, 0, 0, 0)] = true;
    let applied = apply_flags(
        &mut vis,
        FlagChoice::Custom(Some(custom.view())),
        MissingCustom::Fail,
    )
    .unwrap();
    assert_eq!(applied, FlagChoiceKind::Custom);
    assert_eq!(vis.mask, custom);

    let wrong_shape = Array4::from_elem((4, 1, 3, 1), false);
    let result = apply_flags(
        &mut vis,
        FlagChoice::Custom(Some(wrong_shape.view())),
        MissingCustom::Fail,
    );
    assert!(matches!(result, Err(FlagError::ShapeMismatch { .. })));
    // The failed application left the previous mask alone.
    assert_eq!(vis.mask, custom);
}

#[test]
fn test_missing_custom_degrades_or_fails() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0]], 1, 1);
    vis.mask.fill(true);

    // Lenient: degrade to unflagged and report the effective policy.
    let applied = apply_flags(&mut vis, FlagChoice::Custom(None), MissingCustom::Unflag).unwrap();
    assert_eq!(applied, FlagChoiceKind::Unflagged);
    assert_eq!(vis.flag_choice(), Some(FlagChoiceKind::Unflagged));
    assert!(!vis.mask().iter().any(|&m| m));

    // Strict: refuse.
    let result = apply_flags(&mut vis, FlagChoice::Custom(None), MissingCustom::Fail);
    assert!(matches!(result, Err(FlagError::MissingCustomFlags)));
}

#[test]
fn test_spectrum_broadcasts_across_baselines() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2, 1);

    // Flag channel 0 at the second time only.
    let mut spectrum_mask = Array3::from_elem((2, 2, 1), false);
    spectrum_mask[(1, 0, 0)] = true;
    let spectrum = SpectrumFlags::new(vec![epoch(0), epoch(1)], spectrum_mask).unwrap();

    let applied = apply_flags(
        &mut vis,
        FlagChoice::Spectrum(&spectrum),
        MissingCustom::Fail,
    )
    .unwrap();
    assert_eq!(applied, FlagChoiceKind::Spectrum);

    // Rows 1 and 3 are the second time of each baseline.
    for row in 0..4 {
        let expect_flagged = row % 2 == 1;
        assert_eq!(vis.mask[(row, 0, 0, 0)], expect_flagged, "row {row}");
        // Channel 1 was never flagged.
        assert!(!vis.mask[(row, 0, 1, 0)]);
    }
}

#[test]
fn test_spectrum_time_axis_must_match() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2, 1);

    let spectrum =
        SpectrumFlags::new(vec![epoch(0), epoch(5)], Array3::from_elem((2, 2, 1), false)).unwrap();
    let result = apply_flags(
        &mut vis,
        FlagChoice::Spectrum(&spectrum),
        MissingCustom::Fail,
    );
    assert!(matches!(result, Err(FlagError::IncompatibleTimeAxis { .. })));

    // Channel/polarization axes are checked too.
    let spectrum =
        SpectrumFlags::new(vec![epoch(0), epoch(1)], Array3::from_elem((2, 3, 1), false)).unwrap();
    let result = apply_flags(
        &mut vis,
        FlagChoice::Spectrum(&spectrum),
        MissingCustom::Fail,
    );
    assert!(matches!(result, Err(FlagError::SpectrumAxisMismatch { .. })));
}

#[test]
fn test_spectrum_flags_constructor_counts_times() {
    let result = SpectrumFlags::new(vec![epoch(0)], Array3::from_elem((2, 2, 1), false));
    assert!(matches!(
        result,
        Err(FlagError::SpectrumTimeCount {
            expected: 1,
            got: 2
        })
    ));
}

#[test]
fn test_apply_flags_invalidates_mle() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0, 3.0]], 1, 1);
    apply_flags(&mut vis, FlagChoice::Unflagged, MissingCustom::Fail).unwrap();
    estimate_mle(&mut vis);
    assert!(vis.mle().is_some());

    apply_flags(&mut vis, FlagChoice::Original, MissingCustom::Fail).unwrap();
    assert!(vis.mle().is_none());
}

#[test]
fn test_flag_choice_kind_tokens() {
    assert_eq!("none".parse::<FlagChoiceKind>().unwrap(), FlagChoiceKind::Unflagged);
    assert_eq!(
        "Original".parse::<FlagChoiceKind>().unwrap(),
        FlagChoiceKind::Original
    );
    assert_eq!(
        "SPECTRUM".parse::<FlagChoiceKind>().unwrap(),
        FlagChoiceKind::Spectrum
    );
    assert_eq!(
        "custom".parse::<FlagChoiceKind>().unwrap(),
        FlagChoiceKind::Custom
    );
    assert!(matches!(
        "bogus".parse::<FlagChoiceKind>(),
        Err(FlagError::UnknownChoice(_))
    ));

    assert_eq!(FlagChoiceKind::Spectrum.to_string(), "spectrum");
}

#[test]
fn test_propagate_flags_fans_out() {
    let original = synthetic_vis(&[vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]], 1, 1);
    let mut target = original.clone();
    let mut source = difference(original).unwrap();

    // One derived flag on the first baseline's first differenced time.
    source.mask[(0, 0, 0, 0)] = true;

    propagate_flags(&mut source, &mut target, true).unwrap();

    // Both contributing rows of that baseline are flagged, nothing else.
    for row in 0..6 {
        let expect_flagged = row == 0 || row == 1;
        assert_eq!(target.flags[(row, 0, 0, 0)], expect_flagged, "row {row}");
    }
    // Only the target's flag array is written; its mask is untouched.
    assert!(!target.mask().iter().any(|&m| m));
}

#[test]
fn test_propagate_flags_combine_semantics() {
    let original = synthetic_vis(&[vec![1.0, 2.0, 3.0]], 1, 1);
    let mut target = original.clone();
    let mut source = difference(original).unwrap();

    // A pre-existing flag unrelated to the derived ones.
    target.flags[(2, 0, 0, 0)] = true;
    source.mask[(0, 0, 0, 0)] = true;

    // Union semantics keep the old flag.
    propagate_flags(&mut source, &mut target, true).unwrap();
    assert!(target.flags[(0, 0, 0, 0)]);
    assert!(target.flags[(1, 0, 0, 0)]);
    assert!(target.flags[(2, 0, 0, 0)]);

    // Overwrite semantics clear it first.
    propagate_flags(&mut source, &mut target, false).unwrap();
    assert!(target.flags[(0, 0, 0, 0)]);
    assert!(target.flags[(1, 0, 0, 0)]);
    assert!(!target.flags[(2, 0, 0, 0)]);
}

#[test]
fn test_propagate_flags_validates_before_mutating() {
    let original = synthetic_vis(&[vec![1.0, 2.0, 3.0]], 1, 1);
    let mut target = original.clone();
    target.flags[(2, 0, 0, 0)] = true;
    let flags_before = target.flags.clone();

    // A source differenced from a *shifted* time axis can't be aligned.
    let mut shifted = original.clone();
    for t in shifted.times.iter_mut() {
        *t = *t + Duration::from_seconds(1.0);
    }
    let mut source = difference(shifted).unwrap();
    source.mask.fill(true);

    let result = propagate_flags(&mut source, &mut target, false);
    assert!(matches!(result, Err(FlagError::IncompatibleTimeAxis { .. })));
    // Even with combine = false, nothing was cleared or written.
    assert_eq!(target.flags, flags_before);
}

#[test]
fn test_propagate_flags_needs_matching_baselines() {
    let original = synthetic_vis(&[vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]], 1, 1);
    let mut target = original.clone();
    let mut source = difference(synthetic_vis(&[vec![1.0, 2.0, 3.0]], 1, 1)).unwrap();

    let result = propagate_flags(&mut source, &mut target, true);
    assert!(matches!(result, Err(FlagError::IncompatibleTimeAxis { .. })));
}

#[test]
fn test_propagate_flags_needs_one_more_target_time() {
    // Differencing the already-differenced data gives a source one time too
    // short for the original target.
    let original = synthetic_vis(&[vec![1.0, 2.0, 3.0, 4.0]], 1, 1);
    let mut target = original.clone();
    let once = difference(original).unwrap();
    let mut twice = difference(once).unwrap();

    let result = propagate_flags(&mut twice, &mut target, true);
    assert!(matches!(result, Err(FlagError::IncompatibleTimeAxis { .. })));
}

#[test]
fn test_default_zero_nsamples() {
    let mut vis = synthetic_vis(&[vec![1.0, 2.0]], 2, 1);
    vis.nsamples[(0, 0, 0, 0)] = 0.0;
    vis.nsamples[(1, 0, 1, 0)] = 0.0;

    assert_eq!(default_zero_nsamples(&mut vis, 1.0), 2);
    assert!(vis.nsamples().iter().all(|&n| n == 1.0));
    // Nothing left to default.
    assert_eq!(default_zero_nsamples(&mut vis, 1.0), 0);
}
