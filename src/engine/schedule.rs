//! # Budget Scheduling
//!
//! Greedy selection of pixel mutations under a credit ceiling. Two modes
//! share the same shape — a single linear scan in input order — and differ
//! only in the cost formula and admission predicate:
//!
//! - **Reinforcement** raises the protection level of already-correct
//!   pixels so other writers cannot cheaply overwrite them.
//! - **Correction** repaints incorrect pixels, optionally raising their
//!   level in the same mutation.
//!
//! The scheduler never reorders candidates; whatever order the diff pass
//! produced (original image order, possibly pre-shuffled by the loader) is
//! the admission order. A candidate too expensive for the remaining budget
//! is skipped and the scan continues — cheaper candidates later in the
//! list may still be admitted. All cost arithmetic is integral.
//!
//! Levels arrive positionally aligned with candidates. A level slice that
//! does not match the candidate list is a hard error: treating missing
//! entries as level 0 would misprice admissions.

use crate::canvas::{Pixel, PixelLevel};
use crate::error::{WardenError, WardenResult};

/// Credit ceiling with a monotonically increasing spend accumulator,
/// scoped to one scheduling pass.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    ceiling: u64,
    spent: u64,
}

impl Budget {
    pub fn new(ceiling: u64) -> Self {
        Self { ceiling, spent: 0 }
    }

    /// Admit a cost if it fits under the ceiling, charging it on success.
    pub fn admit(&mut self, cost: u64) -> bool {
        if self.spent + cost <= self.ceiling {
            self.spent += cost;
            true
        } else {
            false
        }
    }

    pub fn spent(&self) -> u64 {
        self.spent
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }
}

/// One planned action against the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationIntent {
    /// Raise the protection level of a (correct) pixel.
    Raise { x: i32, y: i32, target_level: u32 },
    /// Repaint a pixel with the target color; `upgrade` additionally
    /// raises its level to `current_level + 1` in the same mutation.
    Repaint {
        x: i32,
        y: i32,
        color: u8,
        current_level: u32,
        upgrade: bool,
    },
}

/// Knobs for reinforcement scheduling.
#[derive(Debug, Clone, Copy)]
pub struct ReinforceParams {
    /// Pixels already at or above this level are left alone.
    pub min_level: u32,
    pub max_credit: u64,
}

/// Knobs for correction scheduling.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionParams {
    /// Pixels at or above this level are too defended to repaint.
    pub max_level: u32,
    pub max_credit: u64,
    /// Also raise the level of every repainted pixel.
    pub upgrade: bool,
}

/// Output of a reinforcement pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinforcePlan {
    pub intents: Vec<MutationIntent>,
    /// Sum of the admitted target levels; always `<= max_credit`.
    pub running_cost: u64,
}

/// Output of a correction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionPlan {
    pub intents: Vec<MutationIntent>,
    /// Cost of the admitted mutations; always `<= max_credit`.
    pub running_cost: u64,
    /// Cost of repainting *every* candidate, admitted or not. Reported so
    /// the operator can see how far the budget falls short.
    pub total_cost: u64,
}

fn check_alignment(candidates: usize, levels: usize) -> WardenResult<()> {
    if levels != candidates {
        return Err(WardenError::level_query(candidates, levels));
    }
    Ok(())
}

/// Plan level upgrades for already-correct pixels.
///
/// Admission: `level < min_level` and the upgrade cost (`level + 1`) fits
/// in the remaining budget. Skipped candidates are not reconsidered within
/// the pass.
pub fn schedule_reinforce(
    candidates: &[Pixel],
    levels: &[PixelLevel],
    params: &ReinforceParams,
) -> WardenResult<ReinforcePlan> {
    check_alignment(candidates.len(), levels.len())?;

    let mut budget = Budget::new(params.max_credit);
    let mut intents = Vec::new();
    for entry in levels {
        let target_level = entry.level + 1;
        if entry.level < params.min_level && budget.admit(target_level as u64) {
            intents.push(MutationIntent::Raise {
                x: entry.x,
                y: entry.y,
                target_level,
            });
        }
    }
    Ok(ReinforcePlan {
        intents,
        running_cost: budget.spent(),
    })
}

/// Plan repaints for incorrect pixels.
///
/// The color comes from the target pixel, never from the canvas. Unit cost
/// is the pixel's current level, plus `level + 1` when `upgrade` is set.
/// Candidates at or above `max_level` are skipped permanently within the
/// pass, even if budget frees up later.
pub fn schedule_correction(
    candidates: &[Pixel],
    levels: &[PixelLevel],
    params: &CorrectionParams,
) -> WardenResult<CorrectionPlan> {
    check_alignment(candidates.len(), levels.len())?;

    let mut budget = Budget::new(params.max_credit);
    let mut intents = Vec::new();
    let mut total_cost = 0u64;
    for (pixel, entry) in candidates.iter().zip(levels) {
        let mut unit_cost = entry.level as u64;
        if params.upgrade {
            unit_cost += entry.level as u64 + 1;
        }
        total_cost += unit_cost;

        if entry.level < params.max_level && budget.admit(unit_cost) {
            intents.push(MutationIntent::Repaint {
                x: entry.x,
                y: entry.y,
                color: pixel.color,
                current_level: entry.level,
                upgrade: params.upgrade,
            });
        }
    }
    Ok(CorrectionPlan {
        intents,
        running_cost: budget.spent(),
        total_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates_with_levels(levels: &[u32]) -> (Vec<Pixel>, Vec<PixelLevel>) {
        let pixels = levels
            .iter()
            .enumerate()
            .map(|(i, _)| Pixel {
                x: i as i32,
                y: 0,
                color: 3,
            })
            .collect();
        let levels = levels
            .iter()
            .enumerate()
            .map(|(i, &level)| PixelLevel {
                x: i as i32,
                y: 0,
                level,
            })
            .collect();
        (pixels, levels)
    }

    #[test]
    fn test_budget_is_monotonic_and_bounded() {
        let mut budget = Budget::new(10);
        assert!(budget.admit(4));
        assert!(budget.admit(6));
        assert!(!budget.admit(1));
        assert_eq!(budget.spent(), 10);
    }

    #[test]
    fn test_zero_credit_admits_nothing() {
        let (pixels, levels) = candidates_with_levels(&[0, 0, 0]);
        let plan = schedule_reinforce(
            &pixels,
            &levels,
            &ReinforceParams {
                min_level: 5,
                max_credit: 0,
            },
        )
        .unwrap();
        assert!(plan.intents.is_empty());
        assert_eq!(plan.running_cost, 0);
    }

    #[test]
    fn test_empty_candidates_yield_empty_plan() {
        let plan = schedule_correction(
            &[],
            &[],
            &CorrectionParams {
                max_level: 4,
                max_credit: 100,
                upgrade: true,
            },
        )
        .unwrap();
        assert!(plan.intents.is_empty());
        assert_eq!(plan.running_cost, 0);
        assert_eq!(plan.total_cost, 0);
    }

    #[test]
    fn test_reinforce_budget_cuts_off_strictly() {
        // Levels [1,1,1], each upgrade costs 2; with a ceiling of 3 only
        // the first fits (2 + 2 > 3).
        let (pixels, levels) = candidates_with_levels(&[1, 1, 1]);
        let plan = schedule_reinforce(
            &pixels,
            &levels,
            &ReinforceParams {
                min_level: 2,
                max_credit: 3,
            },
        )
        .unwrap();
        assert_eq!(
            plan.intents,
            vec![MutationIntent::Raise {
                x: 0,
                y: 0,
                target_level: 2
            }]
        );
        assert_eq!(plan.running_cost, 2);
    }

    #[test]
    fn test_reinforce_skips_pixels_at_min_level() {
        let (pixels, levels) = candidates_with_levels(&[2, 1, 3]);
        let plan = schedule_reinforce(
            &pixels,
            &levels,
            &ReinforceParams {
                min_level: 2,
                max_credit: 100,
            },
        )
        .unwrap();
        assert_eq!(
            plan.intents,
            vec![MutationIntent::Raise {
                x: 1,
                y: 0,
                target_level: 2
            }]
        );
        assert_eq!(plan.running_cost, 2);
    }

    #[test]
    fn test_reinforce_running_cost_equals_sum_of_target_levels() {
        let (pixels, levels) = candidates_with_levels(&[0, 1, 0, 1]);
        let plan = schedule_reinforce(
            &pixels,
            &levels,
            &ReinforceParams {
                min_level: 2,
                max_credit: 100,
            },
        )
        .unwrap();
        let sum: u64 = plan
            .intents
            .iter()
            .map(|i| match i {
                MutationIntent::Raise { target_level, .. } => *target_level as u64,
                _ => unreachable!(),
            })
            .sum();
        assert_eq!(sum, plan.running_cost);
        assert_eq!(plan.running_cost, 6);
    }

    #[test]
    fn test_correction_respects_max_level_and_budget() {
        // Unit costs [2,3,5] without upgrade; ceiling 5 admits the first
        // two exactly, the third is over max_level anyway.
        let (pixels, levels) = candidates_with_levels(&[2, 3, 5]);
        let plan = schedule_correction(
            &pixels,
            &levels,
            &CorrectionParams {
                max_level: 4,
                max_credit: 5,
                upgrade: false,
            },
        )
        .unwrap();
        assert_eq!(plan.intents.len(), 2);
        assert_eq!(plan.running_cost, 5);
        assert_eq!(plan.total_cost, 10);
    }

    #[test]
    fn test_correction_upgrade_doubles_into_cost() {
        // Level 1 with upgrade: cost 1 + (1 + 1) = 3.
        let (pixels, levels) = candidates_with_levels(&[1]);
        let plan = schedule_correction(
            &pixels,
            &levels,
            &CorrectionParams {
                max_level: 4,
                max_credit: 10,
                upgrade: true,
            },
        )
        .unwrap();
        assert_eq!(plan.running_cost, 3);
        assert_eq!(plan.total_cost, 3);
        assert_eq!(
            plan.intents,
            vec![MutationIntent::Repaint {
                x: 0,
                y: 0,
                color: 3,
                current_level: 1,
                upgrade: true
            }]
        );
    }

    #[test]
    fn test_expensive_candidate_does_not_stop_the_scan() {
        // The level-9 pixel cannot fit a 10-credit ceiling after the first
        // admission, but the cheap pixel after it still gets in.
        let (pixels, levels) = candidates_with_levels(&[5, 9, 2]);
        let plan = schedule_correction(
            &pixels,
            &levels,
            &CorrectionParams {
                max_level: 99,
                max_credit: 10,
                upgrade: false,
            },
        )
        .unwrap();
        let admitted: Vec<u32> = plan
            .intents
            .iter()
            .map(|i| match i {
                MutationIntent::Repaint { current_level, .. } => *current_level,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(admitted, vec![5, 2]);
        assert_eq!(plan.running_cost, 7);
        assert_eq!(plan.total_cost, 16);
    }

    #[test]
    fn test_admission_follows_input_order() {
        let (pixels, levels) = candidates_with_levels(&[3, 1, 2]);
        let plan = schedule_correction(
            &pixels,
            &levels,
            &CorrectionParams {
                max_level: 99,
                max_credit: 100,
                upgrade: false,
            },
        )
        .unwrap();
        let xs: Vec<i32> = plan
            .intents
            .iter()
            .map(|i| match i {
                MutationIntent::Repaint { x, .. } => *x,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(xs, vec![0, 1, 2]);
    }

    #[test]
    fn test_misaligned_levels_are_a_hard_error() {
        let (pixels, mut levels) = candidates_with_levels(&[1, 1, 1]);
        levels.pop();

        let reinforce = schedule_reinforce(
            &pixels,
            &levels,
            &ReinforceParams {
                min_level: 2,
                max_credit: 100,
            },
        );
        assert!(matches!(
            reinforce,
            Err(WardenError::LevelQuery {
                requested: 3,
                received: 2
            })
        ));

        let correction = schedule_correction(
            &pixels,
            &levels,
            &CorrectionParams {
                max_level: 4,
                max_credit: 100,
                upgrade: false,
            },
        );
        assert!(correction.is_err());
    }

    #[test]
    fn test_running_cost_never_exceeds_ceiling() {
        let (pixels, levels) = candidates_with_levels(&[3, 4, 2, 6, 1, 1]);
        for ceiling in 0..20 {
            let plan = schedule_correction(
                &pixels,
                &levels,
                &CorrectionParams {
                    max_level: 99,
                    max_credit: ceiling,
                    upgrade: true,
                },
            )
            .unwrap();
            assert!(plan.running_cost <= ceiling);
            assert!(plan.total_cost >= plan.running_cost);
        }
    }
}
