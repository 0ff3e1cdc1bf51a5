//! Shot-outcome rules and end scoring

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::stone::{RemovalReason, Side, Stone};
use crate::consts::*;

/// Apply the at-rest rules to a stone that just stopped.
///
/// 1. The stone delivered this shot must have crossed the far hog line or
///    touched another stone, otherwise it is voided.
/// 2. A stone resting beyond either back line (by more than its radius) is
///    out of play.
///
/// Removed and already-flagged stones are left alone, so calling this
/// repeatedly is harmless. Returns the reason if the stone was removed.
pub fn enforce_stopped_rules(stone: &mut Stone) -> Option<RemovalReason> {
    if stone.removed || stone.flagged_for_removal {
        return None;
    }

    if stone.active_this_shot && !stone.crossed_far_hog && !stone.touched_stone {
        stone.remove(RemovalReason::HogLine);
        return Some(RemovalReason::HogLine);
    }

    let limit = BACK_LINE_Y + STONE_RADIUS;
    if stone.position.y > limit || stone.position.y < -limit {
        stone.remove(RemovalReason::OutOfPlay);
        return Some(RemovalReason::OutOfPlay);
    }

    None
}

/// A stone counted for scoring, with its distance to the tee
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseStone {
    pub id: u32,
    pub side: Side,
    pub position: Vec2,
    pub distance: f32,
}

/// Live, unflagged stones touching the house, nearest first
pub fn stones_in_house(stones: &[Stone]) -> Vec<HouseStone> {
    let mut list: Vec<HouseStone> = stones
        .iter()
        .filter(|s| !s.removed && !s.flagged_for_removal && s.in_house())
        .map(|s| HouseStone {
            id: s.id,
            side: s.side,
            position: s.position,
            distance: s.tee_distance(),
        })
        .collect();
    // Ties keep delivery order (stable sort)
    list.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    list
}

/// Scoring result of an end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndScore {
    /// `None` for a blank end
    pub scoring_side: Option<Side>,
    pub points: u32,
    /// Ids of the stones that counted
    pub counted: Vec<u32>,
    /// Every stone in the house, nearest first
    pub in_house: Vec<HouseStone>,
}

impl EndScore {
    pub fn is_blank(&self) -> bool {
        self.scoring_side.is_none() || self.points == 0
    }

    /// Nearest in-house stone of the side that did not score
    pub fn nearest_opponent(&self) -> Option<&HouseStone> {
        let scoring = self.scoring_side?;
        self.in_house.iter().find(|s| s.side != scoring)
    }
}

/// Score an end from the final stone layout.
///
/// The side owning shot rock scores one point for each of its in-house
/// stones strictly closer to the tee than the opponent's nearest in-house
/// stone. Only stones in the house are considered.
pub fn score_end(stones: &[Stone]) -> EndScore {
    score_house(stones_in_house(stones))
}

/// Score an already sorted in-house list
pub fn score_house(in_house: Vec<HouseStone>) -> EndScore {
    let Some(shot_rock) = in_house.first() else {
        return EndScore {
            scoring_side: None,
            points: 0,
            counted: Vec::new(),
            in_house,
        };
    };

    let scoring_side = shot_rock.side;
    let opponent_best = in_house
        .iter()
        .find(|s| s.side != scoring_side)
        .map(|s| s.distance)
        .unwrap_or(f32::INFINITY);
    let counted: Vec<u32> = in_house
        .iter()
        .filter(|s| s.side == scoring_side && s.distance < opponent_best)
        .map(|s| s.id)
        .collect();

    EndScore {
        scoring_side: Some(scoring_side),
        points: counted.len() as u32,
        counted,
        in_house,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn resting(id: u32, side: Side, pos: Vec2) -> Stone {
        let mut s = Stone::new(id, side, &mut Pcg32::seed_from_u64(id as u64));
        s.position = pos;
        s.was_delivered = true;
        s
    }

    fn at_distance(id: u32, side: Side, d: f32) -> Stone {
        resting(id, side, Vec2::new(0.0, TEE_Y + d))
    }

    #[test]
    fn test_short_delivery_voided() {
        let mut s = resting(0, Side::Red, Vec2::new(0.0, 4.0));
        s.active_this_shot = true;
        assert_eq!(enforce_stopped_rules(&mut s), Some(RemovalReason::HogLine));
        assert!(s.removed);
    }

    #[test]
    fn test_short_delivery_with_contact_survives() {
        let mut s = resting(0, Side::Red, Vec2::new(0.0, 4.0));
        s.active_this_shot = true;
        s.touched_stone = true;
        assert_eq!(enforce_stopped_rules(&mut s), None);
        assert!(!s.removed);
    }

    #[test]
    fn test_hog_rule_only_for_active_stone() {
        // A resting guard nudged back short of the hog line stays in play
        let mut s = resting(0, Side::Yellow, Vec2::new(0.0, 9.5));
        s.active_this_shot = false;
        assert_eq!(enforce_stopped_rules(&mut s), None);
        assert!(!s.removed);
    }

    #[test]
    fn test_far_hog_boundary_inclusive() {
        let mut s = resting(0, Side::Red, Vec2::new(0.0, FAR_HOG_Y));
        s.active_this_shot = true;
        s.crossed_far_hog = s.position.y >= FAR_HOG_Y;
        assert_eq!(enforce_stopped_rules(&mut s), None);
    }

    #[test]
    fn test_beyond_back_line_removed() {
        let mut s = resting(0, Side::Red, Vec2::new(0.0, BACK_LINE_Y + STONE_RADIUS + 0.01));
        s.crossed_far_hog = true;
        assert_eq!(enforce_stopped_rules(&mut s), Some(RemovalReason::OutOfPlay));

        // Biting the back line is still in play
        let mut s = resting(1, Side::Red, Vec2::new(0.0, BACK_LINE_Y + 0.1));
        s.crossed_far_hog = true;
        assert_eq!(enforce_stopped_rules(&mut s), None);
    }

    #[test]
    fn test_enforce_idempotent_on_removed() {
        let mut s = resting(0, Side::Red, Vec2::new(0.0, 4.0));
        s.active_this_shot = true;
        enforce_stopped_rules(&mut s);
        let before = s.clone();
        assert_eq!(enforce_stopped_rules(&mut s), None);
        assert_eq!(s.removed, before.removed);
        assert_eq!(s.removal_reason, before.removal_reason);
        assert_eq!(s.position, before.position);
        assert_eq!(s.velocity, before.velocity);
        assert_eq!(s.moving, before.moving);
    }

    #[test]
    fn test_flagged_stone_left_for_deferred_removal() {
        let mut s = resting(0, Side::Red, Vec2::new(2.2, 4.0));
        s.active_this_shot = true;
        s.flag_for_removal(RemovalReason::Sidewall);
        assert_eq!(enforce_stopped_rules(&mut s), None);
        assert!(!s.removed);
        assert!(s.flagged_for_removal);
    }

    #[test]
    fn test_score_counts_only_stones_inside_opponent() {
        let stones = vec![
            at_distance(0, Side::Red, 0.3),
            at_distance(1, Side::Red, 0.5),
            at_distance(2, Side::Yellow, -0.4),
        ];
        let score = score_end(&stones);
        assert_eq!(score.scoring_side, Some(Side::Red));
        assert_eq!(score.points, 1);
        assert_eq!(score.counted, vec![0]);
        assert_eq!(score.nearest_opponent().map(|s| s.id), Some(2));
    }

    #[test]
    fn test_score_without_opposition_counts_all_in_house() {
        let stones = vec![
            at_distance(0, Side::Yellow, 1.0),
            at_distance(1, Side::Yellow, 0.2),
            // Outside the house: ignored
            at_distance(2, Side::Yellow, 2.5),
            at_distance(3, Side::Red, 3.0),
        ];
        let score = score_end(&stones);
        assert_eq!(score.scoring_side, Some(Side::Yellow));
        assert_eq!(score.points, 2);
        assert_eq!(score.counted, vec![1, 0]);
    }

    #[test]
    fn test_blank_end() {
        let stones = vec![at_distance(0, Side::Red, 4.0)];
        let score = score_end(&stones);
        assert!(score.is_blank());
        assert_eq!(score.points, 0);
        assert!(score.in_house.is_empty());
    }

    #[test]
    fn test_removed_and_flagged_do_not_score() {
        let mut stones = vec![
            at_distance(0, Side::Red, 0.1),
            at_distance(1, Side::Red, 0.2),
            at_distance(2, Side::Yellow, 0.6),
        ];
        stones[0].remove(RemovalReason::OutOfPlay);
        stones[1].flag_for_removal(RemovalReason::Backwall);
        let score = score_end(&stones);
        assert_eq!(score.scoring_side, Some(Side::Yellow));
        assert_eq!(score.points, 1);
    }
}
