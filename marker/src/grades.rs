//! Percentage-to-letter-grade mapping.

/// Thresholds checked top-down; the table is monotonic and exhaustive, so
/// every percentage in `[0, 100]` maps to exactly one grade.
const GRADE_TABLE: &[(f64, &str)] = &[
    (97.0, "A+"),
    (93.0, "A"),
    (90.0, "A-"),
    (87.0, "B+"),
    (83.0, "B"),
    (80.0, "B-"),
    (77.0, "C+"),
    (73.0, "C"),
    (70.0, "C-"),
    (67.0, "D+"),
    (65.0, "D"),
];

/// Letter grade for a score percentage. Values below the lowest threshold
/// (and anything non-finite) grade as F.
pub fn letter_grade(percentage: f64) -> &'static str {
    for (threshold, grade) in GRADE_TABLE {
        if percentage >= *threshold {
            return grade;
        }
    }
    "F"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundaries() {
        assert_eq!(letter_grade(100.0), "A+");
        assert_eq!(letter_grade(97.0), "A+");
        assert_eq!(letter_grade(96.9), "A");
        assert_eq!(letter_grade(93.0), "A");
        assert_eq!(letter_grade(90.0), "A-");
        assert_eq!(letter_grade(87.0), "B+");
        assert_eq!(letter_grade(83.0), "B");
        assert_eq!(letter_grade(80.0), "B-");
        assert_eq!(letter_grade(77.0), "C+");
        assert_eq!(letter_grade(73.0), "C");
        assert_eq!(letter_grade(70.0), "C-");
        assert_eq!(letter_grade(67.0), "D+");
        assert_eq!(letter_grade(65.0), "D");
        assert_eq!(letter_grade(64.9), "F");
        assert_eq!(letter_grade(0.0), "F");
    }

    #[test]
    fn every_percentage_maps_to_exactly_one_grade() {
        // Walk [0, 100] in tenth-of-a-point steps; each value must produce
        // a grade, and the mapping must never improve as the score drops.
        let order = [
            "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "F",
        ];
        let rank = |g: &str| order.iter().position(|x| *x == g).unwrap();

        let mut previous_rank = 0;
        for step in (0..=1000).rev() {
            let grade = letter_grade(step as f64 / 10.0);
            let r = rank(grade);
            assert!(r >= previous_rank, "grade improved as score dropped");
            previous_rank = r;
        }
    }

    #[test]
    fn non_finite_scores_grade_as_f() {
        assert_eq!(letter_grade(f64::NAN), "F");
        assert_eq!(letter_grade(f64::NEG_INFINITY), "F");
    }
}
