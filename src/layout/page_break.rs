//! # Page Break Decisions
//!
//! The single rule that keeps content out of the footer zone: before
//! anything consumes vertical space, the cursor and the bottom of the next
//! element must both stay strictly above the footer start.

/// Whether an element `next_height` tall, placed at `position`, forces a
/// new page.
pub fn needs_break(position: f64, next_height: f64, footer_start: f64) -> bool {
    position <= footer_start || position - next_height <= footer_start
}

/// Vertical space left above the footer zone.
pub fn remaining_height(position: f64, footer_start: f64) -> f64 {
    (position - footer_start).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_that_fits_stays() {
        assert!(!needs_break(822.0, 20.0, 70.0));
        assert!(!needs_break(100.0, 29.0, 70.0));
    }

    #[test]
    fn element_touching_footer_breaks() {
        assert!(needs_break(100.0, 30.0, 70.0));
        assert!(needs_break(90.0, 30.0, 70.0));
    }

    #[test]
    fn cursor_inside_footer_breaks_even_for_zero_height() {
        assert!(needs_break(70.0, 0.0, 70.0));
        assert!(needs_break(10.0, 0.0, 70.0));
        assert!(!needs_break(70.5, 0.0, 70.0));
    }

    #[test]
    fn remaining_height_never_negative() {
        assert_eq!(remaining_height(100.0, 70.0), 30.0);
        assert_eq!(remaining_height(50.0, 70.0), 0.0);
    }
}
