use crate::health::QualityScore;

pub const BAR_SEGMENTS: usize = 10;

const FILLED: char = '█';
const EMPTY: char = '░';

/// Render a score as `[██████░░░░] 60%`, one segment per 10%
pub fn format_quality_bar(score: QualityScore) -> String {
    let filled = (score.value() / 10) as usize;
    let empty = BAR_SEGMENTS - filled;

    let mut bar = String::with_capacity(BAR_SEGMENTS * 3 + 8);
    bar.push('[');
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(empty));
    bar.push_str("] ");
    bar.push_str(&score.to_string());
    bar
}
