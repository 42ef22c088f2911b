/// Turns a raw sentiment (-1.0..=1.0) into the final score recorded per
/// respondent: `sentiment * multiplier`, plus `keyword_bonus` for each
/// positive keyword present and minus it for each negative one.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoring {
    pub multiplier: f64,
    pub keyword_bonus: f64,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            multiplier: 10.0,
            keyword_bonus: 2.0,
            positive: ["積極性", "貢献", "リーダーシップ", "達成"]
                .map(String::from)
                .to_vec(),
            negative: ["不安", "不満", "受動的"].map(String::from).to_vec(),
        }
    }
}

impl Scoring {
    /// Each keyword counts once, however often it appears.
    pub fn bonus(&self, text: &str) -> f64 {
        let hits = |words: &[String]| words.iter().filter(|w| text.contains(w.as_str())).count();
        (hits(&self.positive) as f64 - hits(&self.negative) as f64) * self.keyword_bonus
    }

    pub fn final_score(&self, sentiment: f64, text: &str) -> f64 {
        sentiment * self.multiplier + self.bonus(text)
    }
}
